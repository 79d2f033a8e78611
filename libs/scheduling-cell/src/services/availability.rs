use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::ScheduleConfig;
use shared_models::SchedulingError;
use shared_utils::time::{
    dates_between, normalize_date, time_to_minutes, weekday_number, weekdays_between,
};

use crate::models::{
    AvailabilityExceptionType, AvailabilitySlotSnapshot, AvailabilityTemplate,
    CreateTemplateRequest, DailyAvailabilitySnapshot, DoctorAvailabilityCheckResult, SlotSource,
    UpdateTemplateRequest,
};
use crate::services::exceptions::ExceptionService;
use crate::stores::AvailabilityTemplateStore;

/// Recurring weekly templates plus the derived per-date availability
/// snapshot. Holds the exception service because every snapshot merges
/// both sources.
pub struct AvailabilityService {
    templates: Arc<dyn AvailabilityTemplateStore>,
    exceptions: Arc<ExceptionService>,
    config: ScheduleConfig,
}

impl AvailabilityService {
    pub fn new(
        templates: Arc<dyn AvailabilityTemplateStore>,
        exceptions: Arc<ExceptionService>,
        config: ScheduleConfig,
    ) -> Self {
        Self { templates, exceptions, config }
    }

    pub async fn create(
        &self,
        doctor_id: Uuid,
        request: CreateTemplateRequest,
    ) -> Result<AvailabilityTemplate, SchedulingError> {
        debug!("Creating availability template for doctor {}", doctor_id);

        validate_weekday(request.weekday)?;
        validate_time_order(&request.start_time, &request.end_time)?;
        self.ensure_within_clinic_hours(&request.start_time, &request.end_time)?;
        self.ensure_no_overlap(
            doctor_id,
            request.weekday,
            &request.start_time,
            &request.end_time,
            None,
        )
        .await?;

        let now = Utc::now();
        let template = AvailabilityTemplate {
            id: Uuid::new_v4(),
            doctor_id,
            weekday: request.weekday,
            start_time: request.start_time,
            end_time: request.end_time,
            is_recurring: request.is_recurring.unwrap_or(true),
            clinic_id: request.clinic_id,
            location: request.location,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        self.templates.insert(template).await
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        id: Uuid,
        request: UpdateTemplateRequest,
    ) -> Result<AvailabilityTemplate, SchedulingError> {
        debug!("Updating availability template {}", id);

        let mut template = self.require(doctor_id, id).await?;

        let target_weekday = request.weekday.unwrap_or(template.weekday);
        let target_start = request.start_time.unwrap_or_else(|| template.start_time.clone());
        let target_end = request.end_time.unwrap_or_else(|| template.end_time.clone());

        validate_weekday(target_weekday)?;
        validate_time_order(&target_start, &target_end)?;
        self.ensure_within_clinic_hours(&target_start, &target_end)?;
        self.ensure_no_overlap(doctor_id, target_weekday, &target_start, &target_end, Some(id))
            .await?;

        template.weekday = target_weekday;
        template.start_time = target_start;
        template.end_time = target_end;
        if let Some(is_recurring) = request.is_recurring {
            template.is_recurring = is_recurring;
        }
        if let Some(clinic_id) = request.clinic_id {
            template.clinic_id = Some(clinic_id);
        }
        if let Some(location) = request.location {
            template.location = Some(location);
        }
        if let Some(notes) = request.notes {
            template.notes = Some(notes);
        }
        template.updated_at = Utc::now();

        self.templates.update(template).await
    }

    pub async fn remove(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError> {
        debug!("Removing availability template {}", id);

        self.require(doctor_id, id).await?;
        self.templates.delete(doctor_id, id).await
    }

    pub async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError> {
        self.templates.find_all_by_doctor(doctor_id).await
    }

    pub async fn find_by_doctor_and_weekdays(
        &self,
        doctor_id: Uuid,
        weekdays: &[i32],
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError> {
        self.templates
            .find_by_doctor_and_weekdays(doctor_id, weekdays)
            .await
    }

    /// Builds one merged availability row per calendar date in
    /// `[range_start, range_end]` inclusive (both normalized to their UTC
    /// date).
    ///
    /// A blocked exception suppresses every recurring template for its
    /// date; otherwise the row lists the weekday's templates first
    /// (`recurring`) and the date's extra-hours exceptions after
    /// (`extra`), in store order. Rows for dates with no configuration
    /// carry an empty slot list, which callers must not confuse with
    /// "fully booked".
    pub async fn get_availability_snapshot(
        &self,
        doctor_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<DailyAvailabilitySnapshot>, SchedulingError> {
        let start = normalize_date(range_start);
        let end = normalize_date(range_end);

        let dates = dates_between(start, end);
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let weekdays = weekdays_between(start, end);
        let recurring = self
            .templates
            .find_by_doctor_and_weekdays(doctor_id, &weekdays)
            .await?;
        let exceptions = self
            .exceptions
            .find_by_doctor_and_date_range(doctor_id, range_start, range_end)
            .await?;

        let exceptions_by_date = ExceptionService::group_by_date(exceptions);

        let snapshots = dates
            .into_iter()
            .map(|date| {
                let weekday = weekday_number(date);
                let day_exceptions = exceptions_by_date
                    .iter()
                    .find(|(exception_date, _)| *exception_date == date)
                    .map(|(_, group)| group.clone())
                    .unwrap_or_default();

                let is_blocked = day_exceptions.iter().any(|exception| {
                    exception.exception_type == AvailabilityExceptionType::Blocked
                });

                let mut slots: Vec<AvailabilitySlotSnapshot> = if is_blocked {
                    Vec::new()
                } else {
                    recurring
                        .iter()
                        .filter(|template| template.weekday == weekday)
                        .map(|template| AvailabilitySlotSnapshot {
                            start_time: template.start_time.clone(),
                            end_time: template.end_time.clone(),
                            source: SlotSource::Recurring,
                            clinic_id: template.clinic_id,
                            notes: template.notes.clone(),
                            reason: None,
                        })
                        .collect()
                };

                if !is_blocked {
                    slots.extend(
                        day_exceptions
                            .iter()
                            .filter(|exception| {
                                exception.exception_type == AvailabilityExceptionType::ExtraHours
                            })
                            .filter_map(|exception| {
                                // write validation requires both times; a store
                                // row missing one is skipped, not surfaced
                                match (&exception.start_time, &exception.end_time) {
                                    (Some(start), Some(end)) => Some(AvailabilitySlotSnapshot {
                                        start_time: start.clone(),
                                        end_time: end.clone(),
                                        source: SlotSource::Extra,
                                        clinic_id: None,
                                        notes: None,
                                        reason: exception.reason.clone(),
                                    }),
                                    _ => None,
                                }
                            }),
                    );
                }

                DailyAvailabilitySnapshot { date, weekday, slots, exceptions: day_exceptions }
            })
            .collect();

        Ok(snapshots)
    }

    /// Booking-time check: is `[start_iso, end_iso)` fully contained in
    /// one open interval of the doctor's day, for the given clinic?
    ///
    /// Malformed input fails closed with a reason, never an error; only
    /// store failures surface as `Err`. Collisions with already-booked
    /// appointments are deliberately NOT re-checked here; that stays the
    /// booking caller's responsibility.
    pub async fn is_doctor_available_for_range(
        &self,
        doctor_id: Uuid,
        clinic_id: Option<Uuid>,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<DoctorAvailabilityCheckResult, SchedulingError> {
        if start_iso.is_empty() || end_iso.is_empty() {
            return Ok(DoctorAvailabilityCheckResult::unavailable(
                "Doctor, clinic, and appointment range are required",
            ));
        }

        let (start, end) = match (parse_iso(start_iso), parse_iso(end_iso)) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Ok(DoctorAvailabilityCheckResult::unavailable(
                    "Invalid ISO date provided for the appointment range",
                ))
            }
        };

        if start >= end {
            return Ok(DoctorAvailabilityCheckResult::unavailable(
                "Appointment range must have a positive duration",
            ));
        }

        if normalize_date(start) != normalize_date(end) {
            return Ok(DoctorAvailabilityCheckResult::unavailable(
                "Appointment must stay within a single calendar day",
            ));
        }

        let snapshots = self
            .get_availability_snapshot(doctor_id, start, end)
            .await?;
        let day = normalize_date(start);
        let snapshot = match snapshots.into_iter().find(|snapshot| snapshot.date == day) {
            Some(snapshot) => snapshot,
            None => {
                return Ok(DoctorAvailabilityCheckResult::unavailable(
                    "No availability defined for the requested date",
                ))
            }
        };

        if snapshot.is_blocked() {
            return Ok(DoctorAvailabilityCheckResult::unavailable(
                "Doctor is blocked on the requested date",
            ));
        }

        let request_start = minute_of_day(start);
        let request_end = minute_of_day(end);

        for slot in &snapshot.slots {
            if slot.clinic_id.is_some() && clinic_id != slot.clinic_id {
                continue;
            }

            let slot_start = time_to_minutes(&slot.start_time)?;
            let slot_end = time_to_minutes(&slot.end_time)?;

            if request_start >= slot_start && request_end <= slot_end {
                return Ok(DoctorAvailabilityCheckResult::available());
            }
        }

        Ok(DoctorAvailabilityCheckResult::unavailable(
            "Requested time range falls outside available slots",
        ))
    }

    fn ensure_within_clinic_hours(&self, start: &str, end: &str) -> Result<(), SchedulingError> {
        let start_minutes = time_to_minutes(start)?;
        let end_minutes = time_to_minutes(end)?;
        let open_minutes = time_to_minutes(&self.config.clinic_open_time)?;
        let close_minutes = time_to_minutes(&self.config.clinic_close_time)?;

        if start_minutes < open_minutes || end_minutes > close_minutes {
            return Err(SchedulingError::validation(format!(
                "Availability slots must fall between {} and {}",
                self.config.clinic_open_time, self.config.clinic_close_time
            )));
        }

        Ok(())
    }

    /// Overlap-freedom against every *other* template of the same doctor
    /// and weekday. The validation read and the subsequent write are two
    /// steps; concurrent writers to the same doctor+weekday can still
    /// race (documented model).
    async fn ensure_no_overlap(
        &self,
        doctor_id: Uuid,
        weekday: i32,
        start_time: &str,
        end_time: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let existing = self
            .templates
            .find_by_doctor_and_weekdays(doctor_id, &[weekday])
            .await?;

        let start_minutes = time_to_minutes(start_time)?;
        let end_minutes = time_to_minutes(end_time)?;

        for template in existing {
            if exclude_id == Some(template.id) {
                continue;
            }

            let slot_start = time_to_minutes(&template.start_time)?;
            let slot_end = time_to_minutes(&template.end_time)?;

            if start_minutes < slot_end && end_minutes > slot_start {
                return Err(SchedulingError::validation(
                    "Availability slot overlaps with existing schedule",
                ));
            }
        }

        Ok(())
    }

    async fn require(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<AvailabilityTemplate, SchedulingError> {
        self.templates.find_by_id(doctor_id, id).await?.ok_or_else(|| {
            SchedulingError::not_found(format!(
                "Availability {} not found for doctor {}",
                id, doctor_id
            ))
        })
    }
}

fn validate_weekday(weekday: i32) -> Result<(), SchedulingError> {
    if !(0..=6).contains(&weekday) {
        return Err(SchedulingError::validation(
            "Weekday must be between 0 (Sunday) and 6 (Saturday)",
        ));
    }
    Ok(())
}

fn validate_time_order(start: &str, end: &str) -> Result<(), SchedulingError> {
    if time_to_minutes(start)? >= time_to_minutes(end)? {
        return Err(SchedulingError::validation(
            "startTime must be earlier than endTime for availability slots",
        ));
    }
    Ok(())
}

fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn minute_of_day(timestamp: DateTime<Utc>) -> i64 {
    i64::from(timestamp.hour()) * 60 + i64::from(timestamp.minute())
}
