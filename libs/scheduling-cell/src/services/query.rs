use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::ScheduleConfig;
use shared_models::SchedulingError;
use shared_utils::time::normalize_date;

use crate::models::{
    Appointment, AvailabilityTemplate, AvailableDatesResponse, AvailableDay, DateRange,
    DaySuggestion, DoctorAvailabilityResponse, NoAvailabilityResponse,
};
use crate::services::availability::AvailabilityService;
use crate::services::labels::{format_date_conversational, weekday_name};
use crate::services::slots::calculate_available_slots;
use crate::stores::AppointmentStore;

// Weekday numbers Monday..Saturday with Sunday last, for schedule prose
const SCHEDULE_WEEKDAY_ORDER: [i32; 7] = [1, 2, 3, 4, 5, 6, 0];

const SAMPLE_SLOT_COUNT: usize = 3;
const SLOTS_PER_SUGGESTION: usize = 5;

/// Caller-facing availability query: snapshot + slot generation over a
/// range, with a bounded forward search when the range comes up empty.
pub struct AvailabilityQueryService {
    availability: Arc<AvailabilityService>,
    appointments: Arc<dyn AppointmentStore>,
    config: ScheduleConfig,
}

impl AvailabilityQueryService {
    pub fn new(
        availability: Arc<AvailabilityService>,
        appointments: Arc<dyn AppointmentStore>,
        config: ScheduleConfig,
    ) -> Self {
        Self { availability, appointments, config }
    }

    /// Bookable dates and slot times for a doctor over `[range_start,
    /// range_end]` (defaults: now .. now + lookahead). When nothing is
    /// bookable, falls back to a conversational message, the doctor's
    /// regular weekly schedule, and forward day suggestions.
    pub async fn get_availability_for_doctor(
        &self,
        doctor_id: Uuid,
        range_start: Option<&str>,
        range_end: Option<&str>,
    ) -> Result<DoctorAvailabilityResponse, SchedulingError> {
        let now = Utc::now();
        let start = match range_start {
            Some(raw) => parse_boundary(raw)?,
            None => now,
        };
        let end = match range_end {
            Some(raw) => parse_boundary(raw)?,
            None => now + Duration::days(self.config.default_lookahead_days),
        };

        debug!(
            "Querying availability for doctor {} between {} and {}",
            doctor_id, start, end
        );

        let range = DateRange { start: normalize_date(start), end: normalize_date(end) };
        let today = normalize_date(now);

        let available_dates = self.collect_available_days(doctor_id, start, end, today).await?;

        if available_dates.is_empty() {
            let regular_schedule = self.describe_regular_schedule(doctor_id).await?;
            let suggestions = self
                .find_next_available_slots(
                    doctor_id,
                    range.end + Duration::days(1),
                    self.config.fallback_max_days,
                )
                .await;
            let message = compose_fallback_message(&range, &suggestions);

            return Ok(DoctorAvailabilityResponse::NoAvailability(NoAvailabilityResponse {
                available_dates: Vec::new(),
                message,
                regular_schedule,
                suggestions,
                range,
            }));
        }

        let total_days = available_dates.len();
        let total_slots = available_dates.iter().map(|day| day.slots.len()).sum();

        Ok(DoctorAvailabilityResponse::Available(AvailableDatesResponse {
            available_dates,
            total_days,
            total_slots,
            range,
        }))
    }

    /// Scans forward from `from_date` in 7-day windows, collecting
    /// day-level suggestions until 5 are found or `max_days` elapse.
    ///
    /// A store failure mid-scan ends it early and returns whatever was
    /// collected; degraded suggestions beat a failed query here.
    /// Callers wanting a time bound can wrap the future in a timeout;
    /// every window iteration crosses an await point.
    pub async fn find_next_available_slots(
        &self,
        doctor_id: Uuid,
        from_date: NaiveDate,
        max_days: i64,
    ) -> Vec<DaySuggestion> {
        let today = normalize_date(Utc::now());
        let scan_end = from_date + Duration::days(max_days); // exclusive

        let mut suggestions: Vec<DaySuggestion> = Vec::new();
        let mut window_start = from_date;

        while window_start < scan_end && suggestions.len() < self.config.max_suggestions {
            let window_end = std::cmp::min(window_start + Duration::days(6), scan_end - Duration::days(1));

            let start = window_start.and_hms_opt(0, 0, 0).unwrap().and_utc();
            let end = window_end.and_hms_opt(23, 59, 59).unwrap().and_utc();

            match self.collect_available_days(doctor_id, start, end, today).await {
                Ok(days) => {
                    for day in days {
                        if suggestions.len() >= self.config.max_suggestions {
                            break;
                        }
                        let mut slots = day.slots;
                        slots.truncate(SLOTS_PER_SUGGESTION);
                        suggestions.push(DaySuggestion { date: day.date, slots, label: day.label });
                    }
                }
                Err(err) => {
                    warn!(
                        "Fallback search aborted for doctor {} at window {}: {}",
                        doctor_id, window_start, err
                    );
                    break;
                }
            }

            window_start = window_end + Duration::days(1);
        }

        suggestions
    }

    /// Plain-language weekly pattern, e.g. "lunes, miércoles y viernes de
    /// 09:00 a 12:00". Reads only the first active day's time ranges, so
    /// it assumes a uniform schedule across days (known simplification).
    pub async fn describe_regular_schedule(
        &self,
        doctor_id: Uuid,
    ) -> Result<String, SchedulingError> {
        let templates = self.availability.find_all_by_doctor(doctor_id).await?;
        if templates.is_empty() {
            return Ok("Sin horario semanal configurado".to_string());
        }

        let mut by_weekday: HashMap<i32, Vec<&AvailabilityTemplate>> = HashMap::new();
        for template in &templates {
            by_weekday.entry(template.weekday).or_default().push(template);
        }

        let active: Vec<i32> = SCHEDULE_WEEKDAY_ORDER
            .iter()
            .copied()
            .filter(|weekday| by_weekday.contains_key(weekday))
            .collect();

        let names: Vec<&str> = active.iter().map(|&weekday| weekday_name(weekday)).collect();
        let day_list = join_spanish(&names);

        let first_day_ranges: Vec<String> = by_weekday[&active[0]]
            .iter()
            .map(|template| format!("de {} a {}", template.start_time, template.end_time))
            .collect();

        Ok(format!("{} {}", day_list, first_day_ranges.join(" y ")))
    }

    /// Snapshot + slot generation for every date in the range; keeps only
    /// dates where at least one slot survives the booking filter.
    async fn collect_available_days(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Vec<AvailableDay>, SchedulingError> {
        let snapshots = self
            .availability
            .get_availability_snapshot(doctor_id, start, end)
            .await?;

        // Snapshot rows cover whole calendar dates; fetch bookings over the
        // same span so the boundary days keep their appointments
        let day_start = normalize_date(start).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = normalize_date(end).and_hms_opt(23, 59, 59).unwrap().and_utc();
        let appointments = self
            .appointments
            .find_by_doctor_and_date_range(doctor_id, day_start, day_end)
            .await?;
        let booked_by_date = group_appointments_by_date(appointments);

        let mut days = Vec::new();
        for snapshot in snapshots {
            if snapshot.is_blocked() || snapshot.slots.is_empty() {
                continue;
            }

            let no_bookings = Vec::new();
            let booked = booked_by_date.get(&snapshot.date).unwrap_or(&no_bookings);
            let slots = calculate_available_slots(
                &snapshot.slots,
                booked,
                self.config.default_slot_minutes,
            )?;

            if slots.is_empty() {
                continue;
            }

            days.push(AvailableDay {
                date: snapshot.date,
                weekday: snapshot.weekday,
                slots,
                label: format_date_conversational(snapshot.date, today),
            });
        }

        Ok(days)
    }
}

fn parse_boundary(raw: &str) -> Result<DateTime<Utc>, SchedulingError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }

    Err(SchedulingError::validation(format!(
        "'{}' is not a parseable date",
        raw
    )))
}

fn group_appointments_by_date(
    appointments: Vec<Appointment>,
) -> HashMap<NaiveDate, Vec<Appointment>> {
    let mut by_date: HashMap<NaiveDate, Vec<Appointment>> = HashMap::new();
    for appointment in appointments {
        by_date
            .entry(normalize_date(appointment.start_time))
            .or_default()
            .push(appointment);
    }
    by_date
}

/// "a", "a y b", "a, b y c".
fn join_spanish(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} y {}", init.join(", "), last),
    }
}

fn compose_fallback_message(range: &DateRange, suggestions: &[DaySuggestion]) -> String {
    let lead = format!(
        "No encontré horarios disponibles entre el {} y el {}.",
        range.start, range.end
    );

    let first = match suggestions.first() {
        Some(first) => first,
        None => {
            return format!(
                "{} Tampoco encontré disponibilidad en los próximos días.",
                lead
            )
        }
    };

    let sample: Vec<&str> = first
        .slots
        .iter()
        .take(SAMPLE_SLOT_COUNT)
        .map(String::as_str)
        .collect();
    let remaining = first.slots.len().saturating_sub(SAMPLE_SLOT_COUNT);
    let suffix = if remaining > 0 {
        format!(" y {} más", remaining)
    } else {
        String::new()
    };

    format!(
        "{} La próxima disponibilidad es {} a las {}{}.",
        lead,
        first.label,
        sample.join(", "),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_both_boundary_formats() {
        assert!(parse_boundary("2030-06-03").is_ok());
        assert!(parse_boundary("2030-06-03T09:00:00Z").is_ok());
        assert_matches!(parse_boundary("next tuesday"), Err(SchedulingError::Validation(_)));
        assert_matches!(parse_boundary(""), Err(SchedulingError::Validation(_)));
    }

    #[test]
    fn joins_day_names_like_prose() {
        assert_eq!(join_spanish(&["lunes"]), "lunes");
        assert_eq!(join_spanish(&["lunes", "jueves"]), "lunes y jueves");
        assert_eq!(
            join_spanish(&["lunes", "martes", "jueves"]),
            "lunes, martes y jueves"
        );
    }

    #[test]
    fn fallback_message_samples_three_slots() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
            end: NaiveDate::from_ymd_opt(2030, 6, 5).unwrap(),
        };
        let suggestion = DaySuggestion {
            date: NaiveDate::from_ymd_opt(2030, 6, 6).unwrap(),
            slots: vec!["09:00", "09:30", "10:00", "10:30", "11:00"]
                .into_iter()
                .map(String::from)
                .collect(),
            label: "el jueves 6 de junio".to_string(),
        };

        let message = compose_fallback_message(&range, std::slice::from_ref(&suggestion));
        assert!(message.contains("el jueves 6 de junio"));
        assert!(message.contains("09:00, 09:30, 10:00"));
        assert!(message.contains("y 2 más"));

        let short = DaySuggestion { slots: suggestion.slots[..2].to_vec(), ..suggestion };
        let message = compose_fallback_message(&range, &[short]);
        assert!(!message.contains("más"));
    }

    #[test]
    fn fallback_message_without_suggestions_is_explicit() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
            end: NaiveDate::from_ymd_opt(2030, 6, 5).unwrap(),
        };
        let message = compose_fallback_message(&range, &[]);
        assert!(message.contains("próximos días"));
    }
}
