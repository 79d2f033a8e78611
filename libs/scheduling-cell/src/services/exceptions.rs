use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_models::SchedulingError;
use shared_utils::time::{normalize_date, time_to_minutes};

use crate::models::{
    AvailabilityException, AvailabilityExceptionType, CreateExceptionRequest,
    UpdateExceptionRequest,
};
use crate::stores::AvailabilityExceptionStore;

/// Per-date overrides of a doctor's weekly template: full-day blocks and
/// extra one-off hours.
pub struct ExceptionService {
    store: Arc<dyn AvailabilityExceptionStore>,
}

impl ExceptionService {
    pub fn new(store: Arc<dyn AvailabilityExceptionStore>) -> Self {
        Self { store }
    }

    pub async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityException>, SchedulingError> {
        self.store.find_all_by_doctor(doctor_id).await
    }

    /// Exceptions dated inside `[range_start, range_end]`, both bounds
    /// normalized to their UTC calendar date, ordered by date ascending.
    /// An inverted range yields an empty list rather than an error.
    pub async fn find_by_doctor_and_date_range(
        &self,
        doctor_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityException>, SchedulingError> {
        let start = normalize_date(range_start);
        let end = normalize_date(range_end);
        if end < start {
            return Ok(Vec::new());
        }

        self.store
            .find_by_doctor_and_date_range(doctor_id, start, end)
            .await
    }

    pub async fn create(
        &self,
        doctor_id: Uuid,
        request: CreateExceptionRequest,
    ) -> Result<AvailabilityException, SchedulingError> {
        debug!("Creating availability exception for doctor {}", doctor_id);

        let date = normalize_date(request.date);
        ensure_exception_times(
            request.exception_type,
            request.start_time.as_deref(),
            request.end_time.as_deref(),
        )?;

        let now = Utc::now();
        let exception = AvailabilityException {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            exception_type: request.exception_type,
            reason: request.reason,
            start_time: request.start_time,
            end_time: request.end_time,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(exception).await
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        id: Uuid,
        request: UpdateExceptionRequest,
    ) -> Result<AvailabilityException, SchedulingError> {
        debug!("Updating availability exception {}", id);

        let mut exception = self.require(doctor_id, id).await?;

        let target_type = request.exception_type.unwrap_or(exception.exception_type);
        let target_start = request.start_time.or(exception.start_time.take());
        let target_end = request.end_time.or(exception.end_time.take());
        let target_date = match request.date {
            Some(date) => normalize_date(date),
            None => exception.date,
        };

        ensure_exception_times(target_type, target_start.as_deref(), target_end.as_deref())?;

        exception.exception_type = target_type;
        exception.start_time = target_start;
        exception.end_time = target_end;
        exception.date = target_date;
        if let Some(reason) = request.reason {
            exception.reason = Some(reason);
        }
        exception.updated_at = Utc::now();

        self.store.update(exception).await
    }

    pub async fn remove(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError> {
        debug!("Removing availability exception {}", id);

        self.require(doctor_id, id).await?;
        self.store.delete(doctor_id, id).await
    }

    /// Date-keyed grouping helper for the snapshot builder.
    pub(crate) fn group_by_date(
        exceptions: Vec<AvailabilityException>,
    ) -> Vec<(NaiveDate, Vec<AvailabilityException>)> {
        let mut groups: Vec<(NaiveDate, Vec<AvailabilityException>)> = Vec::new();
        for exception in exceptions {
            match groups.iter_mut().find(|(date, _)| *date == exception.date) {
                Some((_, group)) => group.push(exception),
                None => groups.push((exception.date, vec![exception])),
            }
        }
        groups
    }

    async fn require(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<AvailabilityException, SchedulingError> {
        self.store.find_by_id(doctor_id, id).await?.ok_or_else(|| {
            SchedulingError::not_found(format!(
                "Exception {} not found for doctor {}",
                id, doctor_id
            ))
        })
    }
}

/// Blocked exceptions must not carry times; extra-hours exceptions must
/// carry an ordered pair.
fn ensure_exception_times(
    exception_type: AvailabilityExceptionType,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> Result<(), SchedulingError> {
    match exception_type {
        AvailabilityExceptionType::ExtraHours => {
            let (start, end) = match (start_time, end_time) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(SchedulingError::validation(
                        "Extra hours exceptions require startTime and endTime",
                    ))
                }
            };

            if time_to_minutes(start)? >= time_to_minutes(end)? {
                return Err(SchedulingError::validation(
                    "startTime must be earlier than endTime for extra hours",
                ));
            }
            Ok(())
        }
        AvailabilityExceptionType::Blocked => {
            if start_time.is_some() || end_time.is_some() {
                return Err(SchedulingError::validation(
                    "Blocked-day exceptions cannot define extra hours",
                ));
            }
            Ok(())
        }
    }
}
