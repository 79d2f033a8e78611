use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use shared_models::SchedulingError;

use crate::models::{Appointment, AvailabilityException, AvailabilityTemplate};

pub mod memory;

pub use memory::{InMemoryAppointmentStore, InMemoryExceptionStore, InMemoryTemplateStore};

/// Persistence seam for recurring weekly templates. Implementations are
/// dumb CRUD; all invariant checks live in the services.
///
/// Read operations order rows by `weekday ASC, start_time ASC`.
#[async_trait]
pub trait AvailabilityTemplateStore: Send + Sync {
    async fn insert(
        &self,
        template: AvailabilityTemplate,
    ) -> Result<AvailabilityTemplate, SchedulingError>;

    async fn update(
        &self,
        template: AvailabilityTemplate,
    ) -> Result<AvailabilityTemplate, SchedulingError>;

    async fn delete(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError>;

    async fn find_by_id(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityTemplate>, SchedulingError>;

    async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError>;

    async fn find_by_doctor_and_weekdays(
        &self,
        doctor_id: Uuid,
        weekdays: &[i32],
    ) -> Result<Vec<AvailabilityTemplate>, SchedulingError>;
}

/// Persistence seam for per-date overrides. Range reads are inclusive on
/// both ends and order rows by `date ASC`.
#[async_trait]
pub trait AvailabilityExceptionStore: Send + Sync {
    async fn insert(
        &self,
        exception: AvailabilityException,
    ) -> Result<AvailabilityException, SchedulingError>;

    async fn update(
        &self,
        exception: AvailabilityException,
    ) -> Result<AvailabilityException, SchedulingError>;

    async fn delete(&self, doctor_id: Uuid, id: Uuid) -> Result<(), SchedulingError>;

    async fn find_by_id(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AvailabilityException>, SchedulingError>;

    async fn find_all_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityException>, SchedulingError>;

    async fn find_by_doctor_and_date_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityException>, SchedulingError>;
}

/// Read-only view of the booking subsystem. Returns appointments whose
/// start timestamp falls inside `[start, end]`, cancelled rows excluded,
/// ordered by start time.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_by_doctor_and_date_range(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError>;
}
