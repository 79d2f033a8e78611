use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor's recurring weekly open-hours rule for one weekday.
///
/// Times are wall-clock "HH:MM" strings; for one doctor and weekday no
/// two templates may overlap, and both endpoints must fall inside the
/// clinic operating window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityTemplate {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub weekday: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub clinic_id: Option<Uuid>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: Option<bool>,
    pub clinic_id: Option<Uuid>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplateRequest {
    pub weekday: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_recurring: Option<bool>,
    pub clinic_id: Option<Uuid>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityExceptionType {
    #[serde(rename = "blocked")]
    Blocked,
    #[serde(rename = "extraHours")]
    ExtraHours,
}

/// A date-specific override: either a full-day block or extra one-off
/// hours. Blocked exceptions never carry times; extra-hours exceptions
/// always carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: AvailabilityExceptionType,
    pub reason: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionRequest {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub exception_type: AvailabilityExceptionType,
    pub reason: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateExceptionRequest {
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub exception_type: Option<AvailabilityExceptionType>,
    pub reason: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// Booked appointment, read-only from this core's perspective. Only
/// `doctor_id` and the start/end timestamps are consumed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSource {
    Recurring,
    Extra,
}

/// One open interval on one calendar date, derived from a template
/// (`recurring`) or an extra-hours exception (`extra`). Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlotSnapshot {
    pub start_time: String,
    pub end_time: String,
    pub source: SlotSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The computed per-date merged view of open intervals and exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAvailabilitySnapshot {
    pub date: NaiveDate,
    pub weekday: i32,
    pub slots: Vec<AvailabilitySlotSnapshot>,
    pub exceptions: Vec<AvailabilityException>,
}

impl DailyAvailabilitySnapshot {
    /// A full-day block overrides everything else on the date.
    pub fn is_blocked(&self) -> bool {
        self.exceptions
            .iter()
            .any(|exception| exception.exception_type == AvailabilityExceptionType::Blocked)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAvailabilityCheckResult {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DoctorAvailabilityCheckResult {
    pub fn available() -> Self {
        Self { available: true, reason: None }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { available: false, reason: Some(reason.into()) }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One bookable date in an availability query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub weekday: i32,
    pub slots: Vec<String>,
    pub label: String,
}

/// One day-level suggestion produced by the fallback search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySuggestion {
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDatesResponse {
    pub available_dates: Vec<AvailableDay>,
    pub total_days: usize,
    pub total_slots: usize,
    pub range: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoAvailabilityResponse {
    pub available_dates: Vec<AvailableDay>,
    pub message: String,
    pub regular_schedule: String,
    pub suggestions: Vec<DaySuggestion>,
    pub range: DateRange,
}

/// Availability query result: either the dates found in the requested
/// range, or a conversational fallback with forward suggestions.
/// Serialized untagged so callers see one of two plain JSON shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoctorAvailabilityResponse {
    Available(AvailableDatesResponse),
    NoAvailability(NoAvailabilityResponse),
}
