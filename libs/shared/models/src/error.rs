use thiserror::Error;

/// Error taxonomy shared by every scheduling service.
///
/// `Validation` and `NotFound` are caller mistakes and are never retried.
/// `Database` wraps a store read/write failure; single-shot operations
/// surface it, while the multi-window fallback search swallows it and
/// returns partial results instead.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl SchedulingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SchedulingError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SchedulingError::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        SchedulingError::Database(msg.into())
    }
}
