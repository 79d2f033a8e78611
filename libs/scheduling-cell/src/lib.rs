pub mod models;
pub mod services;
pub mod stores;

// Re-export the caller-facing surface for external use
pub use models::*;
pub use services::*;
pub use stores::{
    AppointmentStore, AvailabilityExceptionStore, AvailabilityTemplateStore,
    InMemoryAppointmentStore, InMemoryExceptionStore, InMemoryTemplateStore,
};
