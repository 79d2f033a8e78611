pub mod availability;
pub mod exceptions;
pub mod labels;
pub mod query;
pub mod slots;

pub use availability::AvailabilityService;
pub use exceptions::ExceptionService;
pub use labels::format_date_conversational;
pub use query::AvailabilityQueryService;
pub use slots::calculate_available_slots;
