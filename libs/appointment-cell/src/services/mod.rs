pub mod appointment;
pub mod conflict;
pub mod query;
pub mod stats;
pub mod validation;

pub use appointment::AppointmentService;
pub use conflict::ConflictDetectionService;
