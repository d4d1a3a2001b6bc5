pub mod auth;
pub mod error;
pub mod response;

pub use error::AppError;
pub use response::{ApiResponse, ApiSuccess};
