pub mod auth;
pub mod response;

pub use auth::{Caller, JsonBody};
pub use response::{ApiResponse, ApiResult};
