pub mod admin_guard;
pub mod response;

pub use admin_guard::{require_admin, AdminCaller, AdminGuard, GuardDecision, BYPASS_CALLER_ID, BYPASS_HEADER};
pub use response::{ApiResponse, ApiResult};
