pub mod auth;
pub mod request_scope;
pub mod response;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthContext, Principal};
pub use request_scope::{request_scope_middleware, RequestToken};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::{validate_user_middleware, ValidUser};
