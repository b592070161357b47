pub mod auth;
pub mod body;

pub use auth::ForwardedAuth;
pub use body::{parse_json_body, JsonBody, MultipartBody, RawBody};
