pub mod auth;

pub use auth::{gateway_auth_middleware, GatewayClaims};
