pub mod request;
pub mod service;

pub use request::{GrantRequest, TokenResponse, BEARER, CLIENT_CREDENTIALS};
pub use service::{GrantStage, TokenService};
