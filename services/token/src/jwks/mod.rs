pub mod publisher;

pub use publisher::{Jwk, JwkThumbprint, Jwks};
