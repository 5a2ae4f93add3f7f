pub mod manager;

pub use manager::{KeyManager, SIGNING_ALGORITHM};
