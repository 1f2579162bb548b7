//! Account registration
//!
//! Creates accounts, issues their confirmation link and confirms them.
//! A user row never outlives a failed attempt to issue its confirmation link.

mod service;

pub use service::{RegistrationError, RegistrationSaga};
