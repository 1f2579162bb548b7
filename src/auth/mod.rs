//! Authentication module
//!
//! Provides password-based login for confirmed accounts.
//! - bcrypt credential verification
//! - Access and refresh token issuance through the token authority
//! - Single active session per user

mod service;

pub use service::{AuthError, SessionManager};
