//! API handlers for the identity service

pub mod auth;
pub mod registration;
pub mod token;

pub use crate::middleware::auth::AuthenticatedUser;
