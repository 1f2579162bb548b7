//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::registration::RegistrationSaga;
use crate::token::TokenAuthority;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub token_authority: Arc<TokenAuthority>,
    pub session_manager: Arc<SessionManager>,
    pub registration: Arc<RegistrationSaga>,
}

impl AppState {
    pub fn new(
        token_authority: Arc<TokenAuthority>,
        session_manager: Arc<SessionManager>,
        registration: Arc<RegistrationSaga>,
    ) -> Self {
        Self {
            token_authority,
            session_manager,
            registration,
        }
    }
}

impl FromRef<AppState> for Arc<TokenAuthority> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_authority.clone()
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_manager.clone()
    }
}

impl FromRef<AppState> for Arc<RegistrationSaga> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registration.clone()
    }
}
