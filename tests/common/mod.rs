// Shared mocks and builders for the service-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use shapeup_identity::auth::SessionManager;
use shapeup_identity::models::{Session, User};
use shapeup_identity::notify::{Notifier, NotifyError};
use shapeup_identity::registration::RegistrationSaga;
use shapeup_identity::state::AppState;
use shapeup_identity::storage::{SessionStore, StorageError, UserStore};
use shapeup_identity::token::{
    LocalTokenClient, Operation, TokenAuthority, TokenClient, TokenError, TokenTtls,
    VerifiedToken,
};

pub const SECRET: &str = "test-secret-key";
pub const LINK_BASE: &str = "http://localhost:8080/auth/confirm?token=";
pub const TOKEN_TIMEOUT: Duration = Duration::from_millis(300);
pub const BCRYPT_TEST_COST: u32 = 4;

/// In-memory users table with the same uniqueness rules as Postgres
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    pub fail_delete: AtomicBool,
}

impl InMemoryUserStore {
    /// Seed a user directly, bypassing registration
    pub fn add_user(&self, email: &str, password: &str, is_confirmed: bool) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: bcrypt::hash(password, BCRYPT_TEST_COST).unwrap(),
            is_confirmed,
            created_at: Utc::now(),
        };
        let id = user.id;
        self.users.lock().unwrap().insert(id, user);
        id
    }

    pub fn get(&self, user_id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    pub fn find_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StorageError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == email) {
            return Err(StorageError::UniqueViolation);
        }

        let id = Uuid::new_v4();
        users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_confirmed: false,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.find_email(email).ok_or(StorageError::NotFound)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<User, StorageError> {
        self.get(user_id).ok_or(StorageError::NotFound)
    }

    async fn confirm_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        match self.users.lock().unwrap().get_mut(&user_id) {
            Some(user) => {
                user.is_confirmed = true;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Database("connection reset".to_string()));
        }
        self.users.lock().unwrap().remove(&user_id);
        Ok(())
    }
}

/// In-memory sessions table keyed by user, like the `sessions` primary key
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Session, StorageError> {
        // Let a concurrent login reach this point too
        tokio::task::yield_now().await;

        match self.sessions.lock().unwrap().entry(user_id) {
            Entry::Occupied(_) => Err(StorageError::UniqueViolation),
            Entry::Vacant(slot) => Ok(slot
                .insert(Session {
                    user_id,
                    refresh_token: refresh_token.to_string(),
                    created_at: Utc::now(),
                })
                .clone()),
        }
    }

    async fn find_session(&self, user_id: Uuid) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.lock().unwrap().get(&user_id).cloned())
    }
}

/// Token authority that cannot be reached
pub struct UnreachableTokenClient;

#[async_trait]
impl TokenClient for UnreachableTokenClient {
    async fn generate_token(&self, _: Uuid, _: Operation) -> Result<String, TokenError> {
        Err(TokenError::Unavailable("connection refused".to_string()))
    }

    async fn validate_token(&self, _: &str) -> Result<VerifiedToken, TokenError> {
        Err(TokenError::Unavailable("connection refused".to_string()))
    }

    async fn generate_link(&self, _: &str, _: Uuid, _: Operation) -> Result<String, TokenError> {
        Err(TokenError::Unavailable("connection refused".to_string()))
    }
}

/// Token authority that accepts requests and never answers
pub struct HangingTokenClient;

#[async_trait]
impl TokenClient for HangingTokenClient {
    async fn generate_token(&self, _: Uuid, _: Operation) -> Result<String, TokenError> {
        std::future::pending().await
    }

    async fn validate_token(&self, _: &str) -> Result<VerifiedToken, TokenError> {
        std::future::pending().await
    }

    async fn generate_link(&self, _: &str, _: Uuid, _: Operation) -> Result<String, TokenError> {
        std::future::pending().await
    }
}

/// Notifier that keeps every message it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn last_message(&self) -> Option<(String, String)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, address: &str, message: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::SendFailed("smtp down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), message.to_string()));
        Ok(())
    }
}

pub fn authority() -> TokenAuthority {
    TokenAuthority::new(SECRET.to_string(), TokenTtls::default())
}

pub fn local_tokens() -> Arc<LocalTokenClient> {
    Arc::new(LocalTokenClient::new(authority()))
}

pub fn session_manager(
    users: Arc<InMemoryUserStore>,
    sessions: Arc<InMemorySessionStore>,
    tokens: Arc<dyn TokenClient>,
) -> SessionManager {
    SessionManager::new(users, sessions, tokens, TOKEN_TIMEOUT)
}

pub fn registration_saga(
    users: Arc<InMemoryUserStore>,
    tokens: Arc<dyn TokenClient>,
) -> RegistrationSaga {
    RegistrationSaga::new(
        users,
        tokens,
        LINK_BASE.to_string(),
        TOKEN_TIMEOUT,
        BCRYPT_TEST_COST,
    )
}

/// Full application state over in-memory stores and an in-process authority
pub fn app_state(users: Arc<InMemoryUserStore>, sessions: Arc<InMemorySessionStore>) -> AppState {
    AppState::new(
        Arc::new(authority()),
        Arc::new(session_manager(users.clone(), sessions, local_tokens())),
        Arc::new(registration_saga(users, local_tokens())),
    )
}

/// Extract the token from a confirmation link
pub fn token_from_link(link: &str) -> String {
    link.strip_prefix(LINK_BASE)
        .expect("link should start with the configured base")
        .to_string()
}
