//! # Sessions
//!
//! A session is created at login and addressed by a uuid bearer token. It
//! carries everything that was ambient in a single-user client:
//!
//! ```text
//! Session
//! ├── user       snapshot taken at login (permissions included)
//! ├── cart       the in-progress cart, one per session
//! └── checkout   single-flight guard for the sale commit
//! ```
//!
//! Handlers receive it through the [`CurrentSession`] extractor, which reads
//! `Authorization: Bearer <token>` and rejects with `UNAUTHORIZED`.
//!
//! ## Locking
//! The cart is a `tokio::sync::Mutex` because checkout holds it across the
//! commit await. The checkout guard is only ever `try_lock`ed: a second
//! checkout on the same session fails fast with `CONFLICT` while the first
//! runs to completion.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use linus_core::{Cart, Permission, User};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

// =============================================================================
// Session
// =============================================================================

#[derive(Debug)]
pub struct Session {
    token: Uuid,
    user: User,
    created_at: DateTime<Utc>,
    cart: Mutex<Cart>,
    checkout: Mutex<()>,
}

impl Session {
    fn new(user: User) -> Self {
        Session {
            token: Uuid::new_v4(),
            user,
            created_at: Utc::now(),
            cart: Mutex::new(Cart::new()),
            checkout: Mutex::new(()),
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Permission gate. Never elevates.
    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        self.user.require(permission).map_err(ApiError::from)
    }

    /// Passes when any one of `permissions` is held.
    pub fn require_any(&self, permissions: &[Permission]) -> ApiResult<()> {
        match permissions.iter().find(|p| self.user.permissions.allows(**p)) {
            Some(_) => Ok(()),
            None => Err(ApiError::new(
                ErrorCode::Forbidden,
                format!(
                    "Missing permission: one of {}",
                    permissions
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }

    pub async fn cart(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().await
    }

    /// Claims the checkout slot, or fails with `CONFLICT` if a checkout is
    /// already in flight on this session.
    pub fn begin_checkout(&self) -> ApiResult<MutexGuard<'_, ()>> {
        self.checkout
            .try_lock()
            .map_err(|_| ApiError::conflict("A checkout is already in progress"))
    }
}

// =============================================================================
// Session Store
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, user: User) -> Arc<Session> {
        let session = Arc::new(Session::new(user));
        self.sessions
            .write()
            .await
            .insert(session.token, Arc::clone(&session));
        debug!(username = %session.user.username, "Session opened");
        session
    }

    pub async fn get(&self, token: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn end(&self, token: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = &removed {
            debug!(username = %session.user.username, "Session closed");
        }
        removed.is_some()
    }

    /// Ends every session of a user. Returns how many were closed.
    pub async fn end_for_user(&self, username: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user.username != username);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated session of the current request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Arc<Session>);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|t| Uuid::parse_str(t.trim()).ok())
            .ok_or_else(ApiError::unauthorized)?;

        state
            .sessions
            .get(&token)
            .await
            .map(CurrentSession)
            .ok_or_else(ApiError::unauthorized)
    }
}
