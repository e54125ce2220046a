//! User administration. All endpoints require `ManageUsers`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use linus_core::auth::{hash_password, toggled_active};
use linus_core::validation::validate_new_user;
use linus_core::{Permission, Role, User, UserPermissions};

use crate::error::{ApiError, ApiResult};
use crate::routes::ApiJson;
use crate::state::{AppState, CurrentSession};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub password: Option<String>,
    /// Defaults to the role's permission set.
    #[serde(default)]
    pub permissions: Option<UserPermissions>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl NewUserRequest {
    fn into_user(self) -> User {
        let role = self.role.unwrap_or(Role::Staff);
        User {
            username: self.username.trim().to_string(),
            name: self.name.trim().to_string(),
            role,
            is_active: self.is_active.unwrap_or(true),
            permissions: self
                .permissions
                .unwrap_or_else(|| UserPermissions::for_role(role)),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<Vec<User>>> {
    session.require(Permission::ManageUsers)?;
    Ok(Json(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(mut request): ApiJson<NewUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    session.require(Permission::ManageUsers)?;
    validate_new_user(&request.username, &request.name, request.password.as_deref())?;

    let password = request.password.take().unwrap_or_default();
    let hash = hash_password(&password)?;
    let user = request.into_user();
    state.db.users().create(&user, &hash).await?;

    info!(username = %user.username, by = %session.user().username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Flips the active flag. The admin account cannot be toggled; a
/// deactivated user is logged out everywhere.
pub async fn toggle_active(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(username): Path<String>,
) -> ApiResult<Json<User>> {
    session.require(Permission::ManageUsers)?;

    let mut user = state
        .db
        .users()
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &username))?;

    let active = toggled_active(&user)?;
    state.db.users().set_active(&username, active).await?;
    user.is_active = active;

    if !active {
        let ended = state.sessions.end_for_user(&username).await;
        if ended > 0 {
            state.signal.notify("logout");
        }
    }

    info!(username = %username, active, by = %session.user().username, "User toggled");
    Ok(Json(user))
}
