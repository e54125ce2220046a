//! Login and logout.
//!
//! ```text
//! POST /api/login {username, password}
//!   unknown user / wrong password ──► 401 INVALID_CREDENTIALS
//!   match on inactive account    ──► 403 ACCOUNT_DISABLED
//!   match                        ──► 200 {token, user, permissions}
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use linus_core::auth::authenticate;
use linus_core::{User, UserPermissions};

use crate::error::{ApiError, ApiResult};
use crate::routes::ApiJson;
use crate::state::{AppState, CurrentSession};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: User,
    pub permissions: UserPermissions,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let record = state.db.users().find(request.username.trim()).await?;

    let user = authenticate(record.as_ref(), &request.password)?
        .ok_or_else(ApiError::invalid_credentials)?;

    let session = state.sessions.create(user).await;
    state.signal.notify("login");
    info!(username = %session.user().username, "User logged in");

    Ok(Json(LoginResponse {
        token: session.token(),
        permissions: session.user().permissions,
        user: session.user().clone(),
    }))
}

pub async fn logout(State(state): State<AppState>, session: CurrentSession) -> StatusCode {
    state.sessions.end(&session.token()).await;
    state.signal.notify("logout");
    info!(username = %session.user().username, "User logged out");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::app;
    use axum::http::{Method, StatusCode};
    use linus_core::UserPermissions;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_returns_user_and_permissions() {
        let app = app().await;
        let (status, body) = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": "admin", "password": "123" })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "admin");
        assert_eq!(body["user"]["isActive"], true);
        assert_eq!(body["permissions"]["canManageUsers"], true);
        assert!(body["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let app = app().await;
        for (username, password) in [("admin", "nope"), ("ghost", "123")] {
            let (status, body) = app
                .send(
                    Method::POST,
                    "/api/login",
                    None,
                    Some(json!({ "username": username, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], "INVALID_CREDENTIALS");
        }
    }

    #[tokio::test]
    async fn test_disabled_account_is_distinguished() {
        let app = app().await;
        app.add_user("sara", "pw", UserPermissions::none()).await;
        app.state.db.users().set_active("sara", false).await.unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": "sara", "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ACCOUNT_DISABLED");

        // Wrong password on the disabled account is still just a mismatch.
        let (status, _) = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": "sara", "password": "bad" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let app = app().await;
        let token = app.admin().await;

        let (status, _) = app.send(Method::GET, "/api/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.send(Method::POST, "/api/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app.send(Method::GET, "/api/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let app = app().await;
        let (status, body) = app
            .send(Method::POST, "/api/login", None, Some(json!({ "username": "admin" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
