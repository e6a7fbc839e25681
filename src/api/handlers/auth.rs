use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use axum_extra::extract::CookieJar;

use crate::{
    api::{
        dto::{LoginRequest, MessageResponse, UserResponse},
        errors::AppError,
        AppState,
    },
    auth::{self, cleared_cookie, session_cookie, Claims},
};

/// Check admin credentials and set the `token` session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = UserResponse),
        (status = 400, description = "Malformed body", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<UserResponse>), AppError> {
    let Json(body) = payload?;

    let (user, token) = auth::login(
        state.storage.as_ref(),
        &state.signer,
        &body.username,
        &body.password,
        state.clock.now(),
    )
    .await?;

    let jar = jar.add(session_cookie(token, &state.cookies));
    Ok((jar, Json(UserResponse { user: user.into() })))
}

/// Clear the session cookie. Succeeds whether or not a session exists.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_cookie(&state.cookies)),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// The admin behind the current session.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current admin", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired session", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AppError> {
    // A valid token for an account that no longer exists is still unauthorized.
    let user = state
        .storage
        .user_by_id(&claims.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
    use axum_extra::extract::cookie::Cookie;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    use crate::{
        api::testing::{harness, ADMIN},
        auth::TOKEN_TTL_SECS,
        storage::{MemStorage, Storage},
    };

    #[tokio::test]
    async fn login_then_me_returns_user() {
        let h = harness(MemStorage::new()).await;

        let resp = h
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "hunter2" }))
            .await;
        resp.assert_status_ok();
        let cookie = resp.cookie("token");
        assert!(!cookie.value().is_empty());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(resp.json::<Value>()["user"]["username"], ADMIN);

        let me = h.server.get("/api/auth/me").await;
        me.assert_status_ok();
        let body: Value = me.json();
        assert_eq!(body["user"]["username"], ADMIN);
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let h = harness(MemStorage::new()).await;
        let resp = h
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "nope" }))
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(resp.json::<Value>()["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn malformed_login_body_is_bad_request() {
        let h = harness(MemStorage::new()).await;
        h.server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_without_session_is_unauthorized() {
        let h = harness(MemStorage::new()).await;
        h.server
            .get("/api/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tampered_cookie_is_unauthorized() {
        let h = harness(MemStorage::new()).await;
        let token = h.bearer().await.trim_start_matches("Bearer ").to_owned();
        let tampered = format!("{}x", token);

        h.server
            .get("/api/auth/me")
            .add_cookie(Cookie::new("token", tampered))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_cookie_is_unauthorized() {
        let h = harness(MemStorage::new()).await;
        let user = h.storage.user_by_username(ADMIN).await.unwrap().unwrap();
        let issued = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 5);
        let token = h.signer.issue(&user.id, &user.username, issued).unwrap();

        h.server
            .get("/api/auth/me")
            .add_cookie(Cookie::new("token", token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let h = harness(MemStorage::new()).await;
        let bearer = h.bearer().await;

        h.server
            .get("/api/auth/me")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&bearer).unwrap())
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let h = harness(MemStorage::new()).await;
        h.login().await;

        let resp = h.server.post("/api/auth/logout").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>()["message"], "Logged out successfully");
        let cookie = resp.cookie("token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[tokio::test]
    async fn logout_without_session_succeeds() {
        let h = harness(MemStorage::new()).await;
        h.server.post("/api/auth/logout").await.assert_status_ok();
    }
}
