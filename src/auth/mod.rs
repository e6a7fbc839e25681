//! Admin authentication: bcrypt password checks, HS256 session tokens and the
//! `token` cookie that carries them.

pub mod middleware;
pub mod token;

use std::sync::OnceLock;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    config::{CookieSameSite, CookieSettings},
    db::models::User,
    storage::Storage,
};

pub use middleware::require_admin;
pub use token::{Claims, TokenSigner, TOKEN_TTL_SECS};

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Hash checked against when the username is unknown. Built on first use at
/// the production cost.
fn dummy_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("brew-crew-unknown-user").unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Check credentials and issue a session token for the user.
pub async fn login(
    storage: &dyn Storage,
    signer: &TokenSigner,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<(User, String), AuthError> {
    let Some(user) = storage.user_by_username(username).await? else {
        // Unknown users pay for one bcrypt check too.
        let _ = verify_password(password, dummy_hash());
        warn!(username = %username, "Login for unknown user");
        return Err(AuthError::InvalidCredentials);
    };

    let matches = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
        warn!(username = %username, error = %e, "Stored password hash is unreadable");
        false
    });
    if !matches {
        warn!(username = %username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = signer.issue(&user.id, &user.username, now)?;
    info!(username = %username, "Admin logged in");
    Ok((user, token))
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

fn same_site(policy: CookieSameSite) -> SameSite {
    match policy {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::None => SameSite::None,
    }
}

pub fn session_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::seconds(TOKEN_TTL_SECS))
        .same_site(same_site(settings.same_site))
        .secure(settings.secure)
        .build()
}

/// Overwrites the session cookie with an empty, already-expired one.
pub fn cleared_cookie(settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::ZERO)
        .same_site(same_site(settings.same_site))
        .secure(settings.secure)
        .build()
}
