use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use super::{TokenSigner, TOKEN_COOKIE};
use crate::api::errors::AppError;

/// Admin gate for protected routes.
///
/// Takes the token from the `token` cookie, or from an
/// `Authorization: Bearer` header when no cookie is sent. On success the
/// verified [`Claims`](super::Claims) are inserted into request extensions.
pub async fn require_admin(
    State(signer): State<TokenSigner>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_owned)
        })
        .ok_or(AppError::Unauthorized)?;

    let claims = signer.verify(&token).map_err(|e| {
        debug!(error = %e, "Rejected admin token");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
