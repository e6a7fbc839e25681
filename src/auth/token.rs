use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Admin tokens (and the cookie carrying them) live for 24 hours.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Payload of an admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 session tokens with the configured secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            id: user_id.to_owned(),
            username: username.to_owned(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::Signing)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new("s3cret");
        let now = Utc::now();
        let token = signer.issue("u1", "admin", now).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.id, "u1");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenSigner::new("one").issue("u1", "admin", Utc::now()).unwrap();
        assert!(matches!(
            TokenSigner::new("two").verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signer = TokenSigner::new("s3cret");
        let token = signer.issue("u1", "admin", Utc::now()).unwrap();
        let other = signer.issue("u2", "mallory", Utc::now()).unwrap();

        // Splice the second token's payload onto the first token's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(signer.verify(&forged).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("s3cret");
        let issued = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 5);
        let token = signer.issue("u1", "admin", issued).unwrap();

        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TokenSigner::new("s3cret").verify("not-a-jwt").is_err());
    }
}
