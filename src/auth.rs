use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is missing")]
    Missing,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// HS256 bearer tokens for the chat endpoint.
#[derive(Clone)]
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl);
        self.issue_expiring_at(subject, expires_at)
    }

    pub fn issue_expiring_at(
        &self,
        subject: &str,
        expires_at: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Accepts `Bearer <token>` or the bare token.
    pub fn authorize(&self, header_value: Option<&str>) -> Result<Claims, AuthError> {
        let raw = header_value.map(str::trim).unwrap_or_default();
        let token = match raw.strip_prefix("Bearer") {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
            _ => raw,
        };
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Authenticator {
        Authenticator::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_tokens_verify_with_and_without_scheme() {
        let auth = auth();
        let token = auth.issue("demo-user").unwrap();

        assert_eq!(auth.authorize(Some(&token)).unwrap().sub, "demo-user");
        let bearer = format!("Bearer {token}");
        assert_eq!(auth.authorize(Some(&bearer)).unwrap().sub, "demo-user");
    }

    #[test]
    fn missing_token() {
        assert_eq!(auth().authorize(None), Err(AuthError::Missing));
        assert_eq!(auth().authorize(Some("Bearer ")), Err(AuthError::Missing));
    }

    #[test]
    fn expired_token() {
        let auth = auth();
        let token = auth
            .issue_expiring_at("demo-user", Utc::now().timestamp() - 60)
            .unwrap();
        assert_eq!(auth.authorize(Some(&token)), Err(AuthError::Expired));
    }

    #[test]
    fn foreign_or_garbage_tokens_are_invalid() {
        let other = Authenticator::new("other-secret", Duration::from_secs(60));
        let token = other.issue("demo-user").unwrap();
        assert_eq!(auth().authorize(Some(&token)), Err(AuthError::Invalid));
        assert_eq!(auth().authorize(Some("not-a-jwt")), Err(AuthError::Invalid));
    }
}
