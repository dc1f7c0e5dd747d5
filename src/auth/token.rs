use crate::config::Config;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Which half of the session pair a JWT belongs to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: i32,
    pub email: String,
    pub is_admin: bool,
    pub token_type: TokenType,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Identifier of a refresh token, stored server side so it can be used once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Signs and verifies the access/refresh pair with the configured HS256 secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_expire_minutes),
            Duration::days(config.refresh_token_expire_days),
        )
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn issue(
        &self,
        user_id: i32,
        email: &str,
        is_admin: bool,
        token_type: TokenType,
        ttl: Duration,
        jti: Option<String>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            is_admin,
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    pub fn issue_access(&self, user_id: i32, email: &str, is_admin: bool) -> Result<String, AppError> {
        self.issue(user_id, email, is_admin, TokenType::Access, self.access_ttl, None)
    }

    pub fn issue_refresh(
        &self,
        user_id: i32,
        email: &str,
        is_admin: bool,
        jti: &str,
    ) -> Result<String, AppError> {
        self.issue(
            user_id,
            email,
            is_admin,
            TokenType::Refresh,
            self.refresh_ttl,
            Some(jti.to_string()),
        )
    }

    /// Checks signature and expiry, then that the token is of the `expected` type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)?;
        if claims.token_type != expected {
            return Err(AppError::Unauthorized("Invalid token type".into()));
        }
        if expected == TokenType::Refresh && claims.jti.is_none() {
            return Err(AppError::Unauthorized("Refresh token has no identifier".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test_secret", Duration::minutes(30), Duration::days(7))
    }

    #[test]
    fn test_token_generation_and_verification() {
        let service = service();
        let token = service.issue_access(1, "jane@acme.test", true).unwrap();
        let claims = service.verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.email, "jane@acme.test");
        assert!(claims.is_admin);
        assert!(claims.jti.is_none());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = service();
        let refresh = service.issue_refresh(1, "jane@acme.test", false, "jti-1").unwrap();
        let access = service.issue_access(1, "jane@acme.test", false).unwrap();

        assert!(matches!(
            service.verify(&refresh, TokenType::Access),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.verify(&access, TokenType::Refresh),
            Err(AppError::Unauthorized(_))
        ));
        let claims = service.verify(&refresh, TokenType::Refresh).unwrap();
        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
    }

    #[test]
    fn test_token_expiration() {
        let expired = TokenService::new("test_secret", Duration::minutes(-5), Duration::days(7));
        let token = expired.issue_access(2, "a@b.test", false).unwrap();
        match service().verify(&token, TokenType::Access) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("ExpiredSignature")),
            other => panic!("Token should have been rejected as expired: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let other = TokenService::new("a_completely_different_secret", Duration::minutes(30), Duration::days(7));
        let token = other.issue_access(3, "a@b.test", false).unwrap();
        match service().verify(&token, TokenType::Access) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("Token should have been rejected: {:?}", other),
        }
        assert!(service().verify("not-a-jwt", TokenType::Access).is_err());
    }
}
