use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the HttpOnly session cookie set on register/login.
pub const AUTH_COOKIE: &str = "authToken";

/// Token lifetime. Matches the cookie max-age.
pub const TOKEN_LIFETIME_HOURS: i64 = 48;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
    pub email: String, // Email for convenience
}

impl Claims {
    pub fn new(user_id: Uuid, email: String) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(TOKEN_LIFETIME_HOURS);

        Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            email,
        }
    }

    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth("Invalid user ID in token".into()))
    }
}

// ============================================================================
// JWT Operations
// ============================================================================

pub fn create_token(user_id: Uuid, email: String, secret: &str) -> AppResult<String> {
    let claims = Claims::new(user_id, email);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to create JWT: {:?}", e);
        AppError::Auth("Failed to create token".into())
    })
}

pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token validation failed: {:?}", e);
        AppError::Auth("Invalid or expired token".into())
    })
}

// ============================================================================
// Password Hashing
// ============================================================================

pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        AppError::Internal
    })
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, hash).map_err(|e| {
        tracing::error!("Failed to verify password: {:?}", e);
        AppError::Internal
    })
}

// ============================================================================
// Auth Extractor
// ============================================================================

/// Authenticated user, resolved from a Bearer token or the `authToken` cookie.
///
/// The cookie path exists for browser clients (the original frontend relies on
/// an HttpOnly cookie); API clients send `Authorization: Bearer <token>`.
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = match parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => {
                // Infallible extractor; an empty jar just yields no cookie.
                let jar = parts
                    .extract::<CookieJar>()
                    .await
                    .map_err(|_| AppError::Auth("Authentication required".into()))?;
                jar.get(AUTH_COOKIE)
                    .map(|c| c.value().to_string())
                    .ok_or_else(|| AppError::Auth("Authentication required".into()))?
            }
        };

        let claims = validate_token(&token, &state.jwt_secret)?;
        let user_id = claims.user_id()?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-min-32-characters-long!!";

    #[test]
    fn token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "gregor@example.com".into(), SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "gregor@example.com");
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = create_token(Uuid::new_v4(), "a@b.com".into(), SECRET).unwrap();
        assert!(validate_token(&token, "some-other-secret-of-enough-length").is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("securepassword123").unwrap();
        assert!(verify_password("securepassword123", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }
}
