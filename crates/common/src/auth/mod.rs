//! Authentication and authorization utilities
//!
//! Provides:
//! - Signed session tokens (JWT, HS256) carried in an HttpOnly cookie
//! - Session extractors that enforce the account role
//! - Password hashing
//! - Ownership checks for items and orders

mod ownership;
mod password;

pub use ownership::{ensure_item_owner, ensure_order_for_item, ensure_order_owner};
pub use password::{hash_password, verify_password};

use crate::config::AppConfig;
use crate::db::models::{Role, User};
use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on the configured session lifetime (about ten years)
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issues and validates session tokens and builds the cookie that carries them
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_secs: u64, cookie_name: impl Into<String>, secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs.min(MAX_SESSION_TTL_SECS)).unwrap_or_default(),
            cookie_name: cookie_name.into(),
            secure,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.session_secret(),
            config.auth.session_ttl_secs,
            config.auth.cookie_name.clone(),
            config.auth.secure_cookies,
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue a token for a freshly authenticated user
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to sign session: {}", e),
        })
    }

    /// Validate a token and return the session it describes
    pub fn validate(&self, token: &str) -> Result<Session> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredSession,
                _ => AppError::Unauthenticated,
            })?;

        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(Session {
            user_id,
            username: claims.username,
            role: claims.role,
        })
    }

    /// `Set-Cookie` value that installs the session
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, token, self.ttl_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that removes the session
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        )
    }

    /// Find the session token in the cookie jar, then in `Authorization: Bearer`
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        cookie_value(headers, &self.cookie_name).or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer)
        })
    }
}

/// Extract the token from an `Authorization` header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Look up a cookie by name across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Authenticated caller of any role
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl Session {
    /// Reject the session unless it has the given role
    pub fn require_role(self, role: Role) -> Result<Self> {
        if self.role == role {
            Ok(self)
        } else {
            tracing::warn!(
                user_id = self.user_id,
                role = self.role.as_str(),
                required = role.as_str(),
                "Role mismatch, sending user home"
            );
            crate::metrics::record_auth_denial("wrong_role");
            Err(AppError::WrongRole {
                home: self.role.home(),
            })
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let sessions = Arc::<SessionManager>::from_ref(state);

        let Some(token) = sessions.token_from_headers(&parts.headers) else {
            crate::metrics::record_auth_denial("anonymous");
            return Err(AppError::Unauthenticated);
        };

        sessions.validate(token).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            crate::metrics::record_auth_denial(match e {
                AppError::ExpiredSession => "expired",
                _ => "invalid_token",
            });
        })
    }
}

/// Authenticated caller with the client role
#[derive(Debug, Clone)]
pub struct ClientSession(pub Session);

impl ClientSession {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for ClientSession
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let session = Session::from_request_parts(parts, state).await?;
        session.require_role(Role::Client).map(Self)
    }
}

/// Authenticated caller with the supplier role
#[derive(Debug, Clone)]
pub struct SupplierSession(pub Session);

impl SupplierSession {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for SupplierSession
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let session = Session::from_request_parts(parts, state).await?;
        session.require_role(Role::Supplier).map(Self)
    }
}
