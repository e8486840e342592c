//! Authentication and authorization.
//!
//! Two kinds of principal exist: administrative users (role "admin") and
//! stores (role "store"). Both authenticate with email + password and
//! receive an HS256 bearer token. The token's subject is re-validated
//! against the persisted principal on every request; a token for a deleted
//! or deactivated principal is rejected even if its signature is valid.

mod policy;

pub use policy::Capability;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{store, user};
use crate::errors::ErrorResponse;
use crate::services::Actor;
use crate::AppState;

const TOKEN_ISSUER: &str = "storefront-api";

/// Principal role carried inside the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Store,
}

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A principal about to receive a token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

/// Authenticated caller, extracted from the bearer token and re-validated
/// against the database.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The tenant id for store callers.
    pub fn store_id(&self) -> Result<Uuid, crate::errors::ServiceError> {
        match self.role {
            Role::Store => Ok(self.id),
            Role::Admin => Err(crate::errors::ServiceError::Forbidden(
                "this operation is restricted to store accounts".to_string(),
            )),
        }
    }

    /// Scoping handle handed to read operations that serve both roles.
    pub fn actor(&self) -> Actor {
        match self.role {
            Role::Admin => Actor::Admin(self.id),
            Role::Store => Actor::Store(self.id),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid email or password")]
    WrongCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Unknown principal")]
    PrincipalNotFound,

    #[error("Internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "auth failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            success: false,
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for crate::errors::ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(detail) => crate::errors::ServiceError::InternalError(detail),
            other => crate::errors::ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_ttl_secs: u64) -> Self {
        Self {
            jwt_secret,
            token_ttl_secs,
        }
    }
}

/// Issues and validates tokens and checks principal credentials.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.config.token_ttl_secs
    }

    /// Generates a signed bearer token for a principal.
    pub fn generate_token(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + ChronoDuration::seconds(self.config.token_ttl_secs as i64);

        let claims = Claims {
            sub: principal.id.to_string(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            role: principal.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))
    }

    /// Validates a bearer token's signature, expiry and issuer.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Re-validates the token subject against the persisted principal.
    pub async fn load_principal(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        match claims.role {
            Role::Admin => {
                let admin = user::Entity::find_by_id(id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| AuthError::Internal(e.to_string()))?
                    .ok_or(AuthError::PrincipalNotFound)?;
                if !admin.active {
                    return Err(AuthError::AccountDisabled);
                }
                Ok(AuthUser {
                    id: admin.id,
                    role: Role::Admin,
                    name: admin.name,
                    email: admin.email,
                })
            }
            Role::Store => {
                let store = store::Entity::find_by_id(id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| AuthError::Internal(e.to_string()))?
                    .ok_or(AuthError::PrincipalNotFound)?;
                Ok(AuthUser {
                    id: store.id,
                    role: Role::Store,
                    name: store.name,
                    email: store.email,
                })
            }
        }
    }

    /// Checks admin credentials and returns the admin row.
    pub async fn authenticate_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let admin = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::WrongCredentials)?;

        if !verify_password(password, &admin.password_hash) {
            debug!(email, "admin credential check failed");
            return Err(AuthError::WrongCredentials);
        }
        if !admin.active {
            return Err(AuthError::AccountDisabled);
        }
        Ok(admin)
    }

    /// Checks store credentials and returns the store row.
    pub async fn authenticate_store(
        &self,
        email: &str,
        password: &str,
    ) -> Result<store::Model, AuthError> {
        let store = store::Entity::find()
            .filter(store::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::WrongCredentials)?;

        if !verify_password(password, &store.password_hash) {
            debug!(email, "store credential check failed");
            return Err(AuthError::WrongCredentials);
        }
        Ok(store)
    }
}

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored Argon2 hash. A malformed stored
/// hash counts as a failed verification, not an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::password_hash::PasswordHash;
    use argon2::{Argon2, PasswordVerifier};

    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingAuth)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AuthError::MissingAuth)?;

        let claims = state.auth.validate_token(token)?;
        state.auth.load_principal(&claims).await
    }
}
