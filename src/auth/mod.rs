/*!
 * # Authentication Module
 *
 * JWT bearer authentication for the storefront API. Issues HS256 access
 * tokens on register/login and validates them in middleware; the resolved
 * [`AuthUser`] identity is inserted into request extensions for handlers.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{user, User, UserModel};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user ID)
    pub name: String,         // User's display name
    pub email: String,        // User's email
    pub jti: String,          // JWT ID (unique identifier for this token)
    pub iat: i64,             // Issued at time
    pub exp: i64,             // Expiration time
    pub nbf: i64,             // Not valid before time
    pub iss: String,          // Issuer
    pub aud: String,          // Audience
}

/// Authenticated user identity extracted from a validated token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token_id: String,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingAuth,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "AUTH_MISSING"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_CREDENTIALS"),
            Self::AccountDisabled => (StatusCode::FORBIDDEN, "AUTH_ACCOUNT_DISABLED"),
            Self::EmailTaken => (StatusCode::CONFLICT, "AUTH_EMAIL_TAKEN"),
            Self::ValidationError(_) => (StatusCode::BAD_REQUEST, "AUTH_VALIDATION"),
            Self::DatabaseError(_) | Self::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL_ERROR")
            }
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "auth failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Authentication service that handles account creation, credential
/// verification, and token issuance/validation.
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Create a new account and issue its first token.
    pub async fn register(&self, input: RegisterRequest) -> Result<AuthTokenResponse, AuthError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.to_ascii_lowercase()),
            password_hash: Set(hash_password(&input.password)?),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account = account.insert(&*self.db).await?;
        debug!("Registered user {}", account.id);

        self.token_response(&account)
    }

    /// Verify credentials and issue a token.
    pub async fn login(&self, input: LoginRequest) -> Result<AuthTokenResponse, AuthError> {
        let account = User::find()
            .filter(user::Column::Email.eq(input.email.to_ascii_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&input.password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !account.active {
            return Err(AuthError::AccountDisabled);
        }

        self.token_response(&account)
    }

    /// Generate a signed JWT for a user.
    pub fn generate_token(&self, account: &UserModel) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(format!("Failed to sign token: {}", e)))
    }

    /// Validate a JWT and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);
        validation.set_audience(&[self.config.jwt_audience.clone()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }

    fn token_response(&self, account: &UserModel) -> Result<AuthTokenResponse, AuthError> {
        Ok(AuthTokenResponse {
            access_token: self.generate_token(account)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs(),
            user: PublicUser::from(account),
        })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Authentication middleware that extracts and validates bearer tokens,
/// inserting the resolved [`AuthUser`] into request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth_service.validate_token(token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthUser {
        id,
        name: claims.name,
        email: claims.email,
        token_id: claims.jti,
    })
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/register", axum::routing::post(register_handler))
        .route("/login", axum::routing::post(login_handler))
        .route(
            "/me",
            axum::routing::get(me_handler).layer(axum::middleware::from_fn(auth_middleware)),
        )
}

async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;

    let response = auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;

    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

async fn me_handler(
    axum::Extension(user): axum::Extension<AuthUser>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    }))
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Token issuance response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: PublicUser,
}

/// User fields safe to expose to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&UserModel> for PublicUser {
    fn from(account: &UserModel) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "unit_test_secret_that_is_long_enough_for_hs256".into(),
            "storefront-api".into(),
            "storefront-clients".into(),
            Duration::from_secs(3600),
        );
        // Validation-only tests never touch the pool.
        let db = Arc::new(DatabaseConnection::default());
        AuthService::new(config, db)
    }

    fn test_account() -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_roundtrip() {
        let service = test_service();
        let account = test_account();

        let token = service.generate_token(&account).expect("token issued");
        let claims = service.validate_token(&token).expect("token valid");

        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.iss, "storefront-api");
        assert_eq!(claims.aud, "storefront-clients");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let token = service.generate_token(&test_account()).unwrap();

        let mut other = test_service();
        other.config.jwt_secret = "a_completely_different_secret_value_0123456789".into();
        assert!(matches!(
            other.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut service = test_service();
        let token = service.generate_token(&test_account()).unwrap();

        service.config.jwt_audience = "some-other-api".into();
        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn register_request_validation() {
        let bad_email = RegisterRequest {
            name: "Ada".into(),
            email: "not-an-email".into(),
            password: "longenough".into(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "short".into(),
        };
        assert!(short_password.validate().is_err());
    }
}
