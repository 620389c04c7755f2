//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and the caller's profile.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use recipe_core::{
    validation::{validate_login, validate_registration},
    PortError, User,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::HttpError;
use crate::web::protocol::ErrorBody;
use crate::web::state::{AppState, AuthUser};

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request or email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    // An unreadable body is treated like an empty one.
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let email = req.email.trim();

    // 1. Validate before touching the database
    validate_registration(email, &req.password)?;

    // 2. Refuse a taken email
    match state.db.get_user_by_email(email).await {
        Ok(_) => return Err(HttpError::BadRequest(EMAIL_TAKEN.to_string())),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(HttpError::internal("Failed to register user", e)),
    }

    // 3. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| HttpError::internal("Failed to hash password", e))?
        .to_string();

    // 4. Create the user; a concurrent registration surfaces as a conflict
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| email.split('@').next());
    let user = state
        .db
        .create_user(email, &password_hash, name)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => HttpError::BadRequest(EMAIL_TAKEN.to_string()),
            other => HttpError::internal("Failed to register user", other),
        })?;

    // 5. Issue a token
    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| HttpError::internal("Failed to issue token", e))?;

    info!(user_id = %user.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing or malformed credentials", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let email = req.email.trim();

    // 1. Presence and shape only
    validate_login(email, &req.password)?;

    // 2. Get user by email
    let creds = state.db.get_user_by_email(email).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            warn!("Login attempt for unknown email");
            HttpError::Unauthorized(INVALID_CREDENTIALS.to_string())
        }
        other => HttpError::internal("Failed to log in", other),
    })?;

    // 3. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password)
        .map_err(|e| HttpError::internal("Authentication error", e))?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!(user_id = %creds.user.id, "Login attempt with wrong password");
        return Err(HttpError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    // 4. Issue a token
    let token = state
        .tokens
        .issue(&creds.user)
        .map_err(|e| HttpError::internal("Failed to issue token", e))?;

    Ok(Json(AuthResponse {
        user: creds.user.into(),
        token,
    }))
}

/// GET /api/auth/profile - The authenticated caller
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody),
        (status = 404, description = "User no longer exists", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let user = state.db.get_user_by_id(auth.id).await.map_err(|e| match e {
        PortError::NotFound(_) => HttpError::NotFound("User not found".to_string()),
        other => HttpError::internal("Failed to fetch profile", other),
    })?;

    Ok(Json(ProfileResponse { user: user.into() }))
}
