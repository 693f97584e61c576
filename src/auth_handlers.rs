use crate::auth::{create_jwt, hash_password, verify_password};
use crate::db::StoreError;
use crate::error::ApiError;
use crate::models::{AuthResponse, Claims, LoginRequest, RegisterRequest, User};
use crate::validation::{normalize_email, validate_login, validate_registration};
use crate::AppState;
use actix_web::{post, web, HttpResponse};
use mongodb::bson;

const REGISTER_FAILED: &str = "Internal server error during registration";
const LOGIN_FAILED: &str = "Internal server error during login";
const DUPLICATE_EMAIL: &str = "User with this email already exists";

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    if let Err(details) = validate_registration(&req) {
        tracing::warn!("Validation errors in registration: {:?}", details);
        return Err(ApiError::Validation(details));
    }

    let email = normalize_email(&req.email);
    let existing = state.store.find_user_by_email(&email).await.map_err(|e| {
        tracing::error!("Error looking up {} during registration: {}", email, e);
        ApiError::Internal(REGISTER_FAILED)
    })?;
    if existing.is_some() {
        tracing::warn!("Registration attempt with existing email: {}", email);
        return Err(ApiError::BadRequest(DUPLICATE_EMAIL.to_string()));
    }

    let password = hash_password(req.password, state.auth.bcrypt_cost).await?;
    let now = bson::DateTime::now();
    let user = User {
        id: None,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email,
        password,
        created_at: now,
        updated_at: now,
    };

    let user = match state.store.insert_user(user).await {
        Ok(user) => user,
        Err(StoreError::DuplicateKey(email)) => {
            tracing::warn!("Concurrent registration lost the race for {}", email);
            return Err(ApiError::BadRequest(DUPLICATE_EMAIL.to_string()));
        }
        Err(e) => {
            tracing::error!("Failed to insert user into database: {}", e);
            return Err(ApiError::Internal("Failed to create user account"));
        }
    };

    let token = create_jwt(&user, &state.auth).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", user.email, e);
        ApiError::Internal(REGISTER_FAILED)
    })?;

    tracing::info!("User registered successfully: {}", user.email);
    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".to_string(),
        user: user.to_public(),
        token,
    }))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    if let Err(details) = validate_login(&req) {
        tracing::warn!("Validation errors in login: {:?}", details);
        return Err(ApiError::Validation(details));
    }

    let email = normalize_email(&req.email);
    let user = match state.store.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Login attempt with non-existent email: {}", email);
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            tracing::error!("Error looking up {} during login: {}", email, e);
            return Err(ApiError::Internal(LOGIN_FAILED));
        }
    };

    if !verify_password(req.password, user.password.clone()).await? {
        tracing::warn!("Login attempt with invalid password for email: {}", email);
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_jwt(&user, &state.auth).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", email, e);
        ApiError::Internal(LOGIN_FAILED)
    })?;

    tracing::info!("User logged in successfully: {}", email);
    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.to_public(),
        token,
    }))
}

/// Mounted behind the bearer guard, which has already checked the token.
pub async fn me(claims: web::ReqData<Claims>) -> HttpResponse {
    HttpResponse::Ok().json(claims.into_inner())
}
