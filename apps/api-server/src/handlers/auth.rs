//! Account handlers: registration, login, logout and the profile page.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use std::sync::Arc;

use quill_core::domain::{Profile, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_shared::dto::{
    AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest,
    UserResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn validate_username(username: &str, errors: &mut Vec<String>) {
    if username.len() < 3 || username.len() > 30 {
        errors.push("Username must be between 3 and 30 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(
            "Username may only contain letters, numbers, hyphens and underscores".to_string(),
        );
    }
}

fn validate_email(email: &str, errors: &mut Vec<String>) {
    if email.is_empty() || !email.contains('@') {
        errors.push("Invalid email address".to_string());
    }
}

fn validate_password(password: &str, errors: &mut Vec<String>) {
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters".to_string());
    }
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut errors = Vec::new();
    validate_username(&req.username, &mut errors);
    validate_email(&req.email, &mut errors);
    validate_password(&req.password, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // New accounts carry no grants; authoring permissions are provisioned
    // out of band.
    let user = User::new(req.username, req.email, password_hash);
    let saved = state.users.insert(user).await?;
    state.profiles.insert(Profile::new(saved.id)).await?;

    tracing::info!(user_id = %saved.id, "Account registered");

    let token = token_service
        .generate_token(saved.id, &saved.username, saved.permissions.clone())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // A missing account and a wrong password answer identically.
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = token_service
        .generate_token(user.id, &user.username, user.permissions.clone())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// POST /api/auth/logout
///
/// Tokens are stateless bearer tokens, so logout is an authenticated no-op;
/// the client discards its copy.
pub async fn logout(identity: Identity) -> AppResult<HttpResponse> {
    tracing::debug!(user_id = %identity.user_id, "User logged out");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/profile
pub async fn profile(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
    let profile = state
        .profiles
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: user_response(&user),
        avatar: profile.avatar,
        bio: profile.bio,
    }))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut errors = Vec::new();
    validate_username(&req.username, &mut errors);
    validate_email(&req.email, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let mut user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
    let mut profile = state
        .profiles
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    // Uniqueness checks exclude the caller's own current values.
    if req.username != user.username
        && state.users.find_by_username(&req.username).await?.is_some()
    {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if req.email != user.email && state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    user.username = req.username;
    user.email = req.email;
    user.updated_at = now;
    profile.avatar = req.avatar;
    profile.bio = req.bio;
    profile.updated_at = now;

    let (user, profile) = state.users.update_with_profile(user, profile).await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: user_response(&user),
        avatar: profile.avatar,
        bio: profile.bio,
    }))
}
