use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::auth::{AuthResponse, UserProfile};
use crate::domain::models::user::User;
use crate::domain::services::auth_service::ACCESS_TOKEN_HOURS;
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;

const MAX_DISPLAY_NAME_LEN: usize = 80;

pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    let display_name = payload.display_name.trim().to_string();
    if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::Validation(format!("Display name must be 1 to {} characters", MAX_DISPLAY_NAME_LEN)));
    }
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("An account with this email already exists".into()));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let user = state.user_repo.create(&User::new(email, display_name, password_hash)).await?;

    let (access_jwt, csrf_token) = state.auth_service.issue_access_token(&user)?;
    set_cookie(&cookies, &access_jwt);

    info!("User registered: {}", user.id);

    Ok((StatusCode::CREATED, Json(auth_response(user, csrf_token))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_email(&payload.email).await?
        .ok_or(AppError::Unauthorized)?;

    state.auth_service.verify_password(&payload.password, &user.password_hash)?;

    let (access_jwt, csrf_token) = state.auth_service.issue_access_token(&user)?;
    set_cookie(&cookies, &access_jwt);

    info!("User logged in: {}", user.id);

    Ok(Json(auth_response(user, csrf_token)))
}

pub async fn logout(cookies: Cookies) -> Result<impl IntoResponse, AppError> {
    cookies.remove(Cookie::build(("access_token", "")).path("/").into());

    info!("User logged out");

    Ok(StatusCode::OK)
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&actor.user_id).await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        role: user.role,
    }))
}

fn auth_response(user: User, csrf_token: String) -> AuthResponse {
    AuthResponse {
        csrf_token,
        user: UserProfile {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        },
    }
}

fn set_cookie(cookies: &Cookies, access: &str) {
    let mut access_c = Cookie::new("access_token", access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::hours(ACCESS_TOKEN_HOURS));
    cookies.add(access_c);
}
