use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::Claims;
use crate::domain::models::subject::Actor;
use crate::domain::models::user::ROLE_ADMIN;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

/// Authenticated caller taken from the `access_token` cookie.
/// Mutating requests must also echo the CSRF token in `X-CSRF-Token`.
pub struct AuthUser(pub Actor);

/// Same as [`AuthUser`] but rejects non-admin callers with 403.
pub struct AdminUser(pub Actor);

fn decode_claims(parts: &Parts, app_state: &AppState) -> Result<Claims, StatusCode> {
    let cookies = parts.extensions.get::<Cookies>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let access_token = cookies.get("access_token")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .value()
        .to_string();

    let claims = app_state.auth_service.decode_access_token(&access_token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let method = &parts.method;
    if method != "GET" && method != "HEAD" && method != "OPTIONS" {
        let csrf_header_val = parts.headers.get("X-CSRF-Token")
            .ok_or(StatusCode::FORBIDDEN)?
            .to_str()
            .map_err(|_| StatusCode::FORBIDDEN)?;

        if csrf_header_val != claims.csrf {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    Span::current().record("user_id", claims.sub.as_str());
    Ok(claims)
}

fn actor_from(claims: Claims) -> Actor {
    if claims.role == ROLE_ADMIN {
        Actor::admin(claims.sub)
    } else {
        Actor::user(claims.sub)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = decode_claims(parts, &app_state)?;
        Ok(AuthUser(actor_from(claims)))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let actor = actor_from(decode_claims(parts, &app_state)?);
        if !actor.is_admin {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(AdminUser(actor))
    }
}
