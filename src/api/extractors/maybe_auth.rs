use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::debug;

/// Optional identity for public reads; the caller's user id, if logged in.
pub struct MaybeAuthUser(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let Some(cookies) = parts.extensions.get::<Cookies>() else {
            return Ok(MaybeAuthUser(None));
        };

        let access_token = match cookies.get("access_token") {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(MaybeAuthUser(None)),
        };

        match app_state.auth_service.decode_access_token(&access_token) {
            Ok(claims) => Ok(MaybeAuthUser(Some(claims.sub))),
            Err(_) => {
                // Expired or forged token: treat as guest
                debug!("MaybeAuth: ignoring invalid access token");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
