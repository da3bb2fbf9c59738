use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::CreateDependentRequest;
use crate::domain::models::dependent::Dependent;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const MAX_NAME_LEN: usize = 80;

pub async fn list_dependents(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let dependents = state.dependent_repo.list_by_user(&actor.user_id).await?;
    Ok(Json(dependents))
}

pub async fn create_dependent(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateDependentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!("Name must be 1 to {} characters", MAX_NAME_LEN)));
    }

    let dependent = state.dependent_repo.create(&Dependent::new(actor.user_id.clone(), name)).await?;
    info!("Dependent {} linked to user {}", dependent.id, actor.user_id);

    Ok((StatusCode::CREATED, Json(dependent)))
}

pub async fn delete_dependent(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.booking_service.remove_dependent(&actor.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
