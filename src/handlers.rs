use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        ApiMessage, CreateCustomerRequest, Customer, PatchCustomerRequest,
        ReplaceCustomerRequest,
    },
    state::AppState,
};

pub async fn healthcheck() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: "ok".to_string(),
    })
}

pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let customers = state.repo.list().await?;
    Ok(Json(customers))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let customer = state.repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Customer>> {
    let customer = state
        .repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound(id))?;

    Ok(Json(customer))
}

pub async fn replace_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplaceCustomerRequest>,
) -> AppResult<Json<Customer>> {
    let customer = state
        .repo
        .replace(id, payload)
        .await?
        .ok_or(AppError::NotFound(id))?;

    Ok(Json(customer))
}

pub async fn patch_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PatchCustomerRequest>,
) -> AppResult<Json<Customer>> {
    let customer = state
        .repo
        .patch(id, payload)
        .await?
        .ok_or(AppError::NotFound(id))?;

    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let deleted = state.repo.delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
