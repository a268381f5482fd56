//! Marketplace and admin fee routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;

use kasir_core::{AdminFee, Marketplace, NewAdminFee};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/marketplaces", get(list_marketplaces).post(create_marketplace))
        .route("/marketplaces/{id}", delete(delete_marketplace))
        .route("/fees", get(list_fees).post(create_fee))
        .route("/fees/{id}", delete(delete_fee))
        .route("/fees/{id}/active", put(set_active))
}

#[derive(Debug, Deserialize)]
pub struct NewMarketplace {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeQuery {
    pub marketplace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveFlag {
    pub is_active: bool,
}

async fn list_marketplaces(State(state): State<AppState>) -> ApiResult<Json<Vec<Marketplace>>> {
    Ok(Json(state.db.fees().list_marketplaces().await?))
}

async fn create_marketplace(
    State(state): State<AppState>,
    Json(input): Json<NewMarketplace>,
) -> ApiResult<(StatusCode, Json<Marketplace>)> {
    let marketplace = state.db.fees().create_marketplace(&input.name).await?;
    Ok((StatusCode::CREATED, Json(marketplace)))
}

async fn delete_marketplace(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.fees().delete_marketplace(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_fees(
    State(state): State<AppState>,
    Query(query): Query<FeeQuery>,
) -> ApiResult<Json<Vec<AdminFee>>> {
    Ok(Json(state.db.fees().list(query.marketplace.as_deref()).await?))
}

async fn create_fee(
    State(state): State<AppState>,
    Json(input): Json<NewAdminFee>,
) -> ApiResult<(StatusCode, Json<AdminFee>)> {
    let fee = state.db.fees().create(&input).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(flag): Json<ActiveFlag>,
) -> ApiResult<Json<AdminFee>> {
    Ok(Json(state.db.fees().set_active(&id, flag.is_active).await?))
}

async fn delete_fee(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.fees().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
