//! Catalog routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use kasir_core::{NewProduct, ProductDetail};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(fetch).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductDetail>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(state.db.products().get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    let detail = state.db.products().create(&input).await?;
    info!(id = %detail.product.id, code = %detail.product.code, "Product created via API");
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewProduct>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(state.db.products().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
