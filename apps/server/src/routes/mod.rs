//! HTTP routes.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub mod fees;
pub mod products;
pub mod sales;
pub mod summaries;

/// Builds the full router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(products::routes())
        .merge(fees::routes())
        .merge(sales::routes())
        .merge(summaries::routes())
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: bool,
    migrations_total: usize,
    migrations_applied: usize,
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> ApiResult<Json<Health>> {
    let database = state.db.health_check().await;
    let (migrations_total, migrations_applied) =
        kasir_db::migrations::migration_status(state.db.pool()).await?;

    Ok(Json(Health {
        status: if database { "ok" } else { "degraded" },
        database,
        migrations_total,
        migrations_applied,
    }))
}
