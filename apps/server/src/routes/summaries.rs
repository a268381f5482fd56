//! Daily summary (rekap) routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use kasir_core::DailySummary;
use kasir_db::{ArchiveOutcome, SummaryFilter, SummaryPage};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summaries", get(list).post(summarize))
        .route("/summaries/archive", post(archive))
        .route("/summaries/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct DateBody {
    pub date: NaiveDate,
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<SummaryFilter>,
) -> ApiResult<Json<SummaryPage>> {
    let page = state
        .db
        .summaries()
        .list(&filter, state.config.page_size)
        .await?;
    Ok(Json(page))
}

async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<DateBody>,
) -> ApiResult<Json<Vec<DailySummary>>> {
    Ok(Json(state.db.summaries().summarize_date(body.date).await?))
}

/// Rekap harian: summarize the day and clear its orders.
async fn archive(
    State(state): State<AppState>,
    Json(body): Json<DateBody>,
) -> ApiResult<Json<ArchiveOutcome>> {
    Ok(Json(state.db.summaries().archive_date(body.date).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.summaries().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
