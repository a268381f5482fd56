//! Sale recording and reversal routes.
//!
//! | Method | Path                       | Handler                         |
//! |--------|----------------------------|---------------------------------|
//! | GET    | `/sales?date=&search=`     | orders of a day, code search    |
//! | POST   | `/sales`                   | record a sale                   |
//! | GET    | `/sales/counts?date=`      | distinct orders per marketplace |
//! | POST   | `/sales/preview`           | price a line without recording  |
//! | POST   | `/sales/reset[?date=]`     | delete sales, restore stock     |
//! | DELETE | `/sales/items/{id}`        | reverse one line                |
//! | DELETE | `/sales/orders/{id}`       | reverse a whole order           |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kasir_core::validation::{validate_marketplace_name, validate_price, validate_quantity};
use kasir_core::{calculate_line, FeeRule, LineAmounts, Money, NewSale, OrderDetail};
use kasir_db::{MarketplaceOrderCount, ResetOutcome, ReversalOutcome, SaleFilter};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list).post(record))
        .route("/sales/counts", get(order_counts))
        .route("/sales/preview", post(preview))
        .route("/sales/reset", post(reset))
        .route("/sales/items/{id}", delete(delete_item))
        .route("/sales/orders/{id}", delete(delete_order))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// `?date=` narrows a reset to one day; without it every sale goes.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub date: Option<NaiveDate>,
}

/// One line as typed into the sales form, before it is recorded.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub marketplace: String,
    pub quantity: i64,
    pub sell_price: i64,
    pub cost_price: i64,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// Active fee rules the line was priced with.
    pub fees: Vec<FeeRule>,
    #[serde(flatten)]
    pub amounts: LineAmounts,
}

async fn record(
    State(state): State<AppState>,
    Json(sale): Json<NewSale>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = state.db.sales().record_sale(&sale).await?;
    info!(
        order_code = %detail.order.order_code,
        items = detail.items.len(),
        "Sale recorded via API"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> ApiResult<Json<Vec<OrderDetail>>> {
    Ok(Json(state.db.sales().list(&filter).await?))
}

async fn order_counts(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<MarketplaceOrderCount>>> {
    Ok(Json(state.db.sales().order_counts(query.date).await?))
}

async fn reset(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> ApiResult<Json<ResetOutcome>> {
    let outcome = state.db.sales().reset_sales(query.date).await?;
    info!(
        date = ?outcome.date,
        orders = outcome.orders_removed,
        units_restored = outcome.units_restored,
        "Sales reset via API"
    );
    Ok(Json(outcome))
}

/// Prices a line with the marketplace's active fees without recording it.
async fn preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    validate_marketplace_name(&request.marketplace)?;
    validate_quantity(request.quantity)?;
    validate_price("sell_price", request.sell_price)?;
    validate_price("cost_price", request.cost_price)?;

    let fees = state.db.fees().get_fees(request.marketplace.trim()).await?;
    debug!(marketplace = %request.marketplace, fees = fees.len(), "Previewing line");

    let amounts = calculate_line(
        Money::from_rupiah(request.sell_price),
        Money::from_rupiah(request.cost_price),
        request.quantity,
        &fees,
    )?;

    Ok(Json(PreviewResponse { fees, amounts }))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReversalOutcome>> {
    Ok(Json(state.db.sales().delete_line_item(&id).await?))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReversalOutcome>> {
    Ok(Json(state.db.sales().delete_order(&id).await?))
}
