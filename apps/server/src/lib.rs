//! # kasir-server: JSON API for Kasir
//!
//! Routes map one-to-one onto the `kasir-db` repositories. The server owns no
//! business rules of its own; it parses requests, calls a repository and
//! turns the result (or the error) into JSON.
//!
//! ## Routes
//! ```text
//! GET    /health
//! GET    /api/products                 POST /api/products
//! GET    /api/products/{id}            PUT  /api/products/{id}   DELETE
//! GET    /api/marketplaces             POST /api/marketplaces
//! DELETE /api/marketplaces/{id}
//! GET    /api/fees?marketplace=        POST /api/fees
//! PUT    /api/fees/{id}/active         DELETE /api/fees/{id}
//! POST   /api/sales                    GET  /api/sales?date=&search=
//! GET    /api/sales/counts?date=       POST /api/sales/reset[?date=]
//! POST   /api/sales/preview
//! DELETE /api/sales/items/{id}         DELETE /api/sales/orders/{id}
//! GET    /api/summaries?month=&year=&marketplace=&page=
//! POST   /api/summaries                POST /api/summaries/archive
//! DELETE /api/summaries/{id}
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
