//! Feature modules implementing the Atlas API
//!
//! Each feature is a vertical slice with its own queries and routes:
//!
//! - **countries**: paginated/filterable country reads and the on-demand
//!   ETL trigger
//!
//! Queries are plain `handle(pool, query)` functions with per-query error
//! enums; routes convert those errors into HTTP responses.

pub mod countries;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::etl::EtlPipeline;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool for read queries
    pub db: sqlx::PgPool,
    /// ETL pipeline for the on-demand refresh trigger
    pub pipeline: Arc<EtlPipeline>,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(countries::countries_routes())
        .with_state(state)
}
