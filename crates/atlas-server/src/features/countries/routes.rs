//! HTTP routes for the countries feature

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::queries::{self, GetCountryError, GetCountryQuery, ListCountriesError, ListCountriesQuery};
use crate::api::response::{ErrorResponse, MessageResponse};
use crate::etl::scheduler;
use crate::features::AppState;

pub fn countries_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(list_countries))
        .route("/data/:id", get(get_country))
        .route("/etl/run", post(run_etl))
}

#[tracing::instrument(skip(state))]
async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<ListCountriesQuery>,
) -> Result<Response, CountriesApiError> {
    let response = queries::list::handle(&state.db, query).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(state), fields(id = id))]
async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, CountriesApiError> {
    let response = queries::get::handle(&state.db, GetCountryQuery { id }).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Trigger an on-demand refresh
///
/// Runs the pipeline to completion before answering: 200 when the refresh
/// succeeded, 500 when it failed. Failure details are in the server logs.
#[tracing::instrument(skip(state))]
async fn run_etl(State(state): State<AppState>) -> Response {
    if scheduler::trigger_now(&state.pipeline).await {
        MessageResponse::new("ETL refresh completed successfully").into_response()
    } else {
        ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "ETL refresh failed")
    }
}

/// Error type for countries API handlers
#[derive(Debug)]
enum CountriesApiError {
    List(ListCountriesError),
    Get(GetCountryError),
}

impl From<ListCountriesError> for CountriesApiError {
    fn from(err: ListCountriesError) -> Self {
        Self::List(err)
    }
}

impl From<GetCountryError> for CountriesApiError {
    fn from(err: GetCountryError) -> Self {
        Self::Get(err)
    }
}

impl IntoResponse for CountriesApiError {
    fn into_response(self) -> Response {
        match self {
            CountriesApiError::Get(GetCountryError::NotFound(id)) => ErrorResponse::with_status(
                StatusCode::NOT_FOUND,
                format!("Country with id {id} not found"),
            ),
            CountriesApiError::List(ListCountriesError::Database(e))
            | CountriesApiError::Get(GetCountryError::Database(e)) => {
                tracing::error!("Database error serving countries: {:?}", e);
                ErrorResponse::with_status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred",
                )
            },
        }
    }
}
