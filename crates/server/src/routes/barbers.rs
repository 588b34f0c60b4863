//! Barber listing routes.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::db::BarberRepository;
use crate::error::{AppError, Result};
use crate::models::barber::{Barber, BarberFilter, BarberFilterQuery};
use crate::state::AppState;

/// List all barbers.
///
/// GET /barbers
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Barber>>> {
    let barbers = BarberRepository::new(state.pool())
        .list_all()
        .await
        .map_err(AppError::database("fetch_barbers"))?;

    Ok(Json(barbers))
}

/// One page of barbers filtered by status and experience.
///
/// GET /filtered-barbers?status=&experience=&sort=name|price&page=N
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn filtered(
    State(state): State<AppState>,
    query: std::result::Result<Query<BarberFilterQuery>, QueryRejection>,
) -> Result<Json<Vec<Barber>>> {
    let Query(query) = query?;
    let filter = BarberFilter::from(query);

    tracing::info!(
        action = "filter_barbers",
        status = filter.status.as_deref(),
        experience = filter.experience.as_deref(),
        sort = ?filter.sort,
        page = filter.page,
        "Filtering barbers"
    );

    let barbers = BarberRepository::new(state.pool())
        .list_filtered(&filter)
        .await
        .map_err(AppError::database("filter_barbers"))?;

    Ok(Json(barbers))
}
