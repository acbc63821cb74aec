//! Map handlers: bounding-box reads and snapshot ingestion.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{MapObjectsRequest, RawDataParams, RawDataResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ScannerError};
use crate::service::IngestSummary;

/// `GET /raw_data`: Map data for the visible rectangle.
///
/// # Errors
///
/// Returns [`ScannerError`] on a bad `ids` list or storage failure.
#[utoipa::path(
    get,
    path = "/raw_data",
    tag = "Map",
    summary = "Map data inside a rectangle",
    description = "Returns live sightings, points of interest, team structures and recent coverage. Coverage is only returned when all four corners are given.",
    params(RawDataParams),
    responses(
        (status = 200, description = "Map data", body = RawDataResponse),
        (status = 400, description = "Invalid species filter", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn raw_data(
    State(state): State<AppState>,
    Query(params): Query<RawDataParams>,
) -> Result<impl IntoResponse, ScannerError> {
    let bounds = params.bounds();
    let species = params.species()?;
    let mut response = RawDataResponse::default();

    if params.pokemon {
        response.pokemons = state.queries.sightings(bounds, &species).await?;
    }
    if params.pokestops {
        response.pokestops = state.queries.points_of_interest(bounds).await?;
    }
    if params.gyms {
        response.gyms = state.queries.team_structures(bounds).await?;
    }
    if params.scanned
        && let Some(bounds) = bounds
    {
        response.scanned = state.queries.recent_coverage(bounds).await?;
    }

    Ok((StatusCode::OK, Json(response)))
}

/// `POST /api/v1/map-objects`: Ingest one map snapshot.
///
/// # Errors
///
/// Returns [`ScannerError::MalformedSnapshot`] for a bad snapshot and a
/// storage error if writing fails.
#[utoipa::path(
    post,
    path = "/api/v1/map-objects",
    tag = "Map",
    summary = "Ingest a map snapshot",
    description = "Parses a GET_MAP_OBJECTS snapshot fetched at the given scan step and upserts its sightings, forts and coverage mark.",
    request_body = MapObjectsRequest,
    responses(
        (status = 200, description = "Rows written per kind", body = IngestSummary),
        (status = 400, description = "Malformed snapshot", body = ErrorResponse),
        (status = 503, description = "Storage stayed busy", body = ErrorResponse),
    )
)]
pub async fn ingest_map_objects(
    State(state): State<AppState>,
    Json(req): Json<MapObjectsRequest>,
) -> Result<impl IntoResponse, ScannerError> {
    let step = req.scan_step();
    let summary = state.ingest.parse_map_json(req.map, &step).await?;
    tracing::info!(
        iteration = step.iteration_num,
        step = step.step,
        sightings = summary.sightings,
        "snapshot ingested"
    );
    Ok((StatusCode::OK, Json(summary)))
}

/// Map read routes mounted at the root level.
pub fn read_routes() -> Router<AppState> {
    Router::new().route("/raw_data", get(raw_data))
}

/// Ingestion routes nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/map-objects", post(ingest_map_objects))
}
