//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{MapObjectsRequest, RawDataResponse};
use crate::api::handlers::{map, system};
use crate::domain::{
    ActiveSighting, CoverageMark, EncounterId, PointOfInterest, Sighting, Team, TeamStructure,
    TeamStructureView,
};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::IngestSummary;

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "pogom-server", description = "Map snapshot ingestion and bounding-box queries"),
    paths(system::health_handler, map::raw_data, map::ingest_map_objects),
    components(schemas(
        Sighting,
        ActiveSighting,
        PointOfInterest,
        TeamStructure,
        TeamStructureView,
        Team,
        CoverageMark,
        EncounterId,
        RawDataResponse,
        MapObjectsRequest,
        IngestSummary,
        system::HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Map", description = "Map data reads and snapshot ingestion"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
