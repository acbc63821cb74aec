//! Map data DTOs: the `/raw_data` read and the snapshot hand-off.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ActiveSighting, BoundingBox, CoverageMark, PointOfInterest, TeamStructureView,
};
use crate::error::ScannerError;
use crate::service::ScanStep;

/// Query string for `GET /raw_data`.
///
/// The rectangle applies only when all four corners are given. Each kind
/// is included unless its flag is `false`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RawDataParams {
    /// South-west latitude.
    #[serde(default)]
    pub sw_lat: Option<f64>,
    /// South-west longitude.
    #[serde(default)]
    pub sw_lng: Option<f64>,
    /// North-east latitude.
    #[serde(default)]
    pub ne_lat: Option<f64>,
    /// North-east longitude.
    #[serde(default)]
    pub ne_lng: Option<f64>,
    /// Include live sightings.
    #[serde(default = "yes")]
    pub pokemon: bool,
    /// Include points of interest.
    #[serde(default = "yes")]
    pub pokestops: bool,
    /// Include team structures.
    #[serde(default = "yes")]
    pub gyms: bool,
    /// Include recent coverage marks.
    #[serde(default = "yes")]
    pub scanned: bool,
    /// Comma-separated species ids to limit sightings to.
    #[serde(default)]
    pub ids: Option<String>,
}

fn yes() -> bool {
    true
}

impl RawDataParams {
    /// The requested rectangle, if complete.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_corners(self.sw_lat, self.sw_lng, self.ne_lat, self.ne_lng)
    }

    /// Parses `ids`. Empty means every species.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::InvalidRequest`] if an entry is not an
    /// integer.
    pub fn species(&self) -> Result<Vec<i64>, ScannerError> {
        let Some(ids) = self.ids.as_deref() else {
            return Ok(Vec::new());
        };
        ids.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| ScannerError::InvalidRequest(format!("bad species id: {id}")))
            })
            .collect()
    }
}

/// Response body for `GET /raw_data`.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct RawDataResponse {
    /// Live sightings.
    pub pokemons: Vec<ActiveSighting>,
    /// Points of interest.
    pub pokestops: Vec<PointOfInterest>,
    /// Team structures with their controlling team.
    pub gyms: Vec<TeamStructureView>,
    /// Coverage marks inside the rectangle within the coverage window.
    pub scanned: Vec<CoverageMark>,
}

/// Request body for `POST /api/v1/map-objects`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MapObjectsRequest {
    /// Completed passes over the scan area.
    pub iteration_num: u64,
    /// Step index within the current pass.
    pub step: u64,
    /// `[latitude, longitude]` the snapshot was fetched at.
    #[schema(value_type = Vec<f64>)]
    pub step_location: (f64, f64),
    /// Raw `GET_MAP_OBJECTS` snapshot.
    #[schema(value_type = Object)]
    pub map: serde_json::Value,
}

impl MapObjectsRequest {
    /// Scan position carried by the request.
    #[must_use]
    pub const fn scan_step(&self) -> ScanStep {
        ScanStep {
            iteration_num: self.iteration_num,
            step: self.step,
            step_location: self.step_location,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn params(ids: Option<&str>) -> RawDataParams {
        RawDataParams {
            sw_lat: Some(1.0),
            sw_lng: Some(2.0),
            ne_lat: None,
            ne_lng: Some(4.0),
            pokemon: true,
            pokestops: true,
            gyms: true,
            scanned: true,
            ids: ids.map(str::to_string),
        }
    }

    #[test]
    fn partial_rectangle_is_no_rectangle() {
        assert_eq!(params(None).bounds(), None);
    }

    #[test]
    fn species_ids_parse_with_blanks() {
        let Ok(ids) = params(Some("3, 7,,9")).species() else {
            panic!("ids should parse");
        };
        assert_eq!(ids, vec![3, 7, 9]);
        let Ok(none) = params(None).species() else {
            panic!("missing ids should parse");
        };
        assert!(none.is_empty());
    }

    #[test]
    fn bad_species_id_is_invalid_request() {
        assert!(matches!(
            params(Some("3,x")).species(),
            Err(ScannerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn query_flags_default_to_true() {
        let Ok(p) = serde_json::from_value::<RawDataParams>(serde_json::json!({ "swLat": 1.5 }))
        else {
            panic!("params should deserialize");
        };
        assert!(p.pokemon && p.pokestops && p.gyms && p.scanned);
        assert_eq!(p.sw_lat, Some(1.5));
    }
}
