//! Shape of a raw `GET_MAP_OBJECTS` snapshot.
//!
//! Only the fields the parser reads are modelled. Required fields that are
//! missing make deserialization fail, which rejects the whole snapshot.

use serde::Deserialize;

use super::EncounterId;

/// Fort `type` value for points of interest. Anything else is a team
/// structure.
pub const FORT_TYPE_POINT_OF_INTEREST: i64 = 1;

/// Top-level envelope returned by the game API.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSnapshot {
    /// Per-request responses.
    pub responses: Responses,
}

impl MapSnapshot {
    /// Map cells carried by the snapshot.
    #[must_use]
    pub fn cells(&self) -> &[MapCell] {
        &self.responses.get_map_objects.map_cells
    }
}

/// Response map keyed by request name.
#[derive(Debug, Clone, Deserialize)]
pub struct Responses {
    /// Map objects response.
    #[serde(rename = "GET_MAP_OBJECTS")]
    pub get_map_objects: MapObjects,
}

/// Body of the map objects response.
#[derive(Debug, Clone, Deserialize)]
pub struct MapObjects {
    /// S2 cells covering the scanned area.
    pub map_cells: Vec<MapCell>,
}

/// One map cell.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapCell {
    /// Wild creatures visible in the cell.
    #[serde(default)]
    pub wild_pokemons: Vec<WildPokemon>,
    /// Forts in the cell.
    #[serde(default)]
    pub forts: Vec<Fort>,
}

/// A wild creature entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WildPokemon {
    /// Creature instance identifier.
    pub encounter_id: EncounterId,
    /// Species data.
    pub pokemon_data: PokemonData,
    /// Spawn point identifier.
    pub spawnpoint_id: String,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// Observation time in epoch milliseconds.
    pub last_modified_timestamp_ms: i64,
    /// Remaining lifetime in milliseconds.
    pub time_till_hidden_ms: i64,
}

/// Species payload nested in [`WildPokemon`].
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonData {
    /// Species id.
    pub pokemon_id: i64,
}

/// A fort: either a point of interest or a team structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Fort {
    /// Site identifier.
    pub id: String,
    /// Fort kind, see [`FORT_TYPE_POINT_OF_INTEREST`].
    #[serde(rename = "type", default)]
    pub fort_type: Option<i64>,
    /// Whether the site is interactive.
    pub enabled: bool,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// Last change in epoch milliseconds.
    pub last_modified_timestamp_ms: i64,
    /// Active lure, points of interest only.
    #[serde(default)]
    pub lure_info: Option<LureInfo>,
    /// Controlling team id.
    #[serde(default)]
    pub owned_by_team: Option<i64>,
    /// Defending species id.
    #[serde(default)]
    pub guard_pokemon_id: Option<i64>,
    /// Prestige points.
    #[serde(default)]
    pub gym_points: Option<i64>,
}

impl Fort {
    /// Returns `true` if the fort is a point of interest.
    #[must_use]
    pub fn is_point_of_interest(&self) -> bool {
        self.fort_type == Some(FORT_TYPE_POINT_OF_INTEREST)
    }
}

/// Lure attached to a point of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct LureInfo {
    /// Lure end in epoch milliseconds.
    pub lure_expires_timestamp_ms: i64,
    /// Species attracted by the lure.
    pub active_pokemon_id: i64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn cells_default_missing_lists() {
        let raw = r#"{"responses":{"GET_MAP_OBJECTS":{"map_cells":[{}]}}}"#;
        let Ok(snapshot) = serde_json::from_str::<MapSnapshot>(raw) else {
            panic!("valid snapshot rejected");
        };
        let Some(cell) = snapshot.cells().first() else {
            panic!("expected one cell");
        };
        assert!(cell.wild_pokemons.is_empty());
        assert!(cell.forts.is_empty());
    }

    #[test]
    fn missing_map_cells_is_rejected() {
        let raw = r#"{"responses":{"GET_MAP_OBJECTS":{}}}"#;
        assert!(serde_json::from_str::<MapSnapshot>(raw).is_err());
    }

    #[test]
    fn fort_without_type_is_a_structure() {
        let raw = r#"{"id":"g1","enabled":true,"latitude":1.0,"longitude":2.0,
                      "last_modified_timestamp_ms":0}"#;
        let Ok(fort) = serde_json::from_str::<Fort>(raw) else {
            panic!("valid fort rejected");
        };
        assert!(!fort.is_point_of_interest());
        assert!(fort.owned_by_team.is_none());
    }
}
