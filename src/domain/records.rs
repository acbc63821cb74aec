//! Persisted entity records.
//!
//! One struct per table. Field names double as column names and as the
//! JSON keys served to the map front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EncounterId, Located, species_name};

/// A wild creature seen at a position until `disappear_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Sighting {
    /// Creature instance identifier (primary key).
    #[sqlx(try_from = "i64")]
    pub encounter_id: EncounterId,
    /// Spawn point the creature appeared at.
    pub spawnpoint_id: String,
    /// Species id.
    pub pokemon_id: i64,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// When the creature despawns.
    pub disappear_time: DateTime<Utc>,
}

/// A live sighting as served to readers, with its species name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActiveSighting {
    /// Stored sighting.
    #[serde(flatten)]
    pub sighting: Sighting,
    /// Display name of `pokemon_id`.
    pub pokemon_name: String,
}

impl From<Sighting> for ActiveSighting {
    fn from(sighting: Sighting) -> Self {
        let pokemon_name = species_name(sighting.pokemon_id).to_string();
        Self {
            sighting,
            pokemon_name,
        }
    }
}

/// A point of interest, optionally running a lure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PointOfInterest {
    /// Site identifier (primary key).
    pub pokestop_id: String,
    /// Whether the site is interactive.
    pub enabled: bool,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// Last change reported by the API.
    pub last_modified: DateTime<Utc>,
    /// When the active lure runs out.
    pub lure_expiration: Option<DateTime<Utc>>,
    /// Species currently attracted by the lure.
    pub active_pokemon_id: Option<i64>,
}

/// A team-controlled structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeamStructure {
    /// Site identifier (primary key).
    pub gym_id: String,
    /// Controlling team, see [`Team`]. `0` when uncontested.
    pub team_id: i64,
    /// Defending species, `0` when empty.
    pub guard_pokemon_id: i64,
    /// Prestige points.
    pub gym_points: i64,
    /// Whether the site is interactive.
    pub enabled: bool,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// Last change reported by the API.
    pub last_modified: DateTime<Utc>,
}

impl TeamStructure {
    /// Returns the controlling team, or `None` for an id outside the known
    /// range.
    #[must_use]
    pub fn team(&self) -> Option<Team> {
        Team::from_id(self.team_id)
    }
}

/// A team structure as served to readers, with its controlling team named.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamStructureView {
    /// Stored structure.
    #[serde(flatten)]
    pub structure: TeamStructure,
    /// Controlling team; `null` for an unknown `team_id`.
    pub team: Option<Team>,
}

impl From<TeamStructure> for TeamStructureView {
    fn from(structure: TeamStructure) -> Self {
        let team = structure.team();
        Self { structure, team }
    }
}

/// Marks a scan location as covered at `last_modified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CoverageMark {
    /// `"lat,lon"` of the scanned position (primary key).
    pub scanned_id: String,
    /// WGS-84 latitude.
    pub latitude: f64,
    /// WGS-84 longitude.
    pub longitude: f64,
    /// When the position was scanned.
    pub last_modified: DateTime<Utc>,
}

impl CoverageMark {
    /// Builds the mark for one scan step.
    ///
    /// The key always carries a fractional part, so `(40, -74)` is keyed
    /// `"40.0,-74.0"`.
    #[must_use]
    pub fn at(latitude: f64, longitude: f64, scanned_at: DateTime<Utc>) -> Self {
        Self {
            scanned_id: format!("{latitude:?},{longitude:?}"),
            latitude,
            longitude,
            last_modified: scanned_at,
        }
    }
}

macro_rules! impl_located {
    ($($record:ty),+) => {
        $(
            impl Located for $record {
                fn position_mut(&mut self) -> (&mut f64, &mut f64) {
                    (&mut self.latitude, &mut self.longitude)
                }
            }
        )+
    };
}

impl_located!(Sighting, PointOfInterest, TeamStructure, CoverageMark);

impl Located for ActiveSighting {
    fn position_mut(&mut self) -> (&mut f64, &mut f64) {
        self.sighting.position_mut()
    }
}

impl Located for TeamStructureView {
    fn position_mut(&mut self) -> (&mut f64, &mut f64) {
        self.structure.position_mut()
    }
}

/// Team controlling a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Nobody holds the structure.
    Uncontested,
    /// Blue team.
    Mystic,
    /// Red team.
    Valor,
    /// Yellow team.
    Instinct,
}

impl Team {
    /// Maps the numeric team id used by the API.
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::Uncontested),
            1 => Some(Self::Mystic),
            2 => Some(Self::Valor),
            3 => Some(Self::Instinct),
            _ => None,
        }
    }

    /// Numeric team id used by the API and storage.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Uncontested => 0,
            Self::Mystic => 1,
            Self::Valor => 2,
            Self::Instinct => 3,
        }
    }
}
