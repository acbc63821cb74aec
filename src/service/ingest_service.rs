//! Snapshot ingestion: turns one map snapshot into upserted rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{IngestToggles, ScannerConfig};
use crate::domain::snapshot::{Fort, WildPokemon};
use crate::domain::{
    CoverageMark, MapSnapshot, PointOfInterest, Sighting, SpeciesAllowList, TeamStructure,
    species_name,
};
use crate::error::ScannerError;
use crate::persistence::MapStore;

/// Where the scanner was when it fetched a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScanStep {
    /// Completed passes over the scan area.
    pub iteration_num: u64,
    /// Step index within the current pass.
    pub step: u64,
    /// `[latitude, longitude]` the snapshot was fetched at.
    #[schema(value_type = Vec<f64>)]
    pub step_location: (f64, f64),
}

/// Rows written by one [`IngestService::parse_map`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestSummary {
    /// Distinct sightings upserted.
    pub sightings: u64,
    /// Distinct points of interest upserted.
    pub points_of_interest: u64,
    /// Distinct team structures upserted.
    pub team_structures: u64,
    /// Key of the coverage mark written for this step.
    pub scanned_id: String,
}

/// Records pulled out of one snapshot, before anything is written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecords {
    /// Allowed sightings.
    pub sightings: Vec<Sighting>,
    /// Points of interest.
    pub points_of_interest: Vec<PointOfInterest>,
    /// Team structures.
    pub team_structures: Vec<TeamStructure>,
}

/// Parses map snapshots and hands the records to the [`MapStore`].
///
/// Holds no state between calls; every call is one sequential pass:
/// extract, then one batched upsert per enabled non-empty kind, then the
/// coverage mark.
#[derive(Debug, Clone)]
pub struct IngestService {
    store: MapStore,
    allow_list: SpeciesAllowList,
    toggles: IngestToggles,
    fort_warmup_steps: u64,
}

impl IngestService {
    /// Creates a new `IngestService`.
    #[must_use]
    pub fn new(
        store: MapStore,
        allow_list: SpeciesAllowList,
        toggles: IngestToggles,
        fort_warmup_steps: u64,
    ) -> Self {
        Self {
            store,
            allow_list,
            toggles,
            fort_warmup_steps,
        }
    }

    /// Creates an `IngestService` with the ingestion settings in `config`.
    #[must_use]
    pub fn from_config(store: MapStore, config: &ScannerConfig) -> Self {
        Self::new(
            store,
            config.allow_list.clone(),
            config.ingest,
            config.fort_warmup_steps,
        )
    }

    /// Returns `true` once the scan has settled enough for fort data to be
    /// trusted: any later pass, or past the warm-up steps of the first.
    #[must_use]
    pub fn forts_trusted(&self, step: &ScanStep) -> bool {
        step.iteration_num > 0 || step.step > self.fort_warmup_steps
    }

    /// Pulls the storable records out of `snapshot`.
    ///
    /// Sightings outside the allow-list are dropped. Forts are skipped
    /// entirely while [`IngestService::forts_trusted`] is `false`. Kinds
    /// switched off in the toggles come back empty.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::MalformedSnapshot`] if a timestamp is out of
    /// range.
    pub fn extract(
        &self,
        snapshot: &MapSnapshot,
        step: &ScanStep,
    ) -> Result<ExtractedRecords, ScannerError> {
        let mut out = ExtractedRecords::default();
        let forts_trusted = self.forts_trusted(step);

        for cell in snapshot.cells() {
            if self.toggles.sightings {
                for wild in &cell.wild_pokemons {
                    if !self.allow_list.allows(wild.pokemon_data.pokemon_id) {
                        continue;
                    }
                    let sighting = sighting_from(wild)?;
                    tracing::debug!(
                        pokemon = species_name(sighting.pokemon_id),
                        lat = sighting.latitude,
                        lng = sighting.longitude,
                        disappears = %sighting.disappear_time,
                        "sighting"
                    );
                    out.sightings.push(sighting);
                }
            }

            if !forts_trusted {
                continue;
            }
            for fort in &cell.forts {
                if fort.is_point_of_interest() {
                    if self.toggles.points_of_interest {
                        out.points_of_interest.push(point_of_interest_from(fort)?);
                    }
                } else if self.toggles.team_structures {
                    out.team_structures.push(team_structure_from(fort)?);
                }
            }
        }

        Ok(out)
    }

    /// Ingests one snapshot, stamping the coverage mark with the current
    /// time.
    ///
    /// # Errors
    ///
    /// See [`IngestService::parse_map_at`].
    pub async fn parse_map(
        &self,
        snapshot: &MapSnapshot,
        step: &ScanStep,
    ) -> Result<IngestSummary, ScannerError> {
        self.parse_map_at(snapshot, step, Utc::now()).await
    }

    /// Ingests one snapshot, stamping the coverage mark with `now`.
    ///
    /// Nothing is written if extraction fails.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::MalformedSnapshot`] for bad timestamps and
    /// any storage error from [`MapStore::bulk_upsert`]. Kinds written
    /// before a storage failure stay written.
    pub async fn parse_map_at(
        &self,
        snapshot: &MapSnapshot,
        step: &ScanStep,
        now: DateTime<Utc>,
    ) -> Result<IngestSummary, ScannerError> {
        let records = self.extract(snapshot, step)?;
        let mut summary = IngestSummary::default();

        if !records.sightings.is_empty() {
            tracing::info!(count = records.sightings.len(), "upserting sightings");
            summary.sightings = self.store.bulk_upsert(&records.sightings).await?;
        }
        if !records.points_of_interest.is_empty() {
            tracing::info!(
                count = records.points_of_interest.len(),
                "upserting points of interest"
            );
            summary.points_of_interest =
                self.store.bulk_upsert(&records.points_of_interest).await?;
        }
        if !records.team_structures.is_empty() {
            tracing::info!(
                count = records.team_structures.len(),
                "upserting team structures"
            );
            summary.team_structures = self.store.bulk_upsert(&records.team_structures).await?;
        }

        let (lat, lng) = step.step_location;
        let mark = CoverageMark::at(lat, lng, now);
        summary.scanned_id = mark.scanned_id.clone();
        self.store.bulk_upsert(&[mark]).await?;

        Ok(summary)
    }

    /// Parses a raw JSON snapshot and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::MalformedSnapshot`] if `raw` does not have
    /// the snapshot shape, otherwise as [`IngestService::parse_map`].
    pub async fn parse_map_json(
        &self,
        raw: serde_json::Value,
        step: &ScanStep,
    ) -> Result<IngestSummary, ScannerError> {
        let snapshot: MapSnapshot = serde_json::from_value(raw)?;
        self.parse_map(&snapshot, step).await
    }
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>, ScannerError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| ScannerError::MalformedSnapshot(format!("timestamp out of range: {ms}")))
}

fn sighting_from(wild: &WildPokemon) -> Result<Sighting, ScannerError> {
    let hidden_at = wild
        .last_modified_timestamp_ms
        .checked_add(wild.time_till_hidden_ms)
        .ok_or_else(|| ScannerError::MalformedSnapshot("disappear time overflows".to_string()))?;
    Ok(Sighting {
        encounter_id: wild.encounter_id,
        spawnpoint_id: wild.spawnpoint_id.clone(),
        pokemon_id: wild.pokemon_data.pokemon_id,
        latitude: wild.latitude,
        longitude: wild.longitude,
        disappear_time: millis_to_utc(hidden_at)?,
    })
}

fn point_of_interest_from(fort: &Fort) -> Result<PointOfInterest, ScannerError> {
    let (lure_expiration, active_pokemon_id) = match &fort.lure_info {
        Some(lure) => (
            Some(millis_to_utc(lure.lure_expires_timestamp_ms)?),
            Some(lure.active_pokemon_id),
        ),
        None => (None, None),
    };
    Ok(PointOfInterest {
        pokestop_id: fort.id.clone(),
        enabled: fort.enabled,
        latitude: fort.latitude,
        longitude: fort.longitude,
        last_modified: millis_to_utc(fort.last_modified_timestamp_ms)?,
        lure_expiration,
        active_pokemon_id,
    })
}

fn team_structure_from(fort: &Fort) -> Result<TeamStructure, ScannerError> {
    Ok(TeamStructure {
        gym_id: fort.id.clone(),
        team_id: fort.owned_by_team.unwrap_or(0),
        guard_pokemon_id: fort.guard_pokemon_id.unwrap_or(0),
        gym_points: fort.gym_points.unwrap_or(0),
        enabled: fort.enabled,
        latitude: fort.latitude,
        longitude: fort.longitude,
        last_modified: millis_to_utc(fort.last_modified_timestamp_ms)?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{BoundingBox, EncounterId};
    use crate::persistence::store::tests::memory_store;

    const SOON_MS: i64 = 4_000_000_000_000;

    fn snapshot(value: serde_json::Value) -> MapSnapshot {
        let Ok(snapshot) = serde_json::from_value(value) else {
            panic!("fixture is not a valid snapshot");
        };
        snapshot
    }

    fn wild(encounter_id: u64, species: i64, lat: f64) -> serde_json::Value {
        json!({
            "encounter_id": encounter_id,
            "pokemon_data": { "pokemon_id": species },
            "spawnpoint_id": format!("sp{encounter_id}"),
            "latitude": lat,
            "longitude": 10.0,
            "last_modified_timestamp_ms": SOON_MS,
            "time_till_hidden_ms": 900_000
        })
    }

    fn stop(id: &str, lured: bool) -> serde_json::Value {
        let mut fort = json!({
            "id": id,
            "type": 1,
            "enabled": true,
            "latitude": 1.0,
            "longitude": 2.0,
            "last_modified_timestamp_ms": 1_468_000_000_000_i64
        });
        if lured && let Some(obj) = fort.as_object_mut() {
            obj.insert(
                "lure_info".to_string(),
                json!({ "lure_expires_timestamp_ms": 1_468_001_800_000_i64, "active_pokemon_id": 16 }),
            );
        }
        fort
    }

    fn gym(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "enabled": true,
            "latitude": 1.5,
            "longitude": 2.5,
            "last_modified_timestamp_ms": 1_468_000_000_000_i64
        })
    }

    fn cells(wilds: Vec<serde_json::Value>, forts: Vec<serde_json::Value>) -> MapSnapshot {
        snapshot(json!({
            "responses": { "GET_MAP_OBJECTS": { "map_cells": [
                { "wild_pokemons": wilds, "forts": forts }
            ] } }
        }))
    }

    fn step(iteration_num: u64, step: u64, location: (f64, f64)) -> ScanStep {
        ScanStep {
            iteration_num,
            step,
            step_location: location,
        }
    }

    async fn service() -> IngestService {
        IngestService::new(
            memory_store().await,
            SpeciesAllowList::default(),
            IngestToggles::default(),
            50,
        )
    }

    #[tokio::test]
    async fn only_allowed_species_are_stored() {
        let svc = service().await;
        let snap = cells(vec![wild(1, 1, 5.0), wild(2, 3, 5.0)], vec![]);
        let Ok(summary) = svc.parse_map(&snap, &step(0, 1, (5.0, 10.0))).await else {
            panic!("ingest failed");
        };
        assert_eq!(summary.sightings, 1);

        let Ok(rows) = svc.store.sightings(None, &[], Utc::now()).await else {
            panic!("query failed");
        };
        let species: Vec<i64> = rows.iter().map(|r| r.pokemon_id).collect();
        assert_eq!(species, vec![3]);
    }

    #[tokio::test]
    async fn disappear_time_adds_time_till_hidden() {
        let svc = service().await;
        let snap = cells(vec![wild(7, 3, 5.0)], vec![]);
        let Ok(records) = svc.extract(&snap, &step(0, 1, (0.0, 0.0))) else {
            panic!("extract failed");
        };
        let Some(sighting) = records.sightings.first() else {
            panic!("expected a sighting");
        };
        assert_eq!(sighting.disappear_time.timestamp_millis(), SOON_MS + 900_000);
        assert_eq!(sighting.encounter_id, EncounterId::new(7));
    }

    #[tokio::test]
    async fn warmup_gate_suppresses_forts() {
        let svc = service().await;
        let snap = cells(vec![], vec![stop("s1", false), gym("g1")]);
        let Ok(summary) = svc.parse_map(&snap, &step(0, 10, (1.0, 2.0))).await else {
            panic!("ingest failed");
        };
        assert_eq!(summary.points_of_interest, 0);
        assert_eq!(summary.team_structures, 0);

        let Ok(stops) = svc.store.points_of_interest(None).await else {
            panic!("query failed");
        };
        let Ok(gyms) = svc.store.team_structures(None).await else {
            panic!("query failed");
        };
        assert!(stops.is_empty());
        assert!(gyms.is_empty());
    }

    #[tokio::test]
    async fn warmup_gate_opens_after_threshold_or_first_pass() {
        let svc = service().await;
        assert!(!svc.forts_trusted(&step(0, 50, (0.0, 0.0))));
        assert!(svc.forts_trusted(&step(0, 51, (0.0, 0.0))));
        assert!(svc.forts_trusted(&step(1, 0, (0.0, 0.0))));
    }

    #[tokio::test]
    async fn forts_split_into_stops_and_gyms() {
        let svc = service().await;
        let snap = cells(vec![], vec![stop("s1", true), stop("s2", false), gym("g1")]);
        let Ok(summary) = svc.parse_map(&snap, &step(1, 0, (1.0, 2.0))).await else {
            panic!("ingest failed");
        };
        assert_eq!(summary.points_of_interest, 2);
        assert_eq!(summary.team_structures, 1);

        let Ok(stops) = svc.store.points_of_interest(None).await else {
            panic!("query failed");
        };
        let Some(lured) = stops.iter().find(|s| s.pokestop_id == "s1") else {
            panic!("lured stop missing");
        };
        assert_eq!(lured.active_pokemon_id, Some(16));
        assert_eq!(
            lured.lure_expiration.map(|t| t.timestamp_millis()),
            Some(1_468_001_800_000)
        );
        let Some(plain) = stops.iter().find(|s| s.pokestop_id == "s2") else {
            panic!("plain stop missing");
        };
        assert_eq!(plain.lure_expiration, None);
        assert_eq!(plain.active_pokemon_id, None);

        let Ok(gyms) = svc.store.team_structures(None).await else {
            panic!("query failed");
        };
        let Some(g) = gyms.first() else {
            panic!("gym missing");
        };
        assert_eq!((g.team_id, g.guard_pokemon_id, g.gym_points), (0, 0, 0));
    }

    #[tokio::test]
    async fn toggles_skip_disabled_kinds() {
        let store = memory_store().await;
        let toggles = IngestToggles {
            sightings: false,
            points_of_interest: true,
            team_structures: false,
        };
        let svc = IngestService::new(store, SpeciesAllowList::default(), toggles, 50);
        let snap = cells(vec![wild(1, 3, 1.0)], vec![stop("s1", false), gym("g1")]);
        let Ok(summary) = svc.parse_map(&snap, &step(2, 0, (1.0, 2.0))).await else {
            panic!("ingest failed");
        };
        assert_eq!(summary.sightings, 0);
        assert_eq!(summary.points_of_interest, 1);
        assert_eq!(summary.team_structures, 0);
    }

    #[tokio::test]
    async fn each_step_location_gets_its_own_coverage_mark() {
        let svc = service().await;
        let snap = cells(vec![], vec![]);
        let Ok(first) = svc.parse_map(&snap, &step(0, 1, (40.0, -74.0))).await else {
            panic!("first ingest failed");
        };
        let Ok(second) = svc.parse_map(&snap, &step(0, 2, (40.001, -74.0))).await else {
            panic!("second ingest failed");
        };
        assert_ne!(first.scanned_id, second.scanned_id);

        let bbox = BoundingBox::new(39.0, -75.0, 41.0, -73.0);
        let since = Utc::now() - chrono::Duration::minutes(15);
        let Ok(marks) = svc.store.coverage_since(bbox, since).await else {
            panic!("query failed");
        };
        assert_eq!(marks.len(), 2);
    }

    #[tokio::test]
    async fn parsing_twice_is_idempotent() {
        let svc = service().await;
        let snap = cells(
            vec![wild(1, 3, 1.0), wild(2, 5, 1.2)],
            vec![stop("s1", true), gym("g1")],
        );
        let now = Utc::now();
        let at = step(1, 0, (1.0, 2.0));
        let Ok(_) = svc.parse_map_at(&snap, &at, now).await else {
            panic!("first ingest failed");
        };
        let Ok(first_sightings) = svc.store.sightings(None, &[], now).await else {
            panic!("query failed");
        };
        let Ok(first_stops) = svc.store.points_of_interest(None).await else {
            panic!("query failed");
        };
        let Ok(_) = svc.parse_map_at(&snap, &at, now).await else {
            panic!("second ingest failed");
        };
        let Ok(second_sightings) = svc.store.sightings(None, &[], now).await else {
            panic!("query failed");
        };
        let Ok(second_stops) = svc.store.points_of_interest(None).await else {
            panic!("query failed");
        };
        assert_eq!(first_sightings, second_sightings);
        assert_eq!(first_stops, second_stops);
        assert_eq!(second_sightings.len(), 2);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_without_writes() {
        let svc = service().await;
        let raw = json!({ "responses": { "GET_MAP_OBJECTS": {} } });
        let result = svc.parse_map_json(raw, &step(0, 1, (1.0, 2.0))).await;
        assert!(matches!(result, Err(ScannerError::MalformedSnapshot(_))));

        let bbox = BoundingBox::new(0.0, 0.0, 3.0, 3.0);
        let since = Utc::now() - chrono::Duration::minutes(15);
        let Ok(marks) = svc.store.coverage_since(bbox, since).await else {
            panic!("query failed");
        };
        assert!(marks.is_empty());
    }

    #[tokio::test]
    async fn missing_wild_field_is_malformed() {
        let svc = service().await;
        let raw = json!({ "responses": { "GET_MAP_OBJECTS": { "map_cells": [
            { "wild_pokemons": [ { "encounter_id": 1 } ] }
        ] } } });
        let result = svc.parse_map_json(raw, &step(0, 1, (1.0, 2.0))).await;
        assert!(matches!(result, Err(ScannerError::MalformedSnapshot(_))));
    }
}
