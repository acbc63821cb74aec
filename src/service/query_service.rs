//! Read side: bounding-box queries with the locale projection applied.

use chrono::{DateTime, Utc};

use crate::config::ScannerConfig;
use crate::domain::{
    ActiveSighting, BoundingBox, CoordinateSystem, CoverageMark, PointOfInterest,
    TeamStructureView,
};
use crate::error::ScannerError;
use crate::persistence::MapStore;

/// Serves stored map data to readers.
///
/// Stored positions are always WGS-84. The configured [`CoordinateSystem`]
/// is applied to every returned row, never to what is stored.
#[derive(Debug, Clone)]
pub struct MapQueryService {
    store: MapStore,
    coords: CoordinateSystem,
    coverage_window: chrono::Duration,
}

impl MapQueryService {
    /// Creates a new `MapQueryService`.
    #[must_use]
    pub fn new(store: MapStore, coords: CoordinateSystem, coverage_window: chrono::Duration) -> Self {
        Self {
            store,
            coords,
            coverage_window,
        }
    }

    /// Creates a `MapQueryService` with the read settings in `config`.
    #[must_use]
    pub fn from_config(store: MapStore, config: &ScannerConfig) -> Self {
        Self::new(
            store,
            CoordinateSystem::from_china_flag(config.china_coordinates),
            config.coverage_window,
        )
    }

    /// Sightings that have not yet disappeared.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn sightings(
        &self,
        bounds: Option<BoundingBox>,
        species: &[i64],
    ) -> Result<Vec<ActiveSighting>, ScannerError> {
        self.sightings_at(bounds, species, Utc::now()).await
    }

    /// Sightings still visible at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn sightings_at(
        &self,
        bounds: Option<BoundingBox>,
        species: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveSighting>, ScannerError> {
        let mut rows: Vec<ActiveSighting> = self
            .store
            .sightings(bounds, species, now)
            .await?
            .into_iter()
            .map(ActiveSighting::from)
            .collect();
        self.coords.apply(&mut rows);
        Ok(rows)
    }

    /// Points of interest.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn points_of_interest(
        &self,
        bounds: Option<BoundingBox>,
    ) -> Result<Vec<PointOfInterest>, ScannerError> {
        let mut rows = self.store.points_of_interest(bounds).await?;
        self.coords.apply(&mut rows);
        Ok(rows)
    }

    /// Team structures, each with its controlling team.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn team_structures(
        &self,
        bounds: Option<BoundingBox>,
    ) -> Result<Vec<TeamStructureView>, ScannerError> {
        let mut rows: Vec<TeamStructureView> = self
            .store
            .team_structures(bounds)
            .await?
            .into_iter()
            .map(TeamStructureView::from)
            .collect();
        self.coords.apply(&mut rows);
        Ok(rows)
    }

    /// Coverage marks inside `bounds` scanned within the coverage window.
    ///
    /// A window reaching back past the Unix epoch covers every mark.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn recent_coverage(
        &self,
        bounds: BoundingBox,
    ) -> Result<Vec<CoverageMark>, ScannerError> {
        let floor = DateTime::<Utc>::UNIX_EPOCH;
        let since = Utc::now()
            .checked_sub_signed(self.coverage_window)
            .map_or(floor, |since| since.max(floor));
        let mut rows = self.store.coverage_since(bounds, since).await?;
        self.coords.apply(&mut rows);
        Ok(rows)
    }
}
