//! Domain layer: entity records, identifiers, and the pure helpers around
//! them.
//!
//! Nothing in here touches storage or the network. The snapshot shape
//! mirrors what the game API returns; the records mirror what is stored.

pub mod bounds;
pub mod encounter_id;
pub mod records;
pub mod snapshot;
pub mod species;
pub mod transform;

pub use bounds::BoundingBox;
pub use encounter_id::EncounterId;
pub use records::{
    ActiveSighting, CoverageMark, PointOfInterest, Sighting, Team, TeamStructure,
    TeamStructureView,
};
pub use snapshot::MapSnapshot;
pub use species::{SpeciesAllowList, species_name};
pub use transform::{CoordinateSystem, Located};
