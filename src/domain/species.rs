//! Species catalog and the storage allow-list.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Display names indexed by `species_id - 1`.
const SPECIES_NAMES: [&str; 151] = [
    "Bulbasaur", "Ivysaur", "Venusaur", "Charmander", "Charmeleon", "Charizard",
    "Squirtle", "Wartortle", "Blastoise", "Caterpie", "Metapod", "Butterfree",
    "Weedle", "Kakuna", "Beedrill", "Pidgey", "Pidgeotto", "Pidgeot",
    "Rattata", "Raticate", "Spearow", "Fearow", "Ekans", "Arbok",
    "Pikachu", "Raichu", "Sandshrew", "Sandslash", "Nidoran♀", "Nidorina",
    "Nidoqueen", "Nidoran♂", "Nidorino", "Nidoking", "Clefairy", "Clefable",
    "Vulpix", "Ninetales", "Jigglypuff", "Wigglytuff", "Zubat", "Golbat",
    "Oddish", "Gloom", "Vileplume", "Paras", "Parasect", "Venonat",
    "Venomoth", "Diglett", "Dugtrio", "Meowth", "Persian", "Psyduck",
    "Golduck", "Mankey", "Primeape", "Growlithe", "Arcanine", "Poliwag",
    "Poliwhirl", "Poliwrath", "Abra", "Kadabra", "Alakazam", "Machop",
    "Machoke", "Machamp", "Bellsprout", "Weepinbell", "Victreebel", "Tentacool",
    "Tentacruel", "Geodude", "Graveler", "Golem", "Ponyta", "Rapidash",
    "Slowpoke", "Slowbro", "Magnemite", "Magneton", "Farfetch'd", "Doduo",
    "Dodrio", "Seel", "Dewgong", "Grimer", "Muk", "Shellder",
    "Cloyster", "Gastly", "Haunter", "Gengar", "Onix", "Drowzee",
    "Hypno", "Krabby", "Kingler", "Voltorb", "Electrode", "Exeggcute",
    "Exeggutor", "Cubone", "Marowak", "Hitmonlee", "Hitmonchan", "Lickitung",
    "Koffing", "Weezing", "Rhyhorn", "Rhydon", "Chansey", "Tangela",
    "Kangaskhan", "Horsea", "Seadra", "Goldeen", "Seaking", "Staryu",
    "Starmie", "Mr. Mime", "Scyther", "Jynx", "Electabuzz", "Magmar",
    "Pinsir", "Tauros", "Magikarp", "Gyarados", "Lapras", "Ditto",
    "Eevee", "Vaporeon", "Jolteon", "Flareon", "Porygon", "Omanyte",
    "Omastar", "Kabuto", "Kabutops", "Aerodactyl", "Snorlax", "Articuno",
    "Zapdos", "Moltres", "Dratini", "Dragonair", "Dragonite", "Mewtwo",
    "Mew",
];

/// Species stored when `SPECIES_ALLOW_LIST` is not set.
const DEFAULT_ALLOWED: [i64; 68] = [
    3, 5, 6, 8, 9, 15, 28, 30, 31, 33, 34, 35, 36, 38, 40, 44, 45, 53, 57, 62, 65, 67, 68, 70,
    71, 75, 76, 80, 82, 83, 85, 87, 88, 89, 91, 93, 94, 95, 97, 101, 103, 105, 106, 107, 108,
    110, 112, 113, 114, 115, 117, 119, 121, 122, 124, 125, 127, 130, 131, 132, 137, 139, 141,
    142, 144, 145, 146, 148,
];

/// Returns the display name for a species id, or `"unknown"`.
#[must_use]
pub fn species_name(species_id: i64) -> &'static str {
    usize::try_from(species_id)
        .ok()
        .and_then(|id| id.checked_sub(1))
        .and_then(|idx| SPECIES_NAMES.get(idx))
        .copied()
        .unwrap_or("unknown")
}

/// Set of species ids eligible for storage.
///
/// Sightings of any other species are dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesAllowList(BTreeSet<i64>);

impl SpeciesAllowList {
    /// Builds an allow-list from the given ids.
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Returns `true` if sightings of `species_id` may be stored.
    #[must_use]
    pub fn allows(&self, species_id: i64) -> bool {
        self.0.contains(&species_id)
    }

    /// Number of allowed species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SpeciesAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED)
    }
}

/// Error returned when an allow-list string has a non-numeric entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAllowListError(String);

impl fmt::Display for ParseAllowListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid species id {:?}", self.0)
    }
}

impl std::error::Error for ParseAllowListError {}

impl FromStr for SpeciesAllowList {
    type Err = ParseAllowListError;

    /// Parses a comma-separated id list such as `"3, 5,6"`. Blank entries
    /// are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| ParseAllowListError(part.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_first_and_last_ids() {
        assert_eq!(species_name(1), "Bulbasaur");
        assert_eq!(species_name(25), "Pikachu");
        assert_eq!(species_name(151), "Mew");
    }

    #[test]
    fn out_of_range_ids_are_unknown() {
        assert_eq!(species_name(0), "unknown");
        assert_eq!(species_name(152), "unknown");
        assert_eq!(species_name(-4), "unknown");
    }

    #[test]
    fn default_list_excludes_common_species() {
        let list = SpeciesAllowList::default();
        assert_eq!(list.len(), 68);
        assert!(!list.allows(1));
        assert!(!list.allows(16));
        assert!(list.allows(3));
        assert!(list.allows(148));
    }

    #[test]
    fn parses_comma_separated_ids() {
        let Ok(list) = "3, 5,,6 ".parse::<SpeciesAllowList>() else {
            panic!("valid list rejected");
        };
        assert_eq!(list, SpeciesAllowList::new([3, 5, 6]));
    }

    #[test]
    fn rejects_non_numeric_entries() {
        let Err(err) = "3,five".parse::<SpeciesAllowList>() else {
            panic!("invalid list accepted");
        };
        assert!(err.to_string().contains("five"));
    }
}
