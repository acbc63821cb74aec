//! Type-safe encounter identifier.
//!
//! [`EncounterId`] wraps the 64-bit unsigned identifier the game API assigns
//! to each wild creature instance. It is stored losslessly in a signed
//! 64-bit column and serialized to JSON as a decimal string so clients
//! without 64-bit integers keep full precision.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Identifier of one wild creature instance.
///
/// Primary key of the sightings table. Re-observing the same encounter
/// overwrites the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String, example = "10283749281712638471")]
pub struct EncounterId(u64);

impl EncounterId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the value written to the storage column.
    ///
    /// The bit pattern is preserved; identifiers above `i64::MAX` come out
    /// negative and map back through [`EncounterId::from`].
    #[must_use]
    pub const fn to_storage(self) -> i64 {
        i64::from_ne_bytes(self.0.to_ne_bytes())
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EncounterId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<i64> for EncounterId {
    fn from(stored: i64) -> Self {
        Self(u64::from_ne_bytes(stored.to_ne_bytes()))
    }
}

impl Serialize for EncounterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EncounterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map(Self).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn storage_round_trip_above_signed_range() {
        let id = EncounterId::new(u64::MAX - 3);
        let stored = id.to_storage();
        assert!(stored < 0);
        assert_eq!(EncounterId::from(stored), id);
    }

    #[test]
    fn storage_is_identity_in_signed_range() {
        let id = EncounterId::new(42);
        assert_eq!(id.to_storage(), 42);
    }

    #[test]
    fn serializes_as_decimal_string() {
        let id = EncounterId::new(10_283_749_281_712_638_471);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"10283749281712638471\"");
    }

    #[test]
    fn deserializes_from_number_or_string() {
        let Ok(from_number) = serde_json::from_str::<EncounterId>("18446744073709551615") else {
            panic!("number form rejected");
        };
        let Ok(from_text) = serde_json::from_str::<EncounterId>("\"18446744073709551615\"") else {
            panic!("string form rejected");
        };
        assert_eq!(from_number, from_text);
        assert_eq!(from_number.get(), u64::MAX);
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(serde_json::from_str::<EncounterId>("\"abc\"").is_err());
    }
}
