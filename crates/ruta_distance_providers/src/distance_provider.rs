use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distance_table::DistanceTable;

#[derive(Deserialize, Serialize, JsonSchema, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OsrmProfile {
    #[default]
    Driving,
    Cycling,
    Walking,
}

impl Display for OsrmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OsrmProfile::Driving => "driving",
                OsrmProfile::Cycling => "cycling",
                OsrmProfile::Walking => "walking",
            }
        )
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistanceProvider {
    /// Great-circle distances, times at a constant speed
    AsTheCrowFlies { speed_kmh: f64 },

    /// OSRM server exposing the `table` service, e.g. `http://localhost:5000`
    Osrm {
        url: String,
        #[serde(default)]
        profile: OsrmProfile,
    },

    /// Table computed elsewhere
    Custom { table: DistanceTable },
}

impl DistanceProvider {
    /// Tables from remote providers are worth caching.
    pub fn is_remote(&self) -> bool {
        matches!(self, DistanceProvider::Osrm { .. })
    }
}

impl std::hash::Hash for DistanceProvider {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            DistanceProvider::AsTheCrowFlies { speed_kmh } => {
                state.write_u8(0);
                state.write_u64(speed_kmh.to_bits());
            }
            DistanceProvider::Osrm { url, profile } => {
                state.write_u8(1);
                url.hash(state);
                profile.hash(state);
            }
            DistanceProvider::Custom { table } => {
                state.write_u8(2);
                table.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize() {
        let provider: DistanceProvider =
            serde_json::from_str(r#"{"type": "osrm", "url": "http://localhost:5000"}"#).unwrap();

        assert_eq!(
            provider,
            DistanceProvider::Osrm {
                url: String::from("http://localhost:5000"),
                profile: OsrmProfile::Driving
            }
        );
        assert!(provider.is_remote());
    }
}
