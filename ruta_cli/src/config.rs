use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use ruta_distance_providers::distance_provider::OsrmProfile;
use ruta_navigation::session::TrackerParams;
use ruta_routing::import::ImportParams;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Content of the `--config` file, every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RutaConfig {
    pub import: ImportParams,
    pub tracker: TrackerParams,
    pub osrm_profile: OsrmProfile,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<RutaConfig> {
    let Some(path) = path else {
        return Ok(RutaConfig::default());
    };

    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use ruta_routing::{import::RouteKind, meters::Meters};

    use super::*;

    #[test]
    fn test_partial_config() {
        let config: RutaConfig = serde_json::from_str(
            r#"{
                "import": { "kind": "tour", "graph": { "proximity_threshold": 25.0 } },
                "tracker": { "deviation_threshold": 80.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.import.kind, RouteKind::Tour);
        assert_eq!(config.import.graph.proximity_threshold, Meters::new(25.0));
        assert_eq!(config.tracker.deviation_threshold, Meters::new(80.0));
        assert_eq!(config.tracker.deviation_updates, 3);
        assert_eq!(config.osrm_profile, OsrmProfile::Driving);
    }
}
