use ruta_navigation::{metrics::MetricsSummary, session::UpdateOutcome};
use ruta_routing::routing::OptimizedRoute;
use schemars::schema_for;
use serde_json::json;

use crate::config::RutaConfig;

pub fn generate_json_schemas() -> Result<String, serde_json::Error> {
    let config = schema_for!(RutaConfig);
    let optimized_route = schema_for!(OptimizedRoute);
    let update_outcome = schema_for!(UpdateOutcome);
    let metrics_summary = schema_for!(MetricsSummary);

    serde_json::to_string_pretty(&json!({
        "config": config,
        "optimized_route": optimized_route,
        "update_outcome": update_outcome,
        "metrics_summary": metrics_summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas() {
        let schemas: serde_json::Value =
            serde_json::from_str(&generate_json_schemas().unwrap()).unwrap();

        assert_eq!(schemas["optimized_route"]["title"], "OptimizedRoute");
        assert!(schemas["update_outcome"]["properties"]["signals"].is_object());
    }
}
