use std::path::PathBuf;

use anyhow::Context;
use clap::ValueEnum;
use ruta_distance_providers::{
    cache::FileDistanceCache,
    distance_provider::{DistanceProvider, OsrmProfile},
    distance_table_client::DistanceTableClient,
};
use ruta_routing::{
    import::{ImportParams, ImportedRoute, deduplicate_files, optimize_gpx, optimize_waypoints},
    weighting::GreatCircleDistance,
};
use tracing::{info, warn};

use crate::file_utils::{gpx_paths, read_files};

const OSRM_URL_ENV_VAR: &str = "RUTA_OSRM_URL";

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ProviderArg {
    /// Great-circle distances
    #[default]
    Crow,

    /// Road distances from the OSRM server at `RUTA_OSRM_URL`
    Osrm,
}

/// Reads the GPX inputs and optimizes a route over them.
pub async fn import_route(
    inputs: &[PathBuf],
    params: &ImportParams,
    provider: ProviderArg,
    osrm_profile: OsrmProfile,
) -> anyhow::Result<ImportedRoute> {
    let paths = gpx_paths(inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No GPX file given");
    }

    let contents = read_files(&paths)?;
    let files = contents.iter().map(Vec::as_slice).collect::<Vec<_>>();

    let imported = match provider {
        ProviderArg::Crow => optimize_gpx(&files, &GreatCircleDistance, params)
            .map_err(|error| anyhow::anyhow!("{}: {error}", error.user_message()))?,
        ProviderArg::Osrm => {
            let url = std::env::var(OSRM_URL_ENV_VAR)
                .with_context(|| format!("{OSRM_URL_ENV_VAR} must be set to use OSRM"))?;

            let waypoints = deduplicate_files(&files, &params.graph)
                .map_err(|error| anyhow::anyhow!("{}: {error}", error.user_message()))?;
            let points = waypoints.points();

            let mut client = DistanceTableClient::new();
            match FileDistanceCache::from_env() {
                Ok(cache) => client = client.with_cache(cache),
                Err(error) => warn!(%error, "Distance tables will not be cached"),
            }

            let provider = DistanceProvider::Osrm {
                url,
                profile: osrm_profile,
            };
            let table = client.fetch_table(&points, &provider).await?;
            let weighting = table.into_weighting(&points)?;

            optimize_waypoints(waypoints, &weighting, params)
                .map_err(|error| anyhow::anyhow!("{}: {error}", error.user_message()))?
        }
    };

    info!(
        files = paths.len(),
        waypoints = imported.graph.len(),
        distance = %imported.route.total_distance(),
        "Route ready"
    );

    Ok(imported)
}
