use tracing::{debug, warn};

use crate::{
    as_the_crow_flies::as_the_crow_flies_table, cache::FileDistanceCache,
    distance_provider::DistanceProvider, distance_table::DistanceTable, osrm_api::OsrmTableClient,
    provider_error::ProviderError,
};

#[derive(Default)]
pub struct DistanceTableClient {
    osrm_client: OsrmTableClient,
    cache: Option<FileDistanceCache>,
}

impl DistanceTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote tables are read from and written to `cache`.
    pub fn with_cache(mut self, cache: FileDistanceCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn fetch_table<P>(
        &self,
        points: &[P],
        provider: &DistanceProvider,
    ) -> Result<DistanceTable, ProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        match provider {
            DistanceProvider::AsTheCrowFlies { speed_kmh } => {
                Ok(as_the_crow_flies_table(points, *speed_kmh))
            }
            DistanceProvider::Custom { table } => {
                let expected = points.len() * points.len();
                if table.distances.len() != expected {
                    return Err(ProviderError::TableSize {
                        expected,
                        actual: table.distances.len(),
                    });
                }
                Ok(table.clone())
            }
            DistanceProvider::Osrm { url, profile } => {
                if let Some(cache) = &self.cache
                    && let Some(table) = cache.load(points, provider)?
                {
                    debug!(points = points.len(), "Using cached distance table");
                    return Ok(table);
                }

                let table = self.osrm_client.fetch_table(url, *profile, points).await?;

                if let Some(cache) = &self.cache
                    && let Err(error) = cache.store(points, provider, &table)
                {
                    warn!(%error, "Failed to cache distance table");
                }

                Ok(table)
            }
        }
    }
}
