use std::{
    hash::{Hash, Hasher},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use fxhash::FxHasher64;
use tracing::debug;

use crate::{
    distance_provider::DistanceProvider, distance_table::DistanceTable,
    provider_error::ProviderError,
};

pub const CACHE_FOLDER_ENV_VAR: &str = "RUTA_CACHE_FOLDER";

fn hash_points<H, P>(points: &[P], hasher: &mut H)
where
    H: Hasher,
    for<'a> &'a P: Into<geo_types::Point>,
{
    points.len().hash(hasher);
    for point in points {
        let point = point.into();
        hasher.write_u64(point.x().to_bits());
        hasher.write_u64(point.y().to_bits());
    }
}

fn get_filename<P>(points: &[P], provider: &DistanceProvider) -> String
where
    for<'a> &'a P: Into<geo_types::Point>,
{
    let mut hasher = FxHasher64::default();

    hash_points(points, &mut hasher);
    provider.hash(&mut hasher);

    let hash = hasher.finish();
    format!("{:016x}.json", hash)
}

/// Distance tables stored as JSON files, one per set of points and provider.
#[derive(Debug, Clone)]
pub struct FileDistanceCache {
    folder: PathBuf,
}

impl FileDistanceCache {
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let folder = folder.into();

        if !folder.is_dir() {
            return Err(ProviderError::NotADirectory(
                folder.display().to_string(),
            ));
        }

        Ok(FileDistanceCache { folder })
    }

    /// Cache in the folder named by `RUTA_CACHE_FOLDER`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let folder = std::env::var(CACHE_FOLDER_ENV_VAR)
            .map_err(|_| ProviderError::CacheNotConfigured(CACHE_FOLDER_ENV_VAR))?;

        Self::new(folder)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn store<P>(
        &self,
        points: &[P],
        provider: &DistanceProvider,
        table: &DistanceTable,
    ) -> Result<(), ProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        let filename = get_filename(points, provider);

        let file = std::fs::File::create(self.folder.join(&filename))?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        serde_json::to_writer(&mut writer, table)?;
        writer.flush()?;

        debug!(%filename, "Cached distance table");

        Ok(())
    }

    pub fn load<P>(
        &self,
        points: &[P],
        provider: &DistanceProvider,
    ) -> Result<Option<DistanceTable>, ProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        let file_path = self.folder.join(get_filename(points, provider));

        if !file_path.is_file() {
            return Ok(None);
        }

        let file = std::fs::File::open(file_path)?;
        let table: DistanceTable = serde_json::from_reader(file)?;

        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use ruta_routing::geopoint::GeoPoint;

    use crate::distance_provider::OsrmProfile;

    use super::*;

    fn osrm() -> DistanceProvider {
        DistanceProvider::Osrm {
            url: String::from("http://localhost:5000"),
            profile: OsrmProfile::Driving,
        }
    }

    #[test]
    fn test_store_and_load() {
        let folder = tempfile::tempdir().unwrap();
        let cache = FileDistanceCache::new(folder.path()).unwrap();

        let points = [GeoPoint::new(48.85, 2.35), GeoPoint::new(48.86, 2.36)];
        let table = DistanceTable {
            distances: vec![0.0, 1_530.0, 1_490.0, 0.0],
            times: vec![0.0, 190.0, DistanceTable::UNREACHABLE, 0.0],
        };

        assert_eq!(cache.load(&points, &osrm()).unwrap(), None);

        cache.store(&points, &osrm(), &table).unwrap();

        assert_eq!(cache.load(&points, &osrm()).unwrap(), Some(table));
        assert_eq!(cache.load(&points[..1], &osrm()).unwrap(), None);
    }

    #[test]
    fn test_filename_depends_on_provider() {
        let points = [GeoPoint::new(48.85, 2.35)];

        assert_eq!(
            get_filename(&points, &osrm()),
            get_filename(&points, &osrm())
        );
        assert_ne!(
            get_filename(&points, &osrm()),
            get_filename(&points, &DistanceProvider::AsTheCrowFlies { speed_kmh: 40.0 })
        );
    }

    #[test]
    fn test_rejects_missing_folder() {
        let folder = tempfile::tempdir().unwrap();
        let missing = folder.path().join("missing");

        assert!(matches!(
            FileDistanceCache::new(missing),
            Err(ProviderError::NotADirectory(_))
        ));
    }
}
