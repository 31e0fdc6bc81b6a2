use std::ops::Range;

use serde::Deserialize;
use tracing::debug;

use crate::{
    distance_provider::OsrmProfile, distance_table::DistanceTable, provider_error::ProviderError,
};

/// Answer of the OSRM `table` service. Unroutable pairs are `null`.
#[derive(Deserialize)]
struct TableResponse {
    code: String,
    message: Option<String>,

    /// Seconds
    durations: Option<Vec<Vec<Option<f64>>>>,

    /// Meters
    distances: Option<Vec<Vec<Option<f64>>>>,
}

fn flatten(rows: Vec<Vec<Option<f64>>>, expected: usize) -> Result<Vec<f64>, ProviderError> {
    let values = rows
        .into_iter()
        .flatten()
        .map(|value| value.unwrap_or(DistanceTable::UNREACHABLE))
        .collect::<Vec<_>>();

    if values.len() != expected {
        return Err(ProviderError::TableSize {
            expected,
            actual: values.len(),
        });
    }

    Ok(values)
}

fn table_from_response(response: TableResponse, size: usize) -> Result<DistanceTable, ProviderError> {
    block_from_response(response, size, size)
}

/// Row-major `rows x columns` table from a response.
fn block_from_response(
    response: TableResponse,
    rows: usize,
    columns: usize,
) -> Result<DistanceTable, ProviderError> {
    if response.code != "Ok" {
        return Err(ProviderError::Osrm {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let expected = rows * columns;
    Ok(DistanceTable {
        distances: flatten(response.distances.unwrap_or_default(), expected)?,
        times: flatten(response.durations.unwrap_or_default(), expected)?,
    })
}

/// Largest number of coordinates sent in one request, the default `--max-table-size` of
/// osrm-routed.
pub const MAX_TABLE_COORDINATES: usize = 100;

/// Part of the full table fetched by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableBlock {
    sources: Range<usize>,
    destinations: Range<usize>,
}

impl TableBlock {
    /// Indices of the points sent with the request, sources first.
    fn coordinates(&self) -> Vec<usize> {
        if self.sources == self.destinations {
            return self.sources.clone().collect();
        }
        self.sources.clone().chain(self.destinations.clone()).collect()
    }

    /// Values of the `sources` and `destinations` query parameters, `None` when the block
    /// is the whole table.
    fn query(&self, size: usize) -> Option<[(&'static str, String); 2]> {
        if self.sources == (0..size) && self.destinations == (0..size) {
            return None;
        }

        let sources = self.sources.len();
        let destinations = if self.sources == self.destinations {
            0..sources
        } else {
            sources..sources + self.destinations.len()
        };

        Some([
            ("sources", join_indices(0..sources)),
            ("destinations", join_indices(destinations)),
        ])
    }

    /// Copies the `sources x destinations` answer into the full `size x size` table.
    fn fill(&self, block: &DistanceTable, table: &mut DistanceTable, size: usize) {
        let columns = self.destinations.len();

        for (row, from) in self.sources.clone().enumerate() {
            let start = from * size + self.destinations.start;
            let block_row = row * columns..(row + 1) * columns;

            table.distances[start..start + columns]
                .copy_from_slice(&block.distances[block_row.clone()]);
            table.times[start..start + columns].copy_from_slice(&block.times[block_row]);
        }
    }
}

fn join_indices(indices: Range<usize>) -> String {
    indices
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Splits a `size x size` table into blocks of at most `max_coordinates` points each.
fn table_blocks(size: usize, max_coordinates: usize) -> Vec<TableBlock> {
    if size <= max_coordinates {
        return vec![TableBlock {
            sources: 0..size,
            destinations: 0..size,
        }];
    }

    let chunk = (max_coordinates / 2).max(1);
    let ranges = (0..size)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(size))
        .collect::<Vec<_>>();

    ranges
        .iter()
        .flat_map(|sources| {
            ranges.iter().map(|destinations| TableBlock {
                sources: sources.clone(),
                destinations: destinations.clone(),
            })
        })
        .collect()
}

/// Builds `{url}/table/v1/{profile}/{lon},{lat};...`.
fn table_url(url: &str, profile: OsrmProfile, points: &[geo_types::Point]) -> String {
    let coordinates = points
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.x(), point.y()))
        .collect::<Vec<_>>()
        .join(";");

    format!(
        "{}/table/v1/{}/{}",
        url.trim_end_matches('/'),
        profile,
        coordinates
    )
}

pub struct OsrmTableClient {
    client: reqwest::Client,
}

impl Default for OsrmTableClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OsrmTableClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Full table between `points`, fetched in blocks of at most [`MAX_TABLE_COORDINATES`]
    /// coordinates.
    pub async fn fetch_table<P>(
        &self,
        url: &str,
        profile: OsrmProfile,
        points: &[P],
    ) -> Result<DistanceTable, ProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        let size = points.len();
        let coordinates = points
            .iter()
            .map(|p| {
                let point: geo_types::Point = p.into();
                point
            })
            .collect::<Vec<_>>();
        let blocks = table_blocks(size, MAX_TABLE_COORDINATES);

        let mut table = DistanceTable {
            distances: vec![DistanceTable::UNREACHABLE; size * size],
            times: vec![DistanceTable::UNREACHABLE; size * size],
        };

        for block in &blocks {
            let block_coordinates = block
                .coordinates()
                .into_iter()
                .map(|index| coordinates[index])
                .collect::<Vec<_>>();

            let mut request = self
                .client
                .get(table_url(url, profile, &block_coordinates))
                .query(&[("annotations", "duration,distance")]);
            if let Some(query) = block.query(size) {
                request = request.query(&query);
            }

            let response = request.send().await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api { status, message });
            }

            let table_response: TableResponse = response.json().await?;
            let answer = block_from_response(
                table_response,
                block.sources.len(),
                block.destinations.len(),
            )?;
            block.fill(&answer, &mut table, size);
        }

        debug!(points = size, requests = blocks.len(), "OSRM: Received table");

        Ok(table)
    }
}
