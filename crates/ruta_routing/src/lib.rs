mod constants;
pub mod geopoint;
pub mod gpx;
pub mod graph;
pub mod import;
pub mod kmh;
pub mod meters;
pub mod routing;
mod utils;
pub mod weighting;

#[cfg(test)]
pub(crate) mod test_utils;
