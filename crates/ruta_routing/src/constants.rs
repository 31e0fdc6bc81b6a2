pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Coordinates are quantized to 1e-7 degrees (about 1 cm) when used as lookup keys.
pub(crate) const COORD_SCALE_FACTOR: f64 = 10_000_000.0;
