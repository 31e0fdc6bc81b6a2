mod document;
mod gpx_error;

pub use document::{GpxDocument, TrackPoint, TrackPoints};
pub use gpx_error::GpxError;
