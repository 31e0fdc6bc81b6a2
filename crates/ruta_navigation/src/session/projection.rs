use ruta_routing::{geopoint::GeoPoint, meters::Meters};

/// Position of a point relative to a route segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentProjection {
    /// Distance from the segment start to the closest point
    pub along_track: Meters,

    /// Distance from the point to the closest point of the segment
    pub deviation: Meters,
}

/// Projects `point` on the segment `from -> to` in a local equirectangular frame centered
/// on `from`, which is accurate at the scale of a route segment.
pub(crate) fn project_on_segment(
    point: &GeoPoint,
    from: &GeoPoint,
    to: &GeoPoint,
    segment_length: Meters,
) -> SegmentProjection {
    let (bx, by) = to.local_offset(from);
    let (px, py) = point.local_offset(from);

    let squared_length = bx * bx + by * by;
    let fraction = if squared_length > 0.0 {
        ((px * bx + py * by) / squared_length).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let nearest = from.interpolate(to, fraction);

    SegmentProjection {
        along_track: Meters::new(fraction * segment_length.value()),
        deviation: point.haversine_distance(&nearest),
    }
}
