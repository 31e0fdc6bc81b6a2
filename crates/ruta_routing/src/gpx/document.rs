use jiff::Timestamp;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::debug;

use crate::geopoint::GeoPoint;

use super::gpx_error::GpxError;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub point: GeoPoint,
    pub name: Option<String>,
}

/// A validated GPX document borrowing the raw file bytes.
///
/// Parsing happens twice: once eagerly in [`GpxDocument::parse`] to reject malformed or
/// empty files, then lazily every time [`GpxDocument::points`] is called. Each call starts
/// over from the first byte, so the sequence can be iterated as many times as needed
/// without buffering the points.
#[derive(Debug, Clone, Copy)]
pub struct GpxDocument<'a> {
    bytes: &'a [u8],
    point_count: usize,
}

impl<'a> GpxDocument<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, GpxError> {
        let mut point_count = 0;

        for track_point in TrackPoints::new(bytes) {
            track_point?;
            point_count += 1;
        }

        if point_count == 0 {
            return Err(GpxError::EmptyTrack);
        }

        debug!(point_count, "Parsed GPX document");

        Ok(GpxDocument { bytes, point_count })
    }

    pub fn len(&self) -> usize {
        self.point_count
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Points in file order.
    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + 'a {
        self.track_points().map(|track_point| track_point.point)
    }

    /// Points in file order along with their `<name>`.
    pub fn track_points(&self) -> impl Iterator<Item = TrackPoint> + 'a {
        // The document was fully validated in `parse`, the bytes are immutable
        TrackPoints::new(self.bytes).map_while(Result::ok)
    }
}

/// Pull parser over the `<trkpt>` and `<rtept>` elements of a GPX file.
pub struct TrackPoints<'a> {
    reader: Reader<&'a [u8]>,
    seen_root: bool,

    /// Elements opened and not closed yet, point elements excluded
    depth: usize,
    root_closed: bool,
    finished: bool,
}

impl<'a> TrackPoints<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        TrackPoints {
            reader,
            seen_root: false,
            depth: 0,
            root_closed: false,
            finished: false,
        }
    }

    fn check_root(&mut self, start: &BytesStart<'_>) -> Result<(), GpxError> {
        if self.root_closed {
            return Err(GpxError::MalformedInput(format!(
                "unexpected <{}> after the </gpx> root element",
                String::from_utf8_lossy(start.local_name().as_ref())
            )));
        }

        if self.seen_root {
            return Ok(());
        }

        if start.local_name().as_ref() != b"gpx" {
            return Err(GpxError::MalformedInput(format!(
                "expected <gpx> root element, found <{}>",
                String::from_utf8_lossy(start.local_name().as_ref())
            )));
        }

        self.seen_root = true;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<TrackPoint>, GpxError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    self.check_root(&e)?;
                    if is_point_element(&e) {
                        return self.read_point(&e).map(Some);
                    }
                    self.depth += 1;
                }
                Event::Empty(e) => {
                    self.check_root(&e)?;
                    if is_point_element(&e) {
                        let point = parse_lat_lon(&e)?;
                        return Ok(Some(TrackPoint { point, name: None }));
                    }
                    if self.depth == 0 {
                        self.root_closed = true;
                    }
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        self.root_closed = true;
                    }
                }
                Event::Text(_) | Event::CData(_) if self.root_closed => {
                    return Err(GpxError::MalformedInput(String::from(
                        "unexpected text after the </gpx> root element",
                    )));
                }
                Event::Eof => {
                    if !self.seen_root {
                        return Err(GpxError::MalformedInput(String::from(
                            "missing <gpx> root element",
                        )));
                    }
                    if !self.root_closed {
                        return Err(GpxError::MalformedInput(String::from(
                            "truncated file, the <gpx> root element is not closed",
                        )));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Reads the children of a point element, the start tag has already been consumed.
    fn read_point(&mut self, start: &BytesStart<'a>) -> Result<TrackPoint, GpxError> {
        let mut point = parse_lat_lon(start)?;
        let mut name = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"ele" => {
                        let text = self.reader.read_text(e.name())?;
                        point.elevation = text.trim().parse::<f64>().ok();
                    }
                    b"time" => {
                        let text = self.reader.read_text(e.name())?;
                        point.timestamp = text.trim().parse::<Timestamp>().ok();
                    }
                    b"name" => {
                        let text = self.reader.read_text(e.name())?;
                        name = Some(text.trim().to_string());
                    }
                    _ => {
                        // Extensions and unknown children
                        self.reader.read_to_end(e.name())?;
                    }
                },
                Event::End(e) if e.name() == start.name() => break,
                Event::Eof => {
                    return Err(GpxError::MalformedInput(format!(
                        "unterminated <{}> element",
                        String::from_utf8_lossy(start.local_name().as_ref())
                    )));
                }
                _ => {}
            }
        }

        Ok(TrackPoint { point, name })
    }
}

impl Iterator for TrackPoints<'_> {
    type Item = Result<TrackPoint, GpxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next() {
            Ok(Some(point)) => Some(Ok(point)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

fn is_point_element(e: &BytesStart<'_>) -> bool {
    matches!(e.local_name().as_ref(), b"trkpt" | b"rtept")
}

fn parse_lat_lon(e: &BytesStart<'_>) -> Result<GeoPoint, GpxError> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes() {
        let attr = attr?;
        let value = std::str::from_utf8(&attr.value)
            .map_err(|error| GpxError::MalformedInput(error.to_string()))?;

        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coordinate("lat", value)?),
            b"lon" => lon = Some(parse_coordinate("lon", value)?),
            _ => {}
        }
    }

    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Err(GpxError::MalformedInput(String::from(
            "point is missing its lat or lon attribute",
        )));
    };

    GeoPoint::try_new(lat, lon).map_err(|error| GpxError::MalformedInput(error.to_string()))
}

fn parse_coordinate(attribute: &str, value: &str) -> Result<f64, GpxError> {
    value.trim().parse::<f64>().map_err(|_| {
        GpxError::MalformedInput(format!("invalid {attribute} attribute: {value:?}"))
    })
}
