use std::{collections::VecDeque, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use ruta_routing::{geopoint::GeoPoint, meters::Meters, routing::OptimizedRoute};
use tracing::{debug, info, warn};

use super::{
    guidance::{Guidance, NavigationSignal, UpdateOutcome},
    position_fix::PositionFix,
    projection::{SegmentProjection, project_on_segment},
    session_id::{DriverId, SessionId},
    session_record::SessionRecord,
    session_status::{SessionStatus, StatusCell},
    tracker_error::TrackerError,
    tracker_params::TrackerParams,
};

#[derive(Debug)]
struct SharedState {
    status: StatusCell,

    /// Only locked by cancellation and by `record`
    cancel_reason: Mutex<Option<String>>,
}

/// Cancels a session from anywhere, without waiting for an update in flight.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    session_id: SessionId,
    shared: Arc<SharedState>,
}

impl CancelHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status.load()
    }

    /// Cancels an `InProgress` session. Any other status is left untouched and returned.
    pub fn cancel(&self, reason: Option<String>) -> SessionStatus {
        let mut cancel_reason = self.shared.cancel_reason.lock();

        match self
            .shared
            .status
            .transition(SessionStatus::InProgress, SessionStatus::Cancelled)
        {
            Ok(()) => {
                *cancel_reason = reason;
                info!(session = %self.session_id, "Navigation cancelled");
                SessionStatus::Cancelled
            }
            Err(status) => status,
        }
    }
}

#[derive(Debug, Clone)]
struct RouteSegment {
    from: GeoPoint,
    to: GeoPoint,
    length: Meters,

    /// Route length before this segment
    offset: Meters,
}

fn route_segments(route: &OptimizedRoute) -> Vec<RouteSegment> {
    let mut offset = Meters::ZERO;

    (0..route.segment_count())
        .filter_map(|index| {
            let (from, to) = route.segment(index)?;
            let length = route.segment_length(index);
            let segment = RouteSegment {
                from: *from,
                to: *to,
                length,
                offset,
            };
            offset += length;
            Some(segment)
        })
        .collect()
}

/// Live progress of one traveler along an optimized route.
///
/// Every operation first reads the shared status, operations on a session that is not
/// `InProgress` change nothing and report the status instead.
#[derive(Debug)]
pub struct NavigationSession {
    id: SessionId,
    driver_id: DriverId,
    params: TrackerParams,
    shared: Arc<SharedState>,

    route: Arc<OptimizedRoute>,
    segments: Vec<RouteSegment>,
    segment_index: usize,

    started_at: Option<Timestamp>,
    last_position: Option<PositionFix>,

    distance_traveled: Meters,

    /// Furthest route progress reached so far
    progress_mark: Meters,

    off_route_updates: usize,
    deviation_flag: bool,
    deviation_events: usize,
    arrived: bool,

    /// Recent speeds in meters per second
    speeds: VecDeque<f64>,

    guidance: Option<Guidance>,
    breadcrumb: Vec<GeoPoint>,
    notes: Vec<String>,
}

impl NavigationSession {
    pub fn new(driver_id: DriverId, route: Arc<OptimizedRoute>, params: TrackerParams) -> Self {
        let segments = route_segments(&route);

        NavigationSession {
            id: SessionId::new_v4(),
            driver_id,
            params,
            shared: Arc::new(SharedState {
                status: StatusCell::new(SessionStatus::NotStarted),
                cancel_reason: Mutex::new(None),
            }),
            route,
            segments,
            segment_index: 0,
            started_at: None,
            last_position: None,
            distance_traveled: Meters::ZERO,
            progress_mark: Meters::ZERO,
            off_route_updates: 0,
            deviation_flag: false,
            deviation_events: 0,
            arrived: false,
            speeds: VecDeque::with_capacity(params.speed_window),
            guidance: None,
            breadcrumb: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn driver_id(&self) -> &DriverId {
        &self.driver_id
    }

    pub fn route(&self) -> &Arc<OptimizedRoute> {
        &self.route
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status.load()
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn distance_traveled(&self) -> Meters {
        self.distance_traveled
    }

    pub fn deviation_flag(&self) -> bool {
        self.deviation_flag
    }

    pub fn deviation_events(&self) -> usize {
        self.deviation_events
    }

    pub fn last_position(&self) -> Option<&PositionFix> {
        self.last_position.as_ref()
    }

    /// Guidance computed by the last applied update.
    pub fn guidance(&self) -> Option<&Guidance> {
        self.guidance.as_ref()
    }

    pub fn breadcrumb(&self) -> &[GeoPoint] {
        &self.breadcrumb
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            session_id: self.id,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn start(&mut self, origin: PositionFix) -> Result<Guidance, TrackerError> {
        let status = self.status();
        if status != SessionStatus::NotStarted {
            return Err(TrackerError::AlreadyStarted { status });
        }

        if self.segments.is_empty() {
            return Err(TrackerError::EmptyRoute);
        }

        let point = origin.try_point()?;

        self.shared
            .status
            .transition(SessionStatus::NotStarted, SessionStatus::InProgress)
            .map_err(|status| TrackerError::AlreadyStarted { status })?;

        let projection = self.locate(&point);

        self.started_at = Some(origin.timestamp);
        self.last_position = Some(origin);
        self.progress_mark = self.progress(&projection);
        self.breadcrumb.push(point);

        let guidance = self.build_guidance(&point, &projection);
        self.guidance = Some(guidance.clone());

        info!(
            session = %self.id,
            driver = %self.driver_id,
            segments = self.segments.len(),
            "Navigation started"
        );

        Ok(guidance)
    }

    pub fn update(&mut self, fix: PositionFix) -> Result<UpdateOutcome, TrackerError> {
        let status = self.status();
        if status != SessionStatus::InProgress {
            return Ok(UpdateOutcome::inactive(status));
        }

        let Some(last) = self.last_position else {
            return Ok(UpdateOutcome::inactive(status));
        };

        let point = fix.try_point().inspect_err(|_| {
            warn!(
                session = %self.id,
                lat = fix.lat,
                lon = fix.lon,
                "Ignoring position update with invalid coordinates"
            );
        })?;

        if fix.timestamp <= last.timestamp {
            warn!(
                session = %self.id,
                last = %last.timestamp,
                received = %fix.timestamp,
                "Ignoring out of order position update"
            );
            return Err(TrackerError::OutOfOrderUpdate {
                last: last.timestamp,
                received: fix.timestamp,
            });
        }

        if fix.timestamp.duration_since(last.timestamp) > self.params.update_timeout {
            return Ok(self.abort());
        }

        self.record_speed(&last, &fix);

        let projection = self.locate(&point);
        let mut signals = Vec::new();

        if projection.deviation > self.params.deviation_threshold {
            self.off_route_updates += 1;

            if !self.deviation_flag && self.off_route_updates >= self.params.deviation_updates {
                self.deviation_flag = true;
                self.deviation_events += 1;

                info!(
                    session = %self.id,
                    deviation = %projection.deviation,
                    "Traveler left the route"
                );
                signals.push(NavigationSignal::Recalculate { origin: point });
            }
        } else {
            self.off_route_updates = 0;
            self.deviation_flag = false;
        }

        let progress = self.progress(&projection);
        if progress > self.progress_mark {
            self.distance_traveled += progress - self.progress_mark;
            self.progress_mark = progress;
        }

        self.last_position = Some(fix);
        self.breadcrumb.push(point);

        if !self.arrived && self.is_at_destination(&point) {
            self.arrived = true;
            signals.push(NavigationSignal::Arrived);
        }

        let guidance = self.build_guidance(&point, &projection);
        self.guidance = Some(guidance.clone());

        debug!(
            session = %self.id,
            segment = self.segment_index,
            deviation = %projection.deviation,
            traveled = %self.distance_traveled,
            "Applied position update"
        );

        Ok(UpdateOutcome {
            status: self.status(),
            guidance: Some(guidance),
            signals,
        })
    }

    /// Marks the route as done, only possible at the destination.
    pub fn complete(&mut self, notes: Option<String>) -> Result<SessionStatus, TrackerError> {
        let status = self.status();
        if status != SessionStatus::InProgress {
            return Ok(status);
        }

        let Some(last) = self.last_position else {
            return Ok(status);
        };

        let point = last.point();
        let distance_to_destination = self
            .segments
            .last()
            .map(|segment| point.haversine_distance(&segment.to))
            .unwrap_or(Meters::ZERO);

        if !self.is_at_destination(&point) {
            return Err(TrackerError::CompletionRejected {
                segment_index: self.segment_index,
                segment_count: self.segments.len(),
                distance_to_destination,
            });
        }

        match self
            .shared
            .status
            .transition(SessionStatus::InProgress, SessionStatus::Completed)
        {
            Ok(()) => {
                self.notes.extend(notes);
                info!(
                    session = %self.id,
                    traveled = %self.distance_traveled,
                    "Navigation completed"
                );
                Ok(SessionStatus::Completed)
            }
            Err(status) => Ok(status),
        }
    }

    pub fn cancel(&self, reason: Option<String>) -> SessionStatus {
        self.cancel_handle().cancel(reason)
    }

    /// Aborts the session when no update arrived within the timeout before `now`.
    pub fn expire(&mut self, now: Timestamp) -> SessionStatus {
        let status = self.status();
        if status != SessionStatus::InProgress {
            return status;
        }

        match self.last_position {
            Some(last) if now.duration_since(last.timestamp) > self.params.update_timeout => {
                self.abort().status
            }
            _ => status,
        }
    }

    /// Follows `route` from now on, typically after a recalculation. Distance traveled is
    /// kept, deviation state and progress along the route start over.
    pub fn reroute(
        &mut self,
        route: Arc<OptimizedRoute>,
    ) -> Result<Option<Guidance>, TrackerError> {
        if self.status() != SessionStatus::InProgress {
            return Ok(None);
        }

        let segments = route_segments(&route);
        if segments.is_empty() {
            return Err(TrackerError::EmptyRoute);
        }

        self.route = route;
        self.segments = segments;
        self.segment_index = 0;
        self.off_route_updates = 0;
        self.deviation_flag = false;
        self.arrived = false;

        let Some(last) = self.last_position else {
            return Ok(None);
        };

        let point = last.point();
        let projection = self.locate(&point);
        self.progress_mark = self.progress(&projection);

        let guidance = self.build_guidance(&point, &projection);
        self.guidance = Some(guidance.clone());

        info!(session = %self.id, segments = self.segments.len(), "Route replaced");

        Ok(Some(guidance))
    }

    /// Snapshot for metrics, only available once the session is over.
    pub fn record(&self) -> Option<SessionRecord> {
        let status = self.status();
        if !status.is_terminal() {
            return None;
        }

        let started_at = self.started_at?;
        let ended_at = self
            .last_position
            .map(|fix| fix.timestamp)
            .unwrap_or(started_at);

        let mut notes = self.notes.clone();
        if status == SessionStatus::Cancelled
            && let Some(reason) = self.shared.cancel_reason.lock().clone()
        {
            notes.push(reason);
        }

        Some(SessionRecord {
            session_id: self.id,
            driver_id: self.driver_id.clone(),
            status,
            started_at,
            ended_at,
            distance_traveled: self.distance_traveled,
            route_distance: self.route.total_distance(),
            deviation_events: self.deviation_events,
            notes,
            breadcrumb: self.breadcrumb.clone(),
        })
    }

    fn abort(&mut self) -> UpdateOutcome {
        match self
            .shared
            .status
            .transition(SessionStatus::InProgress, SessionStatus::Aborted)
        {
            Ok(()) => {
                warn!(
                    session = %self.id,
                    timeout = ?self.params.update_timeout,
                    "No position update within timeout, navigation aborted"
                );

                UpdateOutcome {
                    status: SessionStatus::Aborted,
                    guidance: None,
                    signals: vec![NavigationSignal::SignalLost],
                }
            }
            Err(status) => UpdateOutcome::inactive(status),
        }
    }

    fn project(&self, point: &GeoPoint) -> SegmentProjection {
        let segment = &self.segments[self.segment_index];
        project_on_segment(point, &segment.from, &segment.to, segment.length)
    }

    /// Projects `point` on the current segment, moving to the next segments while the
    /// point is within arrival tolerance of their end. The segment index never decreases.
    fn locate(&mut self, point: &GeoPoint) -> SegmentProjection {
        loop {
            let projection = self.project(point);
            let segment = &self.segments[self.segment_index];

            let has_next = self.segment_index + 1 < self.segments.len();
            if has_next && projection.along_track >= segment.length - self.params.arrival_tolerance
            {
                self.segment_index += 1;
                continue;
            }

            return projection;
        }
    }

    fn progress(&self, projection: &SegmentProjection) -> Meters {
        self.segments[self.segment_index].offset + projection.along_track
    }

    fn route_length(&self) -> Meters {
        self.segments
            .last()
            .map(|segment| segment.offset + segment.length)
            .unwrap_or(Meters::ZERO)
    }

    fn is_at_destination(&self, point: &GeoPoint) -> bool {
        let Some(last_segment) = self.segments.last() else {
            return false;
        };

        self.segment_index + 1 == self.segments.len()
            && point.haversine_distance(&last_segment.to) <= self.params.arrival_tolerance
    }

    fn record_speed(&mut self, last: &PositionFix, fix: &PositionFix) {
        let speed = fix.reported_speed().unwrap_or_else(|| {
            let elapsed = fix.timestamp.duration_since(last.timestamp).as_secs_f64();
            let distance = last.point().haversine_distance(&fix.point());
            if elapsed > 0.0 {
                distance.value() / elapsed
            } else {
                0.0
            }
        });

        self.speeds.push_back(speed);
        while self.speeds.len() > self.params.speed_window.max(1) {
            self.speeds.pop_front();
        }
    }

    /// Rolling average in meters per second, `None` until the traveler moved.
    fn average_speed(&self) -> Option<f64> {
        if self.speeds.is_empty() {
            return None;
        }

        let average = self.speeds.iter().sum::<f64>() / self.speeds.len() as f64;
        (average > 0.0).then_some(average)
    }

    fn build_guidance(&self, point: &GeoPoint, projection: &SegmentProjection) -> Guidance {
        let segment = &self.segments[self.segment_index];
        let distance_remaining = (self.route_length() - self.progress(projection)).clamp_non_negative();

        let estimated_time_remaining = self.average_speed().and_then(|speed| {
            SignedDuration::try_from_secs_f64(distance_remaining.value() / speed).ok()
        });

        Guidance {
            segment_index: self.segment_index,
            distance_to_next_waypoint: point.haversine_distance(&segment.to),
            bearing_to_next_waypoint: point.bearing(&segment.to),
            estimated_time_remaining,
            distance_remaining,
            deviation: projection.deviation,
            deviation_flag: self.deviation_flag,
        }
    }
}
