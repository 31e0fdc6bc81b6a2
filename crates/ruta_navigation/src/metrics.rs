use std::collections::BTreeMap;

use jiff::SignedDuration;
use ruta_routing::{kmh::Kmh, meters::Meters};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::session::{DriverId, SessionRecord, SessionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DriverMetrics {
    pub sessions: usize,
    pub completed: usize,
    pub total_distance: Meters,
    pub total_duration: SignedDuration,
    pub deviation_events: usize,
}

impl Default for DriverMetrics {
    fn default() -> Self {
        DriverMetrics {
            sessions: 0,
            completed: 0,
            total_distance: Meters::ZERO,
            total_duration: SignedDuration::ZERO,
            deviation_events: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricsSummary {
    pub sessions: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub aborted: usize,
    pub total_distance: Meters,
    pub total_duration: SignedDuration,
    pub deviation_events: usize,

    /// Total distance over total duration, zero when no time was spent navigating
    pub average_speed: Kmh,

    pub per_driver: BTreeMap<DriverId, DriverMetrics>,
}

impl Default for MetricsSummary {
    fn default() -> Self {
        MetricsSummary {
            sessions: 0,
            completed: 0,
            cancelled: 0,
            aborted: 0,
            total_distance: Meters::ZERO,
            total_duration: SignedDuration::ZERO,
            deviation_events: 0,
            average_speed: Kmh::new(0.0),
            per_driver: BTreeMap::new(),
        }
    }
}

/// Reduces terminal session records into a summary, other records are ignored.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> MetricsSummary {
    let mut summary = MetricsSummary::default();

    for record in records {
        if !record.status.is_terminal() {
            continue;
        }

        let duration = record.duration();

        summary.sessions += 1;
        match record.status {
            SessionStatus::Completed => summary.completed += 1,
            SessionStatus::Cancelled => summary.cancelled += 1,
            SessionStatus::Aborted => summary.aborted += 1,
            SessionStatus::NotStarted | SessionStatus::InProgress => {}
        }
        summary.total_distance += record.distance_traveled;
        summary.total_duration += duration;
        summary.deviation_events += record.deviation_events;

        let driver = summary
            .per_driver
            .entry(record.driver_id.clone())
            .or_default();
        driver.sessions += 1;
        if record.status == SessionStatus::Completed {
            driver.completed += 1;
        }
        driver.total_distance += record.distance_traveled;
        driver.total_duration += duration;
        driver.deviation_events += record.deviation_events;
    }

    let seconds = summary.total_duration.as_secs_f64();
    if seconds > 0.0 {
        summary.average_speed =
            Kmh::from_meters_per_second(summary.total_distance.value() / seconds);
    }

    summary
}
