use jiff::Timestamp;
use ruta_routing::meters::Meters;
use thiserror::Error;

use super::session_status::SessionStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Position at {received} is not after the last applied position at {last}")]
    OutOfOrderUpdate { last: Timestamp, received: Timestamp },

    #[error("Position lat {lat}, lon {lon} is not a valid coordinate")]
    InvalidPosition { lat: f64, lon: f64 },

    #[error(
        "Cannot complete on segment {segment_index} of {segment_count}, {distance_to_destination} from the destination"
    )]
    CompletionRejected {
        segment_index: usize,
        segment_count: usize,
        distance_to_destination: Meters,
    },

    #[error("Route has no segment to follow")]
    EmptyRoute,

    #[error("Session already started, status is {status:?}")]
    AlreadyStarted { status: SessionStatus },
}

impl TrackerError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TrackerError::OutOfOrderUpdate { .. } => "position update ignored",
            TrackerError::InvalidPosition { .. } => "invalid position ignored",
            TrackerError::CompletionRejected { .. } => "destination not reached yet",
            TrackerError::EmptyRoute => "no route found between points",
            TrackerError::AlreadyStarted { .. } => "navigation already started",
        }
    }
}
