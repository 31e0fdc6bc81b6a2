use std::sync::atomic::{AtomicU8, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SessionStatus {
    NotStarted = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,

    /// No position update arrived within the update timeout
    Aborted = 4,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Aborted
        )
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionStatus::NotStarted,
            1 => SessionStatus::InProgress,
            2 => SessionStatus::Completed,
            3 => SessionStatus::Cancelled,
            _ => SessionStatus::Aborted,
        }
    }
}

/// Status shared between a session and its cancel handles.
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(status: SessionStatus) -> Self {
        StatusCell(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> SessionStatus {
        SessionStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `current` to `new`, returns the status found when it was not `current`.
    pub fn transition(
        &self,
        current: SessionStatus,
        new: SessionStatus,
    ) -> Result<(), SessionStatus> {
        self.0
            .compare_exchange(
                current as u8,
                new as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(SessionStatus::from_u8)
    }
}
