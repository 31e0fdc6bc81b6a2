use std::sync::Arc;

use fxhash::FxHashMap;
use jiff::Timestamp;
use parking_lot::{Mutex, RwLock};
use ruta_routing::routing::OptimizedRoute;
use thiserror::Error;
use tracing::{debug, info};

use crate::session::{
    CancelHandle, DriverId, Guidance, NavigationSession, PositionFix, SessionId, SessionRecord,
    SessionStatus, TrackerError, TrackerParams, UpdateOutcome,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("No active session {0}")]
    UnknownSession(SessionId),

    #[error("Driver {driver} already follows session {session}")]
    DriverBusy { driver: DriverId, session: SessionId },

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl RegistryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RegistryError::UnknownSession(_) => "navigation session not found",
            RegistryError::DriverBusy { .. } => "driver already has an active navigation",
            RegistryError::Tracker(error) => error.user_message(),
        }
    }
}

struct SessionEntry {
    session: Mutex<NavigationSession>,
    cancel: CancelHandle,
}

#[derive(Default)]
struct ActiveSessions {
    sessions: FxHashMap<SessionId, Arc<SessionEntry>>,
    drivers: FxHashMap<DriverId, SessionId>,
}

#[derive(Default)]
struct Archive {
    records: Vec<SessionRecord>,
    statuses: FxHashMap<SessionId, SessionStatus>,
}

/// Active navigation sessions, at most one per driver.
///
/// Updates to different sessions run in parallel, updates to one session are serialized
/// by its own lock. Cancellation goes through the session status and never waits for an
/// update in flight. Sessions reaching a terminal status are moved to the archive.
///
/// Locks are always taken in the same order, a session lock before the registry lock.
#[derive(Default)]
pub struct SessionRegistry {
    params: TrackerParams,
    active: RwLock<ActiveSessions>,
    archived: Mutex<Archive>,
}

impl SessionRegistry {
    pub fn new(params: TrackerParams) -> Self {
        SessionRegistry {
            params,
            active: RwLock::new(ActiveSessions::default()),
            archived: Mutex::new(Archive::default()),
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Starts following `route` for `driver_id` from the `origin` fix.
    pub fn start(
        &self,
        driver_id: DriverId,
        route: Arc<OptimizedRoute>,
        origin: PositionFix,
    ) -> Result<(SessionId, Guidance), RegistryError> {
        let mut active = self.active.write();

        if let Some(&session) = active.drivers.get(&driver_id) {
            return Err(RegistryError::DriverBusy {
                driver: driver_id,
                session,
            });
        }

        let mut session = NavigationSession::new(driver_id.clone(), route, self.params);
        let guidance = session.start(origin)?;

        let id = session.id();
        let entry = SessionEntry {
            cancel: session.cancel_handle(),
            session: Mutex::new(session),
        };

        active.sessions.insert(id, Arc::new(entry));
        active.drivers.insert(driver_id, id);

        Ok((id, guidance))
    }

    pub fn update(&self, id: SessionId, fix: PositionFix) -> Result<UpdateOutcome, RegistryError> {
        let entry = self.entry(id)?;

        let (outcome, record) = {
            let mut session = entry.session.lock();
            let outcome = session.update(fix)?;
            (outcome, session.record())
        };

        if outcome.status.is_terminal() {
            self.retire(id, record);
        }

        Ok(outcome)
    }

    pub fn complete(
        &self,
        id: SessionId,
        notes: Option<String>,
    ) -> Result<SessionStatus, RegistryError> {
        let entry = self.entry(id)?;

        let (status, record) = {
            let mut session = entry.session.lock();
            let status = session.complete(notes)?;
            (status, session.record())
        };

        if status.is_terminal() {
            self.retire(id, record);
        }

        Ok(status)
    }

    /// Cancels the session right away, then archives it once the session is free.
    pub fn cancel(
        &self,
        id: SessionId,
        reason: Option<String>,
    ) -> Result<SessionStatus, RegistryError> {
        let entry = self.entry(id)?;
        let status = entry.cancel.cancel(reason);

        if status.is_terminal() {
            let record = entry.session.lock().record();
            self.retire(id, record);
        }

        Ok(status)
    }

    /// Replaces the route followed by the session, after a recalculation.
    pub fn reroute(
        &self,
        id: SessionId,
        route: Arc<OptimizedRoute>,
    ) -> Result<Option<Guidance>, RegistryError> {
        let entry = self.entry(id)?;
        let guidance = entry.session.lock().reroute(route)?;
        Ok(guidance)
    }

    /// Status of an active or archived session.
    pub fn status(&self, id: SessionId) -> Option<SessionStatus> {
        if let Some(entry) = self.active.read().sessions.get(&id) {
            return Some(entry.cancel.status());
        }

        self.archived.lock().statuses.get(&id).copied()
    }

    pub fn guidance(&self, id: SessionId) -> Option<Guidance> {
        let entry = self.entry(id).ok()?;
        let session = entry.session.lock();
        session.guidance().cloned()
    }

    pub fn active_session(&self, driver_id: &DriverId) -> Option<SessionId> {
        self.active.read().drivers.get(driver_id).copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().sessions.len()
    }

    /// Aborts every session without a position update within the timeout before `now`.
    pub fn sweep_expired(&self, now: Timestamp) -> Vec<SessionId> {
        let entries = self
            .active
            .read()
            .sessions
            .iter()
            .map(|(&id, entry)| (id, Arc::clone(entry)))
            .collect::<Vec<_>>();

        let mut expired = Vec::new();
        for (id, entry) in entries {
            let (status, record) = {
                let mut session = entry.session.lock();
                let status = session.expire(now);
                (status, session.record())
            };

            if status.is_terminal() {
                self.retire(id, record);
                if status == SessionStatus::Aborted {
                    expired.push(id);
                }
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Aborted expired sessions");
        }

        expired
    }

    /// Takes the records of every session archived so far, their statuses are forgotten.
    pub fn drain_archived(&self) -> Vec<SessionRecord> {
        let mut archived = self.archived.lock();
        archived.statuses.clear();
        std::mem::take(&mut archived.records)
    }

    fn entry(&self, id: SessionId) -> Result<Arc<SessionEntry>, RegistryError> {
        self.active
            .read()
            .sessions
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownSession(id))
    }

    /// Only the caller that removes the session archives its record.
    fn retire(&self, id: SessionId, record: Option<SessionRecord>) {
        let removed = {
            let mut active = self.active.write();
            let removed = active.sessions.remove(&id);
            active.drivers.retain(|_, session| *session != id);
            removed
        };

        if removed.is_none() {
            return;
        }

        debug!(session = %id, "Archiving session");
        if let Some(record) = record {
            let mut archived = self.archived.lock();
            archived.statuses.insert(id, record.status);
            archived.records.push(record);
        }
    }
}
