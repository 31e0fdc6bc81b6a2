mod guidance;
mod navigation_session;
mod position_fix;
mod projection;
mod session_id;
mod session_record;
mod session_status;
mod tracker_error;
mod tracker_params;

pub use guidance::{Guidance, NavigationSignal, UpdateOutcome};
pub use navigation_session::{CancelHandle, NavigationSession};
pub use position_fix::PositionFix;
pub use session_id::{DriverId, SessionId};
pub use session_record::SessionRecord;
pub use session_status::SessionStatus;
pub use tracker_error::TrackerError;
pub use tracker_params::TrackerParams;
