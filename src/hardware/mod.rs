pub mod link;
pub mod motion;
pub mod queue;
pub mod zone;

pub use link::{HardwareError, HardwareLink, Transport};
pub use motion::{MotionController, MoveOutcome};
pub use queue::{MotionQueue, MotionStatus, SubmitError};
pub use zone::{UnknownZone, Zone, ZoneMap};
