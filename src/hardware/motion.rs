use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::time::sleep;

use super::{HardwareLink, ZoneMap};

pub struct MotionController {
    link: Option<HardwareLink>,
    zones: ZoneMap,
    travel_time: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MoveOutcome {
    /// Payload written and the travel time has elapsed.
    Moved,
    /// No hardware link, nothing was sent.
    Skipped,
    UnknownZone,
    Failed,
}

impl MotionController {
    pub fn new(link: Option<HardwareLink>, zones: ZoneMap, travel_time: Duration) -> Self {
        Self {
            link,
            zones,
            travel_time,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Whether a movement to `zone` would reach the actuator.
    pub fn accepts(&self, zone: &str) -> bool {
        self.is_connected() && self.zones.resolve(zone).is_ok()
    }

    /// Sends the robot to `zone` and waits out the travel time. Failures are logged and
    /// reported through the outcome, never raised.
    ///
    /// The actuator stays locked until the travel time has elapsed, overlapping calls
    /// run one after the other.
    #[tracing::instrument(skip(self))]
    pub async fn move_to_zone(&self, zone: &str) -> MoveOutcome {
        let Some(link) = &self.link else {
            tracing::info!("Would move to {zone} zone (no motor controller)");
            return MoveOutcome::Skipped;
        };

        let (zone, payload) = match self.zones.resolve(zone) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!("{e}");
                return MoveOutcome::UnknownZone;
            }
        };

        let mut actuator = link.lock().await;

        tracing::info!("Moving to {zone} zone ({})", zone.meaning());

        if let Err(e) = actuator.write(payload).await {
            tracing::error!("Movement to {zone} failed: {e}");
            return MoveOutcome::Failed;
        }

        sleep(self.travel_time).await;

        tracing::info!("Reached {zone} zone");
        MoveOutcome::Moved
    }
}
