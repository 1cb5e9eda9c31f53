use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, DispatchMode},
    context::RoverContext,
    hardware::{MotionController, MotionQueue, MotionStatus, MoveOutcome, ZoneMap},
    misc::serde::deserialise_lenient_string,
    speech::{Emotion, Speaker},
};

const DEFAULT_ZONE: &str = "center";

/// Request body of a command. Every field may be left out, non-string values are
/// taken as their JSON text.
#[derive(Debug, Default, Deserialize)]
pub struct CommandPayload {
    #[serde(default, deserialize_with = "deserialise_lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "deserialise_lenient_string")]
    pub zone: Option<String>,
    #[serde(default, deserialize_with = "deserialise_lenient_string")]
    pub emotion: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub text: String,
    /// Kept raw, unknown zones are only rejected at lookup.
    pub zone: String,
    pub emotion: Emotion,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub zone: String,
    /// Queued for a known zone with a link present, or completed when sequential.
    pub moved: bool,
    pub spoke: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Health {
    pub hardware_connected: bool,
    pub speech_enabled: bool,
}

/// Turns commands into a movement and an utterance.
///
/// In concurrent mode movements are queued and run in the background while speech is
/// awaited. In sequential mode both are awaited, speech first.
pub struct Dispatcher {
    mode: DispatchMode,
    motion: Arc<MotionController>,
    queue: MotionQueue,
    speaker: Speaker,
}

impl From<CommandPayload> for Command {
    fn from(payload: CommandPayload) -> Self {
        Self {
            text: payload.text.unwrap_or_default(),
            zone: payload.zone.unwrap_or_else(|| DEFAULT_ZONE.to_owned()),
            emotion: payload
                .emotion
                .as_deref()
                .map(Emotion::parse_lenient)
                .unwrap_or_default(),
        }
    }
}

impl Dispatcher {
    /// Must be called from within a Tokio runtime, the motion worker is spawned here.
    pub fn new(config: &Config, context: RoverContext) -> Self {
        let zones = ZoneMap::new(&config.zone_payloads());
        let motion = Arc::new(MotionController::new(
            context.link,
            zones,
            config.travel_time(),
        ));

        let queue = MotionQueue::spawn(motion.clone(), config.queue_depth());
        let speaker = Speaker::new(
            context.synth,
            context.player,
            config.speech.scratch_path.clone(),
        );

        Self {
            mode: config.server.dispatch,
            motion,
            queue,
            speaker,
        }
    }

    #[tracing::instrument(skip_all, fields(zone = %command.zone, emotion = %command.emotion))]
    pub async fn handle(&self, command: Command) -> CommandOutcome {
        let Command {
            text,
            zone,
            emotion,
        } = command;

        let (moved, spoke) = match self.mode {
            DispatchMode::Concurrent => {
                let moved = self.submit_movement(&zone);
                (moved, self.speak_text(&text, emotion).await)
            }

            DispatchMode::Sequential => {
                let spoke = self.speak_text(&text, emotion).await;
                let outcome = self.motion.move_to_zone(&zone).await;
                (outcome == MoveOutcome::Moved, spoke)
            }
        };

        CommandOutcome { zone, moved, spoke }
    }

    /// Always queued so the worker reports what happened, even for no-ops.
    fn submit_movement(&self, zone: &str) -> bool {
        let accepted = self.motion.accepts(zone);

        match self.queue.submit(zone.to_owned()) {
            Ok(()) => accepted,
            Err(e) => {
                tracing::warn!("Dropped movement to {zone}: {e}");
                false
            }
        }
    }

    async fn speak_text(&self, text: &str, emotion: Emotion) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        self.speaker.speak(text, emotion).await
    }

    /// Runs one movement directly, waiting for the travel time.
    pub async fn move_to_zone(&self, zone: &str) -> MoveOutcome {
        self.motion.move_to_zone(zone).await
    }

    pub async fn speak(&self, text: &str, emotion: Emotion) -> bool {
        self.speaker.speak(text, emotion).await
    }

    pub fn health(&self) -> Health {
        Health {
            hardware_connected: self.motion.is_connected(),
            speech_enabled: self.speaker.is_enabled(),
        }
    }

    pub fn motion_status(&self) -> MotionStatus {
        self.queue.status()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<MotionStatus> {
        self.queue.subscribe()
    }
}
