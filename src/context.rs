use crate::{
    config::Config,
    hardware::HardwareLink,
    speech::{ElevenLabs, Player, SpeechSynth, playback},
};

/// Process-wide peripherals, opened once at startup.
///
/// Anything that cannot be brought up is left out and the rover runs without it.
pub struct RoverContext {
    pub link: Option<HardwareLink>,
    pub synth: Option<Box<dyn SpeechSynth>>,
    pub player: Box<dyn Player>,
}

impl RoverContext {
    pub async fn connect(config: &Config) -> Self {
        Self {
            link: connect_link(config).await,
            ..Self::speech_only(config)
        }
    }

    /// Leaves the serial link closed.
    pub fn speech_only(config: &Config) -> Self {
        Self {
            link: None,
            synth: connect_synth(config),
            player: playback::from_config(config.speech.player.as_ref()),
        }
    }
}

async fn connect_link(config: &Config) -> Option<HardwareLink> {
    let Some(hw) = &config.hardware else {
        tracing::info!("No hardware configured, movements are disabled");
        return None;
    };

    match HardwareLink::open(&hw.port, hw.baud_rate, hw.settle_delay()).await {
        Ok(link) => {
            tracing::info!("Connected to motor controller on {}", link.name());
            Some(link.with_write_timeout(hw.write_timeout()))
        }

        Err(e) => {
            tracing::warn!("{e}, continuing without movement");
            None
        }
    }
}

fn connect_synth(config: &Config) -> Option<Box<dyn SpeechSynth>> {
    let Some(api_key) = &config.speech.api_key else {
        tracing::info!("No speech credential, speech is disabled");
        return None;
    };

    match ElevenLabs::try_new(&config.speech, api_key.clone()) {
        Ok(vendor) => Some(Box::new(vendor)),
        Err(e) => {
            tracing::warn!("{e}, continuing without speech");
            None
        }
    }
}
