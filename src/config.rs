use std::{env, fmt, io::ErrorKind, path::PathBuf, time::Duration};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::misc::{self, ColourDot, serde::deserialise_empty_to_default};

pub const API_KEY_VAR: &str = "ELEVENLABS_API_KEY";

const API_KEY_PLACEHOLDER: &str = "your_key_here";

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// `false` disables the motor controller, it is tried with defaults otherwise.
    #[serde(
        default = "HardwareConfig::enabled",
        deserialize_with = "deserialise_empty_to_default"
    )]
    pub hardware: Option<HardwareConfig>,
    pub speech: SpeechConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub dispatch: DispatchMode,
}

/// How `/command` combines movement and speech.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Speak, then move, answering once both have finished.
    Sequential,
    /// Queue the movement, speak, answer without waiting for the robot.
    #[default]
    Concurrent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Seconds to wait after opening the port, the controller resets on connect.
    pub settle_delay: f32,
    /// Seconds a movement is assumed to take, there is no position feedback.
    pub travel_time: f32,
    pub write_timeout: f32,
    pub queue_depth: usize,
    pub zones: ZonePayloads,
}

/// Per-zone overrides of the bytes sent to the motor controller.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZonePayloads {
    pub red: Option<String>,
    pub blue: Option<String>,
    pub yellow: Option<String>,
    pub center: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
    pub scratch_path: PathBuf,
    pub player: Option<PlayerConfig>,
    pub request_timeout: f32,

    /// Sourced from the environment only, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayerConfig {
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Rodio,
}

impl Config {
    /// Loads the configuration file, falling back to defaults when it does not exist.
    /// The speech credential is always read from the environment.
    pub async fn load(path: &str) -> Result<Self> {
        let mut config = match fs::read(path).await {
            Ok(data) => Self::parse(&data).wrap_err_with(|| format!("Failed to parse {path}"))?,

            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No config file at {path}, using defaults");
                Config::default()
            }

            Err(e) => return Err(e).wrap_err_with(|| format!("Failed to read {path}")),
        };

        config.speech.api_key = resolve_api_key(env::var(API_KEY_VAR).ok());

        Ok(config)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(serde_yaml::from_slice(data)?)
    }

    pub fn travel_time(&self) -> Duration {
        let travel_time = self.hardware.as_ref().map(|h| h.travel_time);
        misc::seconds(travel_time.unwrap_or(HardwareConfig::TRAVEL_TIME))
    }

    pub fn queue_depth(&self) -> usize {
        let depth = self.hardware.as_ref().map(|h| h.queue_depth);
        depth.unwrap_or(HardwareConfig::QUEUE_DEPTH).max(1)
    }

    pub fn zone_payloads(&self) -> ZonePayloads {
        self.hardware
            .as_ref()
            .map(|h| h.zones.clone())
            .unwrap_or_default()
    }
}

impl HardwareConfig {
    pub const PORT: &str = "/dev/ttyUSB0";
    pub const BAUD_RATE: u32 = 9600;
    pub const SETTLE_DELAY: f32 = 2.;
    pub const TRAVEL_TIME: f32 = 15.5;
    pub const WRITE_TIMEOUT: f32 = 1.;
    pub const QUEUE_DEPTH: usize = 4;

    fn enabled() -> Option<Self> {
        Some(Self::default())
    }

    pub fn settle_delay(&self) -> Duration {
        misc::seconds(self.settle_delay)
    }

    pub fn write_timeout(&self) -> Duration {
        misc::seconds(self.write_timeout)
    }
}

impl SpeechConfig {
    pub const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
    pub const MODEL_ID: &str = "eleven_multilingual_v2";
    pub const BASE_URL: &str = "https://api.elevenlabs.io";
    pub const REQUEST_TIMEOUT: f32 = 30.;

    pub fn request_timeout(&self) -> Duration {
        misc::seconds(self.request_timeout)
    }
}

/// Treats empty keys and the template placeholder as no key at all.
pub fn resolve_api_key(value: Option<String>) -> Option<String> {
    value
        .map(|key| key.trim().to_owned())
        .filter(|key| !key.is_empty() && key != API_KEY_PLACEHOLDER)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            hardware: HardwareConfig::enabled(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            dispatch: DispatchMode::default(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            port: Self::PORT.to_owned(),
            baud_rate: Self::BAUD_RATE,
            settle_delay: Self::SETTLE_DELAY,
            travel_time: Self::TRAVEL_TIME,
            write_timeout: Self::WRITE_TIMEOUT,
            queue_depth: Self::QUEUE_DEPTH,
            zones: ZonePayloads::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice_id: Self::VOICE_ID.to_owned(),
            model_id: Self::MODEL_ID.to_owned(),
            base_url: Self::BASE_URL.to_owned(),
            scratch_path: env::temp_dir().join("storyrover_speech.mp3"),
            player: None,
            request_timeout: Self::REQUEST_TIMEOUT,
            api_key: None,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hardware {
            Some(hw) => writeln!(
                f,
                "{} Motor controller: {} @ {} baud",
                ColourDot(true),
                hw.port,
                hw.baud_rate
            )?,

            None => writeln!(f, "{} Motor controller: disabled", ColourDot(false))?,
        }

        write!(
            f,
            "{} Speech: voice {} ({})",
            ColourDot::from(&self.speech.api_key),
            self.speech.voice_id,
            self.speech.model_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let hardware = config.hardware.as_ref().unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.dispatch, DispatchMode::Concurrent);
        assert_eq!(hardware.port, "/dev/ttyUSB0");
        assert_eq!(hardware.baud_rate, 9600);
        assert_eq!(hardware.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.travel_time(), Duration::from_millis(15_500));
        assert_eq!(config.speech.voice_id, SpeechConfig::VOICE_ID);
        assert!(config.speech.api_key.is_none());
    }

    #[test]
    fn test_parse_full() {
        let yaml = br#"
server:
  port: 8080
  dispatch: sequential
hardware:
  port: /dev/ttyACM0
  baud_rate: 115200
  travel_time: 8
  queue_depth: 2
  zones:
    center: "<HOME>"
speech:
  voice_id: cgSgspJ2msm6clMCkdW9
  player:
    kind: command
    program: mpg123
    args: ["-q"]
"#;

        let config = Config::parse(yaml).unwrap();
        let hardware = config.hardware.as_ref().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.dispatch, DispatchMode::Sequential);
        assert_eq!(hardware.port, "/dev/ttyACM0");
        assert_eq!(hardware.baud_rate, 115200);
        assert_eq!(hardware.settle_delay, HardwareConfig::SETTLE_DELAY);
        assert_eq!(config.travel_time(), Duration::from_secs(8));
        assert_eq!(config.queue_depth(), 2);
        assert_eq!(config.zone_payloads().center.as_deref(), Some("<HOME>"));
        assert_eq!(config.zone_payloads().red, None);
        assert_eq!(config.speech.voice_id, "cgSgspJ2msm6clMCkdW9");
        assert_eq!(config.speech.model_id, SpeechConfig::MODEL_ID);
        assert_eq!(
            config.speech.player,
            Some(PlayerConfig::Command {
                program: "mpg123".into(),
                args: vec!["-q".into()],
            })
        );
    }

    #[test]
    fn test_hardware_section() {
        let config = Config::parse(b"server:\n  port: 5001\n").unwrap();
        assert_eq!(config.hardware.unwrap().port, HardwareConfig::PORT);

        let config = Config::parse(b"hardware: false\n").unwrap();
        assert!(config.hardware.is_none());
        assert_eq!(config.travel_time(), Duration::from_millis(15_500));

        let config = Config::parse(b"hardware: true\n").unwrap();
        assert!(config.hardware.is_some());

        let config = Config::parse(b"hardware:\n").unwrap();
        assert_eq!(config.hardware.unwrap().port, HardwareConfig::PORT);

        let config = Config::parse(b"hardware: ~\n").unwrap();
        assert!(config.hardware.is_some());
    }

    #[test]
    fn test_queue_depth_floor() {
        let config = Config::parse(b"hardware:\n  queue_depth: 0\n").unwrap();
        assert_eq!(config.queue_depth(), 1);
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let config = Config::parse(b"speech:\n  api_key: secret\n").unwrap();
        assert!(config.speech.api_key.is_none());
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(None), None);
        assert_eq!(resolve_api_key(Some("".into())), None);
        assert_eq!(resolve_api_key(Some("  ".into())), None);
        assert_eq!(resolve_api_key(Some("your_key_here".into())), None);
        assert_eq!(resolve_api_key(Some(" sk_123 ".into())), Some("sk_123".into()));
    }

    #[test]
    fn test_rodio_player() {
        let config = Config::parse(b"speech:\n  player:\n    kind: rodio\n").unwrap();
        assert_eq!(config.speech.player, Some(PlayerConfig::Rodio));
    }
}
