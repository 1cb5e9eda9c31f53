use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::SpeechError;
use crate::config::PlayerConfig;

/// Plays an audio file to completion.
#[async_trait]
pub trait Player: Send + Sync {
    async fn play(&self, path: &Path) -> Result<(), SpeechError>;
}

/// Plays audio by running an external program with the file as its last argument.
#[derive(Debug, PartialEq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `afplay` on macOS, `ffplay` without a window elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("afplay", Vec::new())
        } else {
            let args = ["-nodisp", "-autoexit", "-loglevel", "error"];
            Self::new("ffplay", args.map(str::to_owned).to_vec())
        }
    }
}

#[async_trait]
impl Player for CommandPlayer {
    async fn play(&self, path: &Path) -> Result<(), SpeechError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SpeechError::Playback(format!("{}: {e}", self.program)))?;

        if !status.success() {
            return Err(SpeechError::Playback(format!(
                "{} exited with {status}",
                self.program
            )));
        }

        Ok(())
    }
}

/// Plays audio in-process on the default output device.
#[cfg(feature = "rodio")]
pub struct RodioPlayer;

#[cfg(feature = "rodio")]
#[async_trait]
impl Player for RodioPlayer {
    async fn play(&self, path: &Path) -> Result<(), SpeechError> {
        let path = path.to_owned();

        tokio::task::spawn_blocking(move || play_blocking(&path))
            .await
            .map_err(|e| SpeechError::Playback(e.to_string()))?
    }
}

#[cfg(feature = "rodio")]
fn play_blocking(path: &Path) -> Result<(), SpeechError> {
    use std::{fs::File, io::BufReader};

    use rodio::{Decoder, OutputStream, Sink};

    let playback = |e: &dyn std::fmt::Display| SpeechError::Playback(e.to_string());

    let (_stream, handle) = OutputStream::try_default().map_err(|e| playback(&e))?;
    let sink = Sink::try_new(&handle).map_err(|e| playback(&e))?;

    let file = BufReader::new(File::open(path)?);
    let sound = Decoder::new(file).map_err(|e| playback(&e))?;

    sink.append(sound);
    sink.sleep_until_end();

    Ok(())
}

/// Builds the configured player, defaulting to the platform's command-line player.
pub fn from_config(config: Option<&PlayerConfig>) -> Box<dyn Player> {
    match config {
        Some(PlayerConfig::Command { program, args }) => {
            Box::new(CommandPlayer::new(program.clone(), args.clone()))
        }

        #[cfg(feature = "rodio")]
        Some(PlayerConfig::Rodio) => Box::new(RodioPlayer),

        #[cfg(not(feature = "rodio"))]
        Some(PlayerConfig::Rodio) => {
            tracing::warn!("Built without the rodio feature, using the default player");
            Box::new(CommandPlayer::platform_default())
        }

        None => Box::new(CommandPlayer::platform_default()),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_player() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("speech.mp3");
        tokio::fs::write(&audio, b"mp3").await.unwrap();

        let player = CommandPlayer::new("true", Vec::new());
        player.play(&audio).await.unwrap();

        let player = CommandPlayer::new("test", vec!["-s".into()]);
        player.play(&audio).await.unwrap();
    }

    #[tokio::test]
    async fn test_command_player_failures() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");

        let player = CommandPlayer::new("test", vec!["-s".into()]);
        let result = player.play(&missing).await;
        assert!(matches!(result, Err(SpeechError::Playback(_))));

        let player = CommandPlayer::new("storyrover-no-such-player", Vec::new());
        let result = player.play(&missing).await;
        assert!(matches!(result, Err(SpeechError::Playback(_))));
    }

    #[test]
    fn test_default_player() {
        let expected = if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "ffplay"
        };

        assert_eq!(CommandPlayer::platform_default().program, expected);
    }
}
