//! Text-to-speech: synthesis through a vendor, then playback of the returned audio.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tokio::{fs, sync::Mutex};

pub use self::{
    eleven_labs::ElevenLabs,
    playback::{CommandPlayer, Player},
};

pub mod eleven_labs;
pub mod playback;

#[cfg(feature = "rodio")]
pub use self::playback::RodioPlayer;

const PREVIEW_CHARS: usize = 50;

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    #[default]
    Neutral,
    Excited,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech vendor returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Speech vendor unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Scratch file: {0}")]
    Io(#[from] io::Error),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Turns text into encoded audio.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    async fn synthesize(&self, text: &str, emotion: Emotion) -> Result<Bytes, SpeechError>;
}

/// Synthesises speech, stores it in a scratch file and plays it back.
///
/// Without a synthesiser (no credential) every call is a logged no-op. Calls are
/// serialised, they share the scratch file and the speaker.
pub struct Speaker {
    synth: Option<Box<dyn SpeechSynth>>,
    player: Box<dyn Player>,
    scratch_path: PathBuf,
    busy: Mutex<()>,
}

impl Emotion {
    /// Reads an emotion from a request, anything unrecognised is neutral.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::debug!("Unrecognised emotion {value:?}, using neutral");
            Emotion::Neutral
        })
    }

    pub fn voice_settings(self) -> VoiceSettings {
        let (stability, similarity_boost) = match self {
            Emotion::Happy | Emotion::Excited => (0.3, 0.8),
            Emotion::Sad => (0.7, 0.5),
            Emotion::Neutral => (0.5, 0.5),
        };

        VoiceSettings {
            stability,
            similarity_boost,
        }
    }
}

impl Speaker {
    pub fn new(
        synth: Option<Box<dyn SpeechSynth>>,
        player: Box<dyn Player>,
        scratch_path: PathBuf,
    ) -> Self {
        Self {
            synth,
            player,
            scratch_path,
            busy: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.synth.is_some()
    }

    /// Speaks `text` and waits for playback to finish. Returns whether anything was
    /// played, failures are logged.
    #[tracing::instrument(skip_all, fields(emotion = %emotion))]
    pub async fn speak(&self, text: &str, emotion: Emotion) -> bool {
        let Some(synth) = &self.synth else {
            tracing::info!("Would speak {:?} (speech not configured)", preview(text));
            return false;
        };

        match self.synthesize_and_play(synth.as_ref(), text, emotion).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    }

    async fn synthesize_and_play(
        &self,
        synth: &dyn SpeechSynth,
        text: &str,
        emotion: Emotion,
    ) -> Result<(), SpeechError> {
        let _busy = self.busy.lock().await;

        tracing::info!("Generating speech {:?}", preview(text));
        let audio = synth.synthesize(text, emotion).await?;

        fs::write(&self.scratch_path, &audio).await?;
        tracing::debug!("Saved {} B to {}", audio.len(), self.scratch_path.display());

        self.player.play(&self.scratch_path).await?;
        tracing::info!("Speech played");

        Ok(())
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        path::Path,
        sync::{
            Arc, Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use super::*;

    #[derive(Clone, Default)]
    pub struct MockSynth {
        pub calls: Arc<AtomicUsize>,
        pub requests: Arc<StdMutex<Vec<(String, Emotion)>>>,
        pub fail: bool,
    }

    #[async_trait]
    impl SpeechSynth for MockSynth {
        async fn synthesize(&self, text: &str, emotion: Emotion) -> Result<Bytes, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push((text.to_owned(), emotion));

            if self.fail {
                return Err(SpeechError::Status {
                    status: reqwest::StatusCode::UNAUTHORIZED,
                    body: "invalid api key".into(),
                });
            }

            Ok(Bytes::from(format!("audio:{text}")))
        }
    }

    /// Remembers what was in the scratch file when it was asked to play it.
    #[derive(Clone, Default)]
    pub struct MockPlayer {
        pub played: Arc<StdMutex<Vec<Vec<u8>>>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Player for MockPlayer {
        async fn play(&self, path: &Path) -> Result<(), SpeechError> {
            if self.fail {
                return Err(SpeechError::Playback("no audio device".into()));
            }

            let audio = fs::read(path).await?;
            self.played.lock().unwrap().push(audio);
            Ok(())
        }
    }

    fn speaker(synth: Option<MockSynth>, player: &MockPlayer, dir: &Path) -> Speaker {
        let synth = synth.map(|s| Box::new(s) as Box<dyn SpeechSynth>);
        Speaker::new(synth, Box::new(player.clone()), dir.join("speech.mp3"))
    }

    #[tokio::test]
    async fn test_disabled_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let player = MockPlayer::default();
        let speaker = speaker(None, &player, dir.path());

        assert!(!speaker.is_enabled());
        assert!(!speaker.speak("hello", Emotion::Happy).await);
        assert!(player.played.lock().unwrap().is_empty());
        assert!(!dir.path().join("speech.mp3").exists());
    }

    #[tokio::test]
    async fn test_speak() {
        let dir = tempfile::tempdir().unwrap();
        let synth = MockSynth::default();
        let player = MockPlayer::default();
        let speaker = speaker(Some(synth.clone()), &player, dir.path());

        assert!(speaker.is_enabled());
        assert!(speaker.speak("hello", Emotion::Sad).await);
        assert!(speaker.speak("again", Emotion::Neutral).await);

        assert_eq!(
            *synth.requests.lock().unwrap(),
            vec![("hello".into(), Emotion::Sad), ("again".into(), Emotion::Neutral)]
        );
        assert_eq!(
            *player.played.lock().unwrap(),
            vec![b"audio:hello".to_vec(), b"audio:again".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_vendor_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = MockSynth {
            fail: true,
            ..Default::default()
        };
        let player = MockPlayer::default();
        let speaker = speaker(Some(synth.clone()), &player, dir.path());

        assert!(!speaker.speak("hello", Emotion::Happy).await);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
        assert!(player.played.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playback_error() {
        let dir = tempfile::tempdir().unwrap();
        let player = MockPlayer {
            fail: true,
            ..Default::default()
        };
        let speaker = speaker(Some(MockSynth::default()), &player, dir.path());

        assert!(!speaker.speak("hello", Emotion::Happy).await);
    }

    #[tokio::test]
    async fn test_unwritable_scratch_path() {
        let dir = tempfile::tempdir().unwrap();
        let player = MockPlayer::default();
        let speaker = Speaker::new(
            Some(Box::new(MockSynth::default())),
            Box::new(player.clone()),
            dir.path().join("missing").join("speech.mp3"),
        );

        assert!(!speaker.speak("hello", Emotion::Happy).await);
        assert!(player.played.lock().unwrap().is_empty());
    }

    #[test]
    fn test_emotions() {
        assert_eq!(Emotion::parse_lenient("happy"), Emotion::Happy);
        assert_eq!(Emotion::parse_lenient("excited"), Emotion::Excited);
        assert_eq!(Emotion::parse_lenient("angry"), Emotion::Neutral);
        assert_eq!(Emotion::parse_lenient("SAD"), Emotion::Neutral);

        assert_eq!(Emotion::Excited.voice_settings(), Emotion::Happy.voice_settings());
        assert_eq!(Emotion::Sad.voice_settings().stability, 0.7);
        assert_eq!(Emotion::Neutral.voice_settings().similarity_boost, 0.5);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");

        let long = "é".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "é".repeat(50)));
    }
}
