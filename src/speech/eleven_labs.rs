use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header::ACCEPT};
use serde::Serialize;

use super::{Emotion, SpeechError, SpeechSynth, VoiceSettings};
use crate::config::SpeechConfig;

/// ElevenLabs text-to-speech over its REST API.
pub struct ElevenLabs {
    client: Client,
    api_key: String,
    endpoint: String,
    model_id: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

impl ElevenLabs {
    const API_KEY_HEADER: &str = "xi-api-key";
    const AUDIO_MIME: &str = "audio/mpeg";

    pub fn try_new(config: &SpeechConfig, api_key: String) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let endpoint = format!(
            "{}/v1/text-to-speech/{}",
            config.base_url.trim_end_matches('/'),
            config.voice_id
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model_id: config.model_id.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynth for ElevenLabs {
    async fn synthesize(&self, text: &str, emotion: Emotion) -> Result<Bytes, SpeechError> {
        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: emotion.voice_settings(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(Self::API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, Self::AUDIO_MIME)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status { status, body });
        }

        Ok(response.bytes().await?)
    }
}
