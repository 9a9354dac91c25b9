//! Gemini `generateContent` implementation of [`GenerationService`].

use super::prompts::{
    album_art_prompt, song_concept_prompt, song_concept_schema, vocal_preview_prompt,
    ALBUM_ART_ASPECT_RATIO, PLACEHOLDER_ART_URL,
};
use super::provider::{GenerationError, GenerationService};
use super::types::{
    ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ImageConfig, InlineData, PrebuiltVoiceConfig, SpeechConfig, VoiceConfig,
};
use crate::audio::RawAudio;
use crate::song::{AlbumArt, LatentParams, SongStructure, VoiceName};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CONCEPT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Model names used for each of the three calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiModels {
    pub concept: String,
    pub image: String,
    pub speech: String,
}

impl Default for GeminiModels {
    fn default() -> Self {
        Self {
            concept: DEFAULT_CONCEPT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            speech: DEFAULT_SPEECH_MODEL.to_string(),
        }
    }
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    models: GeminiModels,
    placeholder_art_url: String,
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g., "https://generativelanguage.googleapis.com").
    /// * `api_key` - Optional API key; without one every call fails with an authentication error.
    /// * `timeout_sec` - Transport timeout applied to each request.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            models: GeminiModels::default(),
            placeholder_art_url: PLACEHOLDER_ART_URL.to_string(),
        })
    }

    pub fn with_models(mut self, models: GeminiModels) -> Self {
        self.models = models;
        self
    }

    pub fn with_placeholder_art_url(mut self, url: impl Into<String>) -> Self {
        self.placeholder_art_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn models(&self) -> &GeminiModels {
        &self.models
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        debug!(model = %model, "Sending generateContent request");

        let response = self
            .authorize(self.client.post(&url).json(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(model = %model, status = status.as_u16(), "generateContent failed");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        if body.trim().is_empty() {
            return Ok(GenerateContentResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| {
            GenerationError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Connection(e.to_string())
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, GenerationError> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| GenerationError::InvalidResponse(format!("Invalid base64 payload: {}", e)))
}

fn inline_to_art(inline: &InlineData) -> Result<AlbumArt, GenerationError> {
    let mime_type = inline
        .mime_type
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    Ok(AlbumArt::Inline {
        mime_type,
        data: decode_base64(&inline.data)?,
    })
}

#[async_trait]
impl GenerationService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_song_concept(
        &self,
        prompt: &str,
        params: &LatentParams,
    ) -> Result<SongStructure, GenerationError> {
        let request = GenerateContentRequest::from_text(
            song_concept_prompt(prompt, params),
            GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(song_concept_schema()),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.concept, &request).await?;

        let Some(text) = response.text().filter(|t| !t.trim().is_empty()) else {
            warn!(
                model = %self.models.concept,
                finish_reason = response.finish_reason().unwrap_or("unknown"),
                "Song concept response carried no text"
            );
            return Err(GenerationError::EmptyResponse);
        };

        let song: SongStructure = serde_json::from_str(&text).map_err(|e| {
            GenerationError::InvalidResponse(format!("Malformed song concept: {}", e))
        })?;

        if let Some(field) = song.first_blank_field() {
            return Err(GenerationError::IncompleteSong(field));
        }

        debug!(title = %song.title, genre = %song.genre, "Received song concept");
        Ok(song)
    }

    async fn generate_album_art(
        &self,
        prompt: &str,
        song: &SongStructure,
    ) -> Result<AlbumArt, GenerationError> {
        let request = GenerateContentRequest::from_text(
            album_art_prompt(prompt, song),
            GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: ALBUM_ART_ASPECT_RATIO.to_string(),
                }),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.image, &request).await?;

        match response.first_inline_data() {
            Some(inline) => inline_to_art(inline),
            None => {
                warn!(
                    title = %song.title,
                    "No inline image in response, using placeholder art"
                );
                Ok(AlbumArt::Url(self.placeholder_art_url.clone()))
            }
        }
    }

    async fn generate_vocal_preview(
        &self,
        text: &str,
        voice: VoiceName,
    ) -> Result<RawAudio, GenerationError> {
        let request = GenerateContentRequest::from_text(
            vocal_preview_prompt(text),
            GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.as_str().to_string(),
                        },
                    },
                }),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.speech, &request).await?;

        let inline = response
            .leading_inline_data()
            .filter(|d| !d.data.is_empty())
            .ok_or(GenerationError::MissingAudio)?;

        let bytes = decode_base64(&inline.data)?;
        debug!(
            voice = %voice,
            bytes = bytes.len(),
            mime_type = ?inline.mime_type,
            "Received vocal preview"
        );

        Ok(RawAudio::new(bytes, inline.mime_type.clone()))
    }

    async fn health_check(&self) -> Result<(), GenerationError> {
        let url = format!("{}/v1beta/models", self.base_url);

        let response = self
            .authorize(self.client.get(&url).timeout(Duration::from_secs(5)))
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(GenerationError::Api {
                status: response.status().as_u16(),
                message: "Health check failed".to_string(),
            });
        }

        Ok(())
    }
}
