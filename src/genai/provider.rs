//! Generation service trait definition.

use crate::audio::RawAudio;
use crate::song::{AlbumArt, LatentParams, SongStructure, VoiceName};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("The generation service returned an empty response")]
    EmptyResponse,

    #[error("Generated song is missing required field: {0}")]
    IncompleteSong(&'static str),

    #[error("Audio generation failed")]
    MissingAudio,

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

impl GenerationError {
    /// Whether the service rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GenerationError::Api { status, .. } if *status == 401 || *status == 403)
    }
}

/// The three generative capabilities the studio relies on.
///
/// Each call is a single request/response exchange: no retries, no backoff.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Get the service's name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Produce a structured song concept from a free-text prompt and the latent dials.
    async fn generate_song_concept(
        &self,
        prompt: &str,
        params: &LatentParams,
    ) -> Result<SongStructure, GenerationError>;

    /// Produce a square cover image for `song`.
    ///
    /// Falls back to a placeholder URL when the service returns no image.
    async fn generate_album_art(
        &self,
        prompt: &str,
        song: &SongStructure,
    ) -> Result<AlbumArt, GenerationError>;

    /// Synthesize `text` with one of the prebuilt voices.
    async fn generate_vocal_preview(
        &self,
        text: &str,
        voice: VoiceName,
    ) -> Result<RawAudio, GenerationError>;

    /// Check if the service is reachable and accepts our credentials.
    async fn health_check(&self) -> Result<(), GenerationError>;
}
