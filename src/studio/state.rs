//! Generation state machine.

use crate::audio::AudioBuffer;
use crate::song::{AlbumArt, LatentParams, SongStructure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when a failure carries no message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Latent space collapse. Please try again.";

/// Stage of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    /// Nothing running; also the state after a failure.
    #[default]
    Idle,
    /// Waiting for the song concept.
    Composing,
    /// Waiting for the album art.
    Visualizing,
    /// Waiting for synthesized audio.
    Synthesizing,
    Completed,
}

impl GenerationPhase {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationPhase::Idle => "idle",
            GenerationPhase::Composing => "composing",
            GenerationPhase::Visualizing => "visualizing",
            GenerationPhase::Synthesizing => "synthesizing",
            GenerationPhase::Completed => "completed",
        }
    }

    /// Whether a remote call is outstanding in this phase.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            GenerationPhase::Composing
                | GenerationPhase::Visualizing
                | GenerationPhase::Synthesizing
        )
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress and outcome of the current generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    pub is_generating: bool,
    pub phase: GenerationPhase,
    pub error: Option<String>,
}

impl GenerationState {
    /// idle/completed -> composing.
    pub fn begin(&mut self) {
        self.is_generating = true;
        self.phase = GenerationPhase::Composing;
        self.error = None;
    }

    /// Move to the next in-flight phase.
    pub fn advance(&mut self, phase: GenerationPhase) {
        debug_assert!(self.is_generating && phase.is_in_flight());
        self.phase = phase;
    }

    pub fn complete(&mut self) {
        self.is_generating = false;
        self.phase = GenerationPhase::Completed;
        self.error = None;
    }

    /// Abort back to idle with a user-facing message.
    pub fn fail(&mut self, message: &str) {
        self.is_generating = false;
        self.phase = GenerationPhase::Idle;
        self.error = Some(user_message(message));
    }
}

/// The message shown to the user for a failure.
pub fn user_message(message: &str) -> String {
    if message.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

/// Everything the user sees, as of one moment.
#[derive(Debug, Clone, Default)]
pub struct StudioSnapshot {
    pub params: LatentParams,
    pub prompt: String,
    pub song: Option<SongStructure>,
    pub album_art: Option<AlbumArt>,
    pub generation: GenerationState,
    pub is_audio_playing: bool,
}

/// State guarded by the studio's lock. `is_audio_playing` lives in an atomic instead.
#[derive(Debug, Default)]
pub(crate) struct StudioState {
    pub params: LatentParams,
    pub prompt: String,
    pub song: Option<SongStructure>,
    pub album_art: Option<AlbumArt>,
    pub generation: GenerationState,
    pub last_preview: Option<AudioBuffer>,
}

/// Notifications published by the studio as its state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    PhaseChanged(GenerationPhase),
    Completed { title: String },
    Failed { message: String },
    PreviewStarted,
    PreviewFinished,
}
