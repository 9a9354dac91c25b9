//! The studio: owner of all user-facing state.

use super::state::{
    user_message, GenerationPhase, StudioEvent, StudioSnapshot, StudioState,
};
use crate::audio::{
    decode, AudioBuffer, AudioOutput, AudioOutputError, AudioOutputFactory, DecodeError, Playback,
};
use crate::genai::{GenerationError, GenerationService};
use crate::song::{Dial, LatentParams, ParamError, VoiceName};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::{broadcast, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors returned by the studio's editing operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudioError {
    #[error("A generation is in progress")]
    Busy,

    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Why a vocal preview failed. Only ever logged.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Audio output unavailable: {0}")]
    Output(#[from] AudioOutputError),

    #[error("Speech generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Audio decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Why `start_generation` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRunning,
    EmptyPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    /// The error message now shown to the user.
    Failed(String),
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum PreviewOutcome {
    /// Playback started; the handle finishes once it has ended and the flag is cleared.
    Playing(JoinHandle<()>),
    /// Another preview is playing or there was nothing to read.
    Skipped,
    /// The preview could not be produced. The reason has been logged.
    Failed,
}

/// Owns the prompt, dials, results and playback flag, and sequences the
/// generation pipeline.
pub struct Studio {
    service: Arc<dyn GenerationService>,
    voice: VoiceName,
    state: Mutex<StudioState>,
    is_audio_playing: Arc<AtomicBool>,
    audio: OnceCell<Arc<dyn AudioOutput>>,
    audio_factory: AudioOutputFactory,
    events: broadcast::Sender<StudioEvent>,
}

impl Studio {
    pub fn new(service: Arc<dyn GenerationService>, audio_factory: AudioOutputFactory) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            service,
            voice: VoiceName::default(),
            state: Mutex::new(StudioState::default()),
            is_audio_playing: Arc::new(AtomicBool::new(false)),
            audio: OnceCell::new(),
            audio_factory,
            events,
        }
    }

    pub fn with_voice(mut self, voice: VoiceName) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_params(self, params: LatentParams) -> Self {
        self.lock_state().params = params;
        self
    }

    /// Subscribe to state change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        let state = self.lock_state();
        StudioSnapshot {
            params: state.params,
            prompt: state.prompt.clone(),
            song: state.song.clone(),
            album_art: state.album_art.clone(),
            generation: state.generation.clone(),
            is_audio_playing: self.is_audio_playing(),
        }
    }

    pub fn is_audio_playing(&self) -> bool {
        self.is_audio_playing.load(Ordering::SeqCst)
    }

    /// Whether the audio output has been created yet.
    pub fn has_audio_context(&self) -> bool {
        self.audio.initialized()
    }

    /// The most recently decoded preview.
    pub fn last_preview(&self) -> Option<AudioBuffer> {
        self.lock_state().last_preview.clone()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) -> Result<(), StudioError> {
        let mut state = self.lock_state();
        if state.generation.is_generating {
            return Err(StudioError::Busy);
        }
        state.prompt = prompt.into();
        Ok(())
    }

    pub fn set_params(&self, params: LatentParams) -> Result<(), StudioError> {
        params.validate()?;
        let mut state = self.lock_state();
        if state.generation.is_generating {
            return Err(StudioError::Busy);
        }
        state.params = params;
        Ok(())
    }

    pub fn set_param(&self, dial: Dial, value: i64) -> Result<(), StudioError> {
        let mut state = self.lock_state();
        if state.generation.is_generating {
            return Err(StudioError::Busy);
        }
        state.params.set(dial, value)?;
        Ok(())
    }

    /// Ask the generation service whether it is reachable and accepts our key.
    pub async fn check_service(&self) -> Result<(), GenerationError> {
        let result = self.service.health_check().await;
        match &result {
            Ok(()) => debug!(service = self.service.name(), "Health check passed"),
            Err(e) => warn!(service = self.service.name(), error = %e, "Health check failed"),
        }
        result
    }

    /// Run the concept -> art pipeline for the current prompt and dials.
    ///
    /// Does nothing while another run is in flight or when the prompt is blank.
    /// Song and art are committed together, only once both calls succeed.
    pub async fn start_generation(&self) -> GenerationOutcome {
        let (prompt, params) = {
            let mut state = self.lock_state();
            if state.generation.is_generating {
                debug!("Generation already in progress, ignoring request");
                return GenerationOutcome::Skipped(SkipReason::AlreadyRunning);
            }
            if state.prompt.trim().is_empty() {
                debug!("Empty prompt, ignoring generation request");
                return GenerationOutcome::Skipped(SkipReason::EmptyPrompt);
            }
            state.generation.begin();
            state.song = None;
            state.album_art = None;
            (state.prompt.clone(), state.params)
        };
        self.emit(StudioEvent::PhaseChanged(GenerationPhase::Composing));
        info!(prompt = %prompt, service = self.service.name(), "Composing song concept");

        let song = match self.service.generate_song_concept(&prompt, &params).await {
            Ok(song) => song,
            Err(e) => return self.fail_generation(e),
        };

        self.lock_state()
            .generation
            .advance(GenerationPhase::Visualizing);
        self.emit(StudioEvent::PhaseChanged(GenerationPhase::Visualizing));
        info!(title = %song.title, "Visualizing album art");

        let art = match self.service.generate_album_art(&prompt, &song).await {
            Ok(art) => art,
            Err(e) => return self.fail_generation(e),
        };

        let title = song.title.clone();
        {
            let mut state = self.lock_state();
            state.song = Some(song);
            state.album_art = Some(art);
            state.generation.complete();
        }
        self.emit(StudioEvent::PhaseChanged(GenerationPhase::Completed));
        self.emit(StudioEvent::Completed {
            title: title.clone(),
        });
        info!(title = %title, "Generation completed");

        GenerationOutcome::Completed
    }

    fn fail_generation(&self, err: GenerationError) -> GenerationOutcome {
        error!(error = %err, "Generation failed");
        let message = user_message(&err.to_string());
        {
            let mut state = self.lock_state();
            state.song = None;
            state.album_art = None;
            state.generation.fail(&message);
        }
        self.emit(StudioEvent::PhaseChanged(GenerationPhase::Idle));
        self.emit(StudioEvent::Failed {
            message: message.clone(),
        });
        GenerationOutcome::Failed(message)
    }

    /// Synthesize and play `text`.
    ///
    /// At most one preview plays at a time. Failures are logged and clear the
    /// playing flag, they never reach the generation error slot.
    pub async fn play_vocal_preview(&self, text: &str) -> PreviewOutcome {
        if text.trim().is_empty() {
            return PreviewOutcome::Skipped;
        }
        if self
            .is_audio_playing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Preview already playing, ignoring request");
            return PreviewOutcome::Skipped;
        }

        match self.render_preview(text).await {
            Ok(playback) => {
                self.emit(StudioEvent::PreviewStarted);
                let playing = self.is_audio_playing.clone();
                let events = self.events.clone();
                PreviewOutcome::Playing(tokio::spawn(async move {
                    playback.wait().await;
                    playing.store(false, Ordering::SeqCst);
                    let _ = events.send(StudioEvent::PreviewFinished);
                }))
            }
            Err(e) => {
                error!(error = %e, "Audio playback error");
                self.is_audio_playing.store(false, Ordering::SeqCst);
                PreviewOutcome::Failed
            }
        }
    }

    async fn render_preview(&self, text: &str) -> Result<Playback, PreviewError> {
        let output = self.audio_context().await?;
        let raw = self.service.generate_vocal_preview(text, self.voice).await?;
        let buffer = decode(&raw, output.preferred_format())?;
        debug!(
            secs = buffer.duration_secs(),
            output = output.name(),
            "Decoded vocal preview"
        );
        self.lock_state().last_preview = Some(buffer.clone());
        Ok(output.play(buffer)?)
    }

    async fn audio_context(&self) -> Result<Arc<dyn AudioOutput>, AudioOutputError> {
        self.audio
            .get_or_try_init(|| async {
                let output = (self.audio_factory)()?;
                info!(output = output.name(), "Audio output created");
                Ok::<_, AudioOutputError>(output)
            })
            .await
            .cloned()
    }

    fn emit(&self, event: StudioEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, StudioState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Studio state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
