//! Generation orchestration.
//!
//! [`Studio`] holds the prompt, the latent dials, the last generated song and
//! its artwork, and sequences calls to the [`GenerationService`](crate::genai::GenerationService).

mod controller;
mod state;

pub use controller::{
    GenerationOutcome, PreviewError, PreviewOutcome, SkipReason, Studio, StudioError,
};
pub use state::{
    user_message, GenerationPhase, GenerationState, StudioEvent, StudioSnapshot,
    FALLBACK_ERROR_MESSAGE,
};
