//! DiffuSong: a latent-space music studio.
//!
//! A natural-language prompt plus five latent dials go to a generative
//! service, which returns a structured song concept and album art. The
//! chorus (or any lyric) can then be sung back as a short vocal preview.

pub mod audio;
pub mod cli_style;
pub mod config;
pub mod genai;
pub mod repl;
pub mod song;
pub mod studio;

// Re-export commonly used types for convenience
pub use genai::{GeminiClient, GenerationError, GenerationService};
pub use song::{LatentParams, SongStructure};
pub use studio::{Studio, StudioSnapshot};
