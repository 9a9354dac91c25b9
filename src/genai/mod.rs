//! Remote generation client.
//!
//! This module provides a trait-based abstraction over the generative
//! service, allowing the studio to work against the Gemini REST API in
//! production and against scripted fakes in tests. It includes:
//! - The `GenerationService` trait and its error type
//! - A reqwest-backed Gemini implementation
//! - The prompts and response schema sent to the models

mod gemini;
mod prompts;
mod provider;
mod types;

pub use gemini::{
    GeminiClient, GeminiModels, DEFAULT_BASE_URL, DEFAULT_CONCEPT_MODEL, DEFAULT_IMAGE_MODEL,
    DEFAULT_SPEECH_MODEL,
};
pub use prompts::PLACEHOLDER_ART_URL;
pub use provider::{GenerationError, GenerationService};
