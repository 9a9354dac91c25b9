//! Common test infrastructure
//!
//! End-to-end tests run the real `GeminiClient` against an in-process fake of
//! the generative service. Tests should only import from this module, not
//! from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeGemini, TEST_PROMPT};
//!
//! #[tokio::test]
//! async fn test_concept() {
//!     let server = FakeGemini::spawn().await;
//!     let song = server
//!         .client()
//!         .generate_song_concept(TEST_PROMPT, &Default::default())
//!         .await
//!         .unwrap();
//!     assert!(!song.title.is_empty());
//! }
//! ```

mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    concept_response, image_response, song_json, speech_response, test_pcm, test_png,
    text_response,
};
#[allow(unused_imports)]
pub use server::{FakeGemini, FakeReply, RecordedRequest};
