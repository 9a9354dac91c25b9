//! Shared constants for end-to-end tests
//!
//! When the scripted song or credentials change, update only this file.

#![allow(dead_code)]

// ============================================================================
// Credentials
// ============================================================================

/// The only key the fake service accepts
pub const TEST_API_KEY: &str = "test-api-key";

/// Message returned for a missing or wrong key
pub const INVALID_KEY_MESSAGE: &str = "API key not valid. Please pass a valid API key.";

// ============================================================================
// Scripted song
// ============================================================================

pub const TEST_PROMPT: &str = "rainy night jazz";

pub const SONG_TITLE: &str = "Midnight Rain Protocol";
pub const SONG_GENRE: &str = "Noir Jazz";
pub const SONG_TEMPO: u32 = 72;
pub const SONG_KEY: &str = "F minor";
pub const SONG_MOOD: &str = "Wistful";
pub const SONG_CHORUS: &str = "Rain on the wire, hum me to sleep";
pub const SONG_INSTRUMENTS: [&str; 3] = ["Brushed Snare", "Rhodes Piano", "Tenor Saxophone"];

// ============================================================================
// Media payloads
// ============================================================================

/// PNG file signature, enough for type sniffing
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const SPEECH_MIME_TYPE: &str = "audio/L16;codec=pcm;rate=24000";

/// Samples in the scripted vocal preview (0.1s at 24kHz)
pub const TEST_PCM_SAMPLES: usize = 2400;
