//! Response bodies served by the fake generative service.

#![allow(dead_code)]

use super::constants::*;
use base64::Engine;
use serde_json::{json, Value};

/// The scripted song concept, as the concept model would emit it.
pub fn song_json() -> Value {
    json!({
        "title": SONG_TITLE,
        "genre": SONG_GENRE,
        "tempo": SONG_TEMPO,
        "key": SONG_KEY,
        "mood": SONG_MOOD,
        "lyrics": {
            "verse1": "Neon bleeding through the blinds",
            "chorus": SONG_CHORUS,
            "verse2": "Every puddle keeps a secret",
            "bridge": "Slow the tempo, let it drown",
            "outro": "Till the city lights go down"
        },
        "instrumentation": SONG_INSTRUMENTS,
        "compositionalAnalysis": "Moderate entropy keeps the melody close to the blues scale."
    })
}

/// A single-candidate response whose only part is `text`.
pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}

pub fn concept_response() -> Value {
    text_response(&song_json().to_string())
}

/// An image response with a caption before the picture.
pub fn image_response(image: &[u8]) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "Here is your album cover." },
                    {
                        "inlineData": {
                            "mimeType": "image/png",
                            "data": base64::engine::general_purpose::STANDARD.encode(image)
                        }
                    }
                ]
            }
        }]
    })
}

pub fn speech_response(pcm: &[u8]) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "inlineData": {
                        "mimeType": SPEECH_MIME_TYPE,
                        "data": base64::engine::general_purpose::STANDARD.encode(pcm)
                    }
                }]
            }
        }]
    })
}

/// A short 440Hz tone as 16-bit little-endian mono PCM.
pub fn test_pcm() -> Vec<u8> {
    (0..TEST_PCM_SAMPLES)
        .map(|i| {
            let t = i as f32 / 24_000.0;
            ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16
        })
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

pub fn test_png() -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    png.extend_from_slice(&[0u8; 24]);
    png
}
