//! Raw PCM payload decoding.

use thiserror::Error;

/// Sample rate of the speech model's output when the payload doesn't say otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

const BYTES_PER_SAMPLE: usize = 2;

/// Errors raised while turning a raw payload into an [`AudioBuffer`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No audio data")]
    Empty,

    #[error("Audio payload of {len} bytes is not a whole number of {frame_size}-byte frames")]
    Misaligned { len: usize, frame_size: usize },

    #[error("Unsupported audio encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Audio bytes as returned by the speech call, already base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudio {
    pub data: Vec<u8>,
    /// MIME type reported by the service, e.g. `audio/L16;codec=pcm;rate=24000`.
    pub mime_type: Option<String>,
}

impl RawAudio {
    pub fn new(data: Vec<u8>, mime_type: Option<String>) -> Self {
        Self { data, mime_type }
    }
}

/// Layout of signed 16-bit little-endian PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
        }
    }
}

impl PcmFormat {
    /// Bytes in one frame (one sample per channel).
    pub fn frame_size(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Read the format out of a MIME type, using `fallback` for missing parameters.
    ///
    /// Accepts `audio/L16` and `audio/pcm`; anything else is unsupported.
    pub fn from_mime(mime: Option<&str>, fallback: PcmFormat) -> Result<Self, DecodeError> {
        let Some(mime) = mime.map(str::trim).filter(|m| !m.is_empty()) else {
            return Ok(fallback);
        };

        let mut pieces = mime.split(';').map(str::trim);
        let essence = pieces.next().unwrap_or_default().to_ascii_lowercase();
        if essence != "audio/l16" && essence != "audio/pcm" {
            return Err(DecodeError::UnsupportedEncoding(mime.to_string()));
        }

        let mut format = fallback;
        for param in pieces {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "rate" => {
                    format.sample_rate = value
                        .parse::<u32>()
                        .ok()
                        .filter(|r| *r > 0)
                        .ok_or_else(|| DecodeError::UnsupportedEncoding(mime.to_string()))?;
                }
                "channels" => {
                    format.channels = value
                        .parse::<u16>()
                        .ok()
                        .filter(|c| *c > 0)
                        .ok_or_else(|| DecodeError::UnsupportedEncoding(mime.to_string()))?;
                }
                "codec" if !value.eq_ignore_ascii_case("pcm") => {
                    return Err(DecodeError::UnsupportedEncoding(mime.to_string()));
                }
                _ => {}
            }
        }
        Ok(format)
    }
}

/// Decoded, playable audio: interleaved samples in `[-1.0, 1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a raw speech payload into an [`AudioBuffer`].
///
/// `fallback` is the audio context's preferred format, used for anything the
/// payload's MIME type leaves unspecified.
pub fn decode(raw: &RawAudio, fallback: PcmFormat) -> Result<AudioBuffer, DecodeError> {
    if raw.data.is_empty() {
        return Err(DecodeError::Empty);
    }

    let format = PcmFormat::from_mime(raw.mime_type.as_deref(), fallback)?;
    let frame_size = format.frame_size();
    if raw.data.len() % frame_size != 0 {
        return Err(DecodeError::Misaligned {
            len: raw.data.len(),
            frame_size,
        });
    }

    let samples = raw
        .data
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioBuffer {
        samples,
        channels: format.channels,
        sample_rate: format.sample_rate,
    })
}
