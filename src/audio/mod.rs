//! Audio decoding and output for vocal previews.

mod decode;
mod output;
mod wav;

pub use decode::{decode, AudioBuffer, DecodeError, PcmFormat, RawAudio, DEFAULT_SAMPLE_RATE};
#[cfg(feature = "playback")]
pub use output::RodioOutput;
pub use output::{AudioOutput, AudioOutputError, AudioOutputFactory, Playback, WavFileOutput};
pub use wav::write_wav;
