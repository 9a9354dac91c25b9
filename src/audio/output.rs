//! Audio output contexts.
//!
//! An [`AudioOutput`] takes decoded buffers and plays them, handing back a
//! [`Playback`] that resolves once the buffer has finished. The studio creates
//! its output lazily on the first preview and keeps it for the rest of the
//! process.

use super::decode::{AudioBuffer, PcmFormat};
use super::wav::write_wav;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AudioOutputError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Failed to write audio file: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio output is closed")]
    Closed,
}

/// Completion handle for a buffer handed to an [`AudioOutput`].
pub struct Playback {
    done: oneshot::Receiver<()>,
}

impl Playback {
    /// Create a handle plus the sender the output fires when playback ends.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { done: rx })
    }

    /// A playback that has already ended.
    pub fn finished() -> Self {
        let (tx, playback) = Self::channel();
        let _ = tx.send(());
        playback
    }

    /// Wait until playback ends. An output that drops the sender counts as ended.
    pub async fn wait(self) {
        let _ = self.done.await;
    }
}

/// A destination for decoded audio.
pub trait AudioOutput: Send + Sync {
    fn name(&self) -> &str;

    /// Format assumed for payloads that don't describe themselves.
    fn preferred_format(&self) -> PcmFormat {
        PcmFormat::default()
    }

    /// Schedule `buffer` for playback.
    fn play(&self, buffer: AudioBuffer) -> Result<Playback, AudioOutputError>;
}

/// Builds the audio output on first use.
pub type AudioOutputFactory =
    Box<dyn Fn() -> Result<Arc<dyn AudioOutput>, AudioOutputError> + Send + Sync>;

/// Writes every buffer to `<dir>/preview-<n>.wav` instead of a sound device.
pub struct WavFileOutput {
    dir: PathBuf,
    counter: AtomicU64,
}

impl WavFileOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn next_path(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.dir.join(format!("preview-{}.wav", n))
    }
}

impl AudioOutput for WavFileOutput {
    fn name(&self) -> &str {
        "wav"
    }

    fn play(&self, buffer: AudioBuffer) -> Result<Playback, AudioOutputError> {
        let path = self.next_path();
        write_wav(&path, &buffer)?;
        debug!(path = %path.display(), secs = buffer.duration_secs(), "Wrote preview");
        Ok(Playback::finished())
    }
}

#[cfg(feature = "playback")]
pub use device::RodioOutput;

#[cfg(feature = "playback")]
mod device {
    use super::{AudioBuffer, AudioOutput, AudioOutputError, Playback};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, Sink};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use tracing::{debug, warn};

    type Job = (AudioBuffer, oneshot::Sender<()>);

    /// Plays buffers on the default output device.
    ///
    /// The device stream is not `Send`, so it lives on a dedicated thread that
    /// plays queued buffers one after the other for the life of the process.
    pub struct RodioOutput {
        jobs: Mutex<mpsc::Sender<Job>>,
    }

    impl RodioOutput {
        pub fn open() -> Result<Self, AudioOutputError> {
            let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
            let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

            std::thread::Builder::new()
                .name("diffusong-audio".to_string())
                .spawn(move || {
                    let (_stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => {
                            let _ = ready_tx.send(Ok(()));
                            pair
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };

                    while let Ok((buffer, done)) = jobs_rx.recv() {
                        match Sink::try_new(&handle) {
                            Ok(sink) => {
                                debug!(secs = buffer.duration_secs(), "Playing preview");
                                sink.append(SamplesBuffer::new(
                                    buffer.channels,
                                    buffer.sample_rate,
                                    buffer.samples,
                                ));
                                sink.sleep_until_end();
                            }
                            Err(e) => warn!(error = %e, "Failed to open audio sink"),
                        }
                        let _ = done.send(());
                    }
                })
                .map_err(|e| AudioOutputError::Device(e.to_string()))?;

            ready_rx
                .recv()
                .map_err(|_| AudioOutputError::Closed)?
                .map_err(AudioOutputError::Device)?;

            Ok(Self {
                jobs: Mutex::new(jobs_tx),
            })
        }
    }

    impl AudioOutput for RodioOutput {
        fn name(&self) -> &str {
            "device"
        }

        fn play(&self, buffer: AudioBuffer) -> Result<Playback, AudioOutputError> {
            let (done, playback) = Playback::channel();
            self.jobs
                .lock()
                .map_err(|_| AudioOutputError::Closed)?
                .send((buffer, done))
                .map_err(|_| AudioOutputError::Closed)?;
            Ok(playback)
        }
    }
}
