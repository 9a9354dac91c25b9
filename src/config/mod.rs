mod file_config;

pub use file_config::{FileConfig, ModelsConfig, ParamsConfig};

use crate::genai::{GeminiModels, DEFAULT_BASE_URL, PLACEHOLDER_ART_URL};
use crate::song::{Dial, LatentParams, VoiceName};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 120;
pub const DEFAULT_OUTPUT_DIR: &str = "diffusong-output";

/// Where vocal previews go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSink {
    /// The default sound device (requires the `playback` feature).
    Device,
    /// Numbered WAV files in the output directory.
    Wav,
}

impl AudioSink {
    pub fn available() -> bool {
        cfg!(feature = "playback")
    }
}

impl Default for AudioSink {
    fn default() -> Self {
        if Self::available() {
            AudioSink::Device
        } else {
            AudioSink::Wav
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: GeminiModels,
    pub voice: VoiceName,
    pub request_timeout_sec: u64,
    pub placeholder_art_url: String,
    pub output_dir: PathBuf,
    pub audio_sink: AudioSink,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: GeminiModels::default(),
            voice: VoiceName::default(),
            request_timeout_sec: DEFAULT_REQUEST_TIMEOUT_SEC,
            placeholder_art_url: PLACEHOLDER_ART_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            audio_sink: AudioSink::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Missing keys are not an error here; requests will be rejected by the service.
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: GeminiModels,
    pub voice: VoiceName,
    pub request_timeout_sec: u64,
    pub placeholder_art_url: String,
    pub output_dir: PathBuf,
    pub audio_sink: AudioSink,
    /// Starting position of the dials.
    pub params: LatentParams,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let api_key = file
            .api_key
            .or_else(|| cli.api_key.clone())
            .filter(|k| !k.trim().is_empty());

        let base_url = file.base_url.unwrap_or_else(|| cli.base_url.clone());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("base_url must be an http(s) URL, got {:?}", base_url);
        }

        let voice = match file.voice {
            Some(name) => parse_voice(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown voice in config file: {:?}", name))?,
            None => cli.voice,
        };

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than 0");
        }

        let placeholder_art_url = file
            .placeholder_art_url
            .unwrap_or_else(|| cli.placeholder_art_url.clone());

        let output_dir = file
            .output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.output_dir.clone());
        check_creatable_dir(&output_dir)?;

        let audio_sink = match file.audio_sink {
            Some(name) => parse_audio_sink(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown audio_sink in config file: {:?}", name))?,
            None => cli.audio_sink,
        };
        if audio_sink == AudioSink::Device && !AudioSink::available() {
            bail!("audio_sink \"device\" requires a build with the `playback` feature");
        }

        // Models - each one falls back to the CLI value independently
        let models_file = file.models.unwrap_or_default();
        let models = GeminiModels {
            concept: models_file
                .concept
                .unwrap_or_else(|| cli.models.concept.clone()),
            image: models_file.image.unwrap_or_else(|| cli.models.image.clone()),
            speech: models_file
                .speech
                .unwrap_or_else(|| cli.models.speech.clone()),
        };

        let params = resolve_params(file.params.unwrap_or_default())?;

        Ok(Self {
            api_key,
            base_url,
            models,
            voice,
            request_timeout_sec,
            placeholder_art_url,
            output_dir,
            audio_sink,
            params,
        })
    }

    /// Directory used by the WAV sink.
    pub fn previews_dir(&self) -> PathBuf {
        self.output_dir.join("previews")
    }
}

/// An existing directory, or a path whose nearest existing ancestor is a directory.
fn check_creatable_dir(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("output_dir is not a directory: {:?}", path);
        }
        return Ok(());
    }
    // An empty ancestor is the working directory of a relative path
    let ancestor = path
        .ancestors()
        .skip(1)
        .find(|p| p.as_os_str().is_empty() || p.exists());
    match ancestor {
        Some(p) if !p.as_os_str().is_empty() && !p.is_dir() => bail!(
            "output_dir {:?} cannot be created: {:?} is not a directory",
            path,
            p
        ),
        _ => Ok(()),
    }
}

fn resolve_params(file: ParamsConfig) -> Result<LatentParams> {
    let mut params = LatentParams::default();
    let entries = [
        (Dial::MelodicEntropy, file.melodic_entropy),
        (Dial::HarmonicDepth, file.harmonic_depth),
        (Dial::RhythmicDensity, file.rhythmic_density),
        (Dial::EmotionalVariance, file.emotional_variance),
        (Dial::DiffusionSteps, file.diffusion_steps),
    ];
    for (dial, value) in entries {
        if let Some(value) = value {
            params
                .set(dial, value)
                .with_context(|| "Invalid [params] in config file")?;
        }
    }
    Ok(params)
}

/// Parses a voice name case-insensitively.
/// Uses clap's ValueEnum trait for parsing.
fn parse_voice(s: &str) -> Option<VoiceName> {
    VoiceName::from_str(s, true).ok()
}

fn parse_audio_sink(s: &str) -> Option<AudioSink> {
    AudioSink::from_str(s, true).ok()
}
