use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use diffusong::audio::{AudioOutput, AudioOutputFactory, WavFileOutput};
use diffusong::cli_style::{self, get_styles, print_success, print_warning};
use diffusong::config::{
    AppConfig, AudioSink, CliConfig, FileConfig, DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT_SEC,
};
use diffusong::genai::{GeminiClient, GeminiModels, DEFAULT_BASE_URL, PLACEHOLDER_ART_URL};
use diffusong::repl::{generate_with_progress, save_album_art, Repl};
use diffusong::song::{Dial, VoiceName};
use diffusong::studio::{GenerationOutcome, PreviewOutcome, SkipReason, Studio};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "diffusong", version = env!("APP_VERSION"), styles = get_styles())]
/// Compose songs from a prompt and five latent dials.
struct CliArgs {
    /// Path to a TOML config file. Values in the file override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// API key for the generative service. Falls back to GEMINI_API_KEY, then API_KEY.
    #[clap(long)]
    pub api_key: Option<String>,

    /// Base URL of the generative service.
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used for song concepts.
    #[clap(long)]
    pub concept_model: Option<String>,

    /// Model used for album art.
    #[clap(long)]
    pub image_model: Option<String>,

    /// Model used for vocal previews.
    #[clap(long)]
    pub speech_model: Option<String>,

    /// Prebuilt voice that sings the previews.
    #[clap(long, value_enum, default_value_t = VoiceName::Kore)]
    pub voice: VoiceName,

    /// Timeout in seconds for each request to the generative service.
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SEC)]
    pub timeout_sec: u64,

    /// Album art used when the image model returns no picture.
    #[clap(long, default_value = PLACEHOLDER_ART_URL)]
    pub placeholder_art_url: String,

    /// Directory for generated files.
    #[clap(long, default_value = DEFAULT_OUTPUT_DIR, value_parser = parse_path)]
    pub output_dir: PathBuf,

    /// Where vocal previews are played.
    #[clap(long, value_enum)]
    pub audio_sink: Option<AudioSink>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one song and exit instead of opening the studio shell.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Describe the music.
    #[clap(long)]
    pub prompt: String,

    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub melodic_entropy: Option<u8>,

    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub harmonic_depth: Option<u8>,

    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub rhythmic_density: Option<u8>,

    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub emotional_variance: Option<u8>,

    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub diffusion_steps: Option<u8>,

    /// Write the album art here.
    #[clap(long, value_parser = parse_path)]
    pub save_art: Option<PathBuf>,

    /// Sing the chorus once the song is ready.
    #[clap(long)]
    pub preview: bool,
}

impl GenerateArgs {
    fn dial_overrides(&self) -> Vec<(Dial, u8)> {
        [
            (Dial::MelodicEntropy, self.melodic_entropy),
            (Dial::HarmonicDepth, self.harmonic_depth),
            (Dial::RhythmicDensity, self.rhythmic_density),
            (Dial::EmotionalVariance, self.emotional_variance),
            (Dial::DiffusionSteps, self.diffusion_steps),
        ]
        .into_iter()
        .filter_map(|(dial, value)| value.map(|v| (dial, v)))
        .collect()
    }
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        let defaults = GeminiModels::default();
        CliConfig {
            api_key: self
                .api_key
                .clone()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .or_else(|| std::env::var("API_KEY").ok()),
            base_url: self.base_url.clone(),
            models: GeminiModels {
                concept: self.concept_model.clone().unwrap_or(defaults.concept),
                image: self.image_model.clone().unwrap_or(defaults.image),
                speech: self.speech_model.clone().unwrap_or(defaults.speech),
            },
            voice: self.voice,
            request_timeout_sec: self.timeout_sec,
            placeholder_art_url: self.placeholder_art_url.clone(),
            output_dir: self.output_dir.clone(),
            audio_sink: self.audio_sink.unwrap_or_default(),
        }
    }
}

fn init_logging(default_level: LevelFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(feature = "playback")]
fn device_output_factory() -> AudioOutputFactory {
    Box::new(|| {
        let output = diffusong::audio::RodioOutput::open()?;
        Ok(Arc::new(output) as Arc<dyn AudioOutput>)
    })
}

#[cfg(not(feature = "playback"))]
fn device_output_factory() -> AudioOutputFactory {
    Box::new(|| {
        Err(diffusong::audio::AudioOutputError::Device(
            "built without the `playback` feature".to_string(),
        ))
    })
}

fn audio_output_factory(config: &AppConfig) -> AudioOutputFactory {
    match config.audio_sink {
        AudioSink::Device => device_output_factory(),
        AudioSink::Wav => {
            let dir = config.previews_dir();
            Box::new(move || Ok(Arc::new(WavFileOutput::new(dir.clone())) as Arc<dyn AudioOutput>))
        }
    }
}

fn build_studio(config: &AppConfig) -> Result<Studio> {
    let client = GeminiClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.request_timeout_sec,
    )?
    .with_models(config.models.clone())
    .with_placeholder_art_url(config.placeholder_art_url.clone());

    info!(
        base_url = client.base_url(),
        concept_model = %config.models.concept,
        image_model = %config.models.image,
        speech_model = %config.models.speech,
        "Generation client ready"
    );

    Ok(Studio::new(Arc::new(client), audio_output_factory(config))
        .with_voice(config.voice)
        .with_params(config.params))
}

async fn run_generate(studio: Studio, config: &AppConfig, args: GenerateArgs) -> Result<()> {
    studio.set_prompt(args.prompt.clone())?;
    for (dial, value) in args.dial_overrides() {
        studio.set_param(dial, value as i64)?;
    }

    match generate_with_progress(&studio).await {
        GenerationOutcome::Completed => {}
        GenerationOutcome::Failed(message) => bail!(message),
        GenerationOutcome::Skipped(SkipReason::EmptyPrompt) => {
            bail!("The prompt must not be empty")
        }
        GenerationOutcome::Skipped(SkipReason::AlreadyRunning) => {
            bail!("A generation is already running")
        }
    }

    let snapshot = studio.snapshot();
    let Some(song) = snapshot.song else {
        bail!("Generation completed without a song");
    };
    cli_style::print_song(&song, snapshot.album_art.as_ref());

    if let (Some(path), Some(art)) = (&args.save_art, &snapshot.album_art) {
        let written = save_album_art(art, path)?;
        print_success(&format!("Album art saved to {}", written.display()));
    }

    if args.preview {
        match studio.play_vocal_preview(&song.lyrics.chorus).await {
            PreviewOutcome::Playing(handle) => {
                handle.await.context("Preview task failed")?;
                if config.audio_sink == AudioSink::Wav {
                    print_success(&format!(
                        "Vocal preview written to {}",
                        config.previews_dir().display()
                    ));
                }
            }
            PreviewOutcome::Skipped => print_warning("Nothing to preview"),
            PreviewOutcome::Failed => bail!("Vocal preview failed, see the log for details"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // Keep the shell readable unless asked otherwise
    let default_level = if cli_args.command.is_some() {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    init_logging(default_level)?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", config.output_dir))?;
    if config.api_key.is_none() {
        print_warning("No API key configured, requests will be rejected by the service");
    }

    let studio = build_studio(&config)?;

    match cli_args.command {
        Some(Command::Generate(args)) => run_generate(studio, &config, args).await,
        None => {
            let sink = match config.audio_sink {
                AudioSink::Device => "device".to_string(),
                AudioSink::Wav => format!("wav files in {}", config.previews_dir().display()),
            };
            cli_style::print_welcome(&[
                ("Service", config.base_url.as_str()),
                ("Voice", config.voice.as_str()),
                ("Previews", sink.as_str()),
                ("Version", env!("APP_VERSION")),
            ]);
            Repl::new(Arc::new(studio), config.voice, sink).run().await
        }
    }
}
