//! Interactive studio shell.

use crate::audio::write_wav;
use crate::cli_style::{
    self, get_prompt, get_styles, print_error, print_info, print_key_value,
    print_key_value_highlight, print_phase, print_section_footer, print_section_header,
    print_success, print_warning, CommandHelp,
};
use crate::song::{AlbumArt, Dial, VoiceName};
use crate::studio::{GenerationOutcome, PreviewOutcome, SkipReason, Studio, StudioEvent};
use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use rustyline::{
    completion::Completer, highlight::Highlighter, hint::Hinter, history::FileHistory,
    validate::Validator, CompletionType, Config, Editor, Helper,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(styles=get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand, Debug)]
enum InnerCommand {
    /// Sets the musical prompt, or shows it when no text is given.
    Prompt {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Shows the latent dials.
    Params,

    /// Moves one latent dial to a value between 0 and 100.
    Set {
        dial: String,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Composes a song concept and its album art from the prompt and dials.
    Generate,

    /// Shows the last generated song.
    Show,

    /// Sings a lyric excerpt, the chorus of the last song by default.
    Preview {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Writes the album art to a file.
    SaveArt { path: PathBuf },

    /// Writes the last vocal preview to a WAV file.
    SavePreview { path: PathBuf },

    /// Shows the pipeline state.
    Status,

    /// Checks that the generation service is reachable and accepts the API key.
    Ping,

    /// Shows this help.
    Help,

    /// Close this program.
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const COMMANDS_HELP: &[CommandHelp] = &[
    CommandHelp {
        name: "prompt",
        args: "[text]",
        description: "Set or show the musical prompt",
    },
    CommandHelp {
        name: "params",
        args: "",
        description: "Show the latent dials",
    },
    CommandHelp {
        name: "set",
        args: "<dial> <0-100>",
        description: "Move a latent dial",
    },
    CommandHelp {
        name: "generate",
        args: "",
        description: "Compose a song and its album art",
    },
    CommandHelp {
        name: "show",
        args: "",
        description: "Show the last song",
    },
    CommandHelp {
        name: "preview",
        args: "[text]",
        description: "Sing the chorus (or the given text)",
    },
    CommandHelp {
        name: "save-art",
        args: "<path>",
        description: "Write the album art to a file",
    },
    CommandHelp {
        name: "save-preview",
        args: "<path>",
        description: "Write the last preview to a WAV file",
    },
    CommandHelp {
        name: "status",
        args: "",
        description: "Show the pipeline state",
    },
    CommandHelp {
        name: "ping",
        args: "",
        description: "Check the generation service",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Leave the studio",
    },
];

/// Run one generation, printing each phase as the studio reports it.
pub async fn generate_with_progress(studio: &Studio) -> GenerationOutcome {
    let mut events = studio.subscribe();
    let generation = studio.start_generation();
    tokio::pin!(generation);

    loop {
        tokio::select! {
            outcome = &mut generation => {
                while let Ok(event) = events.try_recv() {
                    print_event(&event);
                }
                return outcome;
            }
            Ok(event) = events.recv() => print_event(&event),
        }
    }
}

fn print_event(event: &StudioEvent) {
    if let StudioEvent::PhaseChanged(phase) = event {
        if phase.is_in_flight() {
            print_phase(*phase);
        }
    }
}

/// Write `art` to `path`. Without an extension one is picked from the image bytes.
///
/// Returns the path actually written.
pub fn save_album_art(art: &AlbumArt, path: &Path) -> Result<PathBuf> {
    let (mime_type, data) = match art {
        AlbumArt::Inline { mime_type, data } => (mime_type, data),
        AlbumArt::Url(url) => bail!("Album art is a remote placeholder: {}", url),
    };

    let path = if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let extension = infer::get(data)
            .map(|kind| kind.extension().to_string())
            .or_else(|| mime_type.split('/').nth(1).map(str::to_string))
            .unwrap_or_else(|| "bin".to_string());
        path.with_extension(extension)
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    std::fs::write(&path, data).with_context(|| format!("Failed to write album art: {:?}", path))?;
    Ok(path)
}

/// The text sung by `preview` without arguments.
fn default_preview_text(studio: &Studio) -> Option<String> {
    studio
        .snapshot()
        .song
        .map(|song| song.lyrics.chorus)
        .filter(|chorus| !chorus.trim().is_empty())
}

pub struct Repl {
    studio: Arc<Studio>,
    voice: VoiceName,
    audio_sink: String,
}

impl Repl {
    pub fn new(studio: Arc<Studio>, voice: VoiceName, audio_sink: impl Into<String>) -> Self {
        Self {
            studio,
            voice,
            audio_sink: audio_sink.into(),
        }
    }

    async fn execute_command(&self, line: &str) -> CommandExecutionResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandExecutionResult::Ok;
        }

        let args = shlex::split(line)
            .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

        let cli =
            InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

        let command = match cli {
            Ok(cli) => cli.command,
            Err(e) => {
                if e.print().is_err() {
                    println!("{}", e);
                }
                return CommandExecutionResult::Ok;
            }
        };
        debug!(?command, "Executing command");

        match command {
            InnerCommand::Prompt { text } => {
                if text.is_empty() {
                    let prompt = self.studio.snapshot().prompt;
                    if prompt.is_empty() {
                        print_info("No prompt set");
                    } else {
                        print_key_value_highlight("Prompt", &prompt);
                    }
                    return CommandExecutionResult::Ok;
                }
                if let Err(err) = self.studio.set_prompt(text.join(" ")) {
                    return CommandExecutionResult::Error(err.to_string());
                }
                print_success("Prompt set");
            }
            InnerCommand::Params => cli_style::print_params(&self.studio.snapshot().params),
            InnerCommand::Set { dial, value } => {
                let dial: Dial = match dial.parse() {
                    Ok(dial) => dial,
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                };
                if let Err(err) = self.studio.set_param(dial, value) {
                    return CommandExecutionResult::Error(err.to_string());
                }
                print_success(&format!("{} set to {}", dial.label(), value));
            }
            InnerCommand::Generate => match generate_with_progress(&self.studio).await {
                GenerationOutcome::Completed => {
                    let snapshot = self.studio.snapshot();
                    if let Some(song) = &snapshot.song {
                        cli_style::print_song(song, snapshot.album_art.as_ref());
                    }
                }
                GenerationOutcome::Failed(message) => {
                    return CommandExecutionResult::Error(message)
                }
                GenerationOutcome::Skipped(SkipReason::EmptyPrompt) => {
                    print_warning("Set a prompt first: prompt <text>")
                }
                GenerationOutcome::Skipped(SkipReason::AlreadyRunning) => {
                    print_warning("A generation is already running")
                }
            },
            InnerCommand::Show => {
                let snapshot = self.studio.snapshot();
                match &snapshot.song {
                    Some(song) => cli_style::print_song(song, snapshot.album_art.as_ref()),
                    None => print_info("Nothing generated yet"),
                }
            }
            InnerCommand::Preview { text } => {
                let text = if text.is_empty() {
                    match default_preview_text(&self.studio) {
                        Some(chorus) => chorus,
                        None => {
                            return CommandExecutionResult::Error(
                                "Nothing to preview yet, generate a song or pass some text"
                                    .to_string(),
                            )
                        }
                    }
                } else {
                    text.join(" ")
                };
                match self.studio.play_vocal_preview(&text).await {
                    PreviewOutcome::Playing(_) => {
                        print_info(&format!("Vocal preview by {} started", self.voice))
                    }
                    PreviewOutcome::Skipped => print_warning("A preview is already playing"),
                    // Already logged
                    PreviewOutcome::Failed => {}
                }
            }
            InnerCommand::SaveArt { path } => {
                let Some(art) = self.studio.snapshot().album_art else {
                    return CommandExecutionResult::Error("No album art yet".to_string());
                };
                match save_album_art(&art, &path) {
                    Ok(written) => {
                        print_success(&format!("Album art saved to {}", written.display()))
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{:#}", err)),
                }
            }
            InnerCommand::SavePreview { path } => {
                let Some(buffer) = self.studio.last_preview() else {
                    return CommandExecutionResult::Error("No vocal preview yet".to_string());
                };
                if let Err(err) = write_wav(&path, &buffer) {
                    return CommandExecutionResult::Error(format!(
                        "Failed to write {}: {}",
                        path.display(),
                        err
                    ));
                }
                print_success(&format!(
                    "Preview ({:.1}s) saved to {}",
                    buffer.duration_secs(),
                    path.display()
                ));
            }
            InnerCommand::Status => self.print_status(),
            InnerCommand::Ping => match self.studio.check_service().await {
                Ok(()) => print_success("Generation service reachable"),
                Err(err) if err.is_auth_failure() => {
                    return CommandExecutionResult::Error(
                        "The generation service rejected the API key".to_string(),
                    )
                }
                Err(err) => {
                    return CommandExecutionResult::Error(format!(
                        "Generation service unreachable: {}",
                        err
                    ))
                }
            },
            InnerCommand::Help => cli_style::print_help(COMMANDS_HELP),
            InnerCommand::Exit => return CommandExecutionResult::Exit,
        }
        CommandExecutionResult::Ok
    }

    fn print_status(&self) {
        let snapshot = self.studio.snapshot();
        print_section_header("Studio Status");
        print_key_value_highlight("Phase", snapshot.generation.phase.label());
        print_key_value(
            "Generating",
            if snapshot.generation.is_generating {
                "yes"
            } else {
                "no"
            },
        );
        if let Some(error) = &snapshot.generation.error {
            print_key_value("Last error", error);
        }
        print_key_value(
            "Song",
            snapshot
                .song
                .as_ref()
                .map(|s| s.title.as_str())
                .unwrap_or("none"),
        );
        print_key_value("Voice", self.voice.as_str());
        print_key_value(
            "Audio output",
            &format!(
                "{} ({})",
                self.audio_sink,
                if self.studio.has_audio_context() {
                    "ready"
                } else {
                    "not started"
                }
            ),
        );
        print_key_value(
            "Preview",
            if snapshot.is_audio_playing {
                "playing"
            } else {
                "idle"
            },
        );
        print_section_footer();
    }

    pub async fn run(&self) -> Result<()> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();

        let mut rl = Editor::<ReplHelper, FileHistory>::with_config(config)?;
        rl.set_helper(Some(ReplHelper::new()));

        let prompt = get_prompt();
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match self.execute_command(&line).await {
                        CommandExecutionResult::Ok => {}
                        CommandExecutionResult::Exit => break,
                        CommandExecutionResult::Error(err) => print_error(&err),
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("CTRL-D: exiting.");
                    break;
                }
                Err(e) => {
                    print_error(&format!("{:?}", e));
                    break;
                }
            }
        }
        cli_style::print_goodbye();
        Ok(())
    }
}

struct ReplHelper {
    commands_names: Vec<String>,
    dial_names: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        let commands_names = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();
        let dial_names = Dial::ALL.iter().map(|d| d.as_str().to_string()).collect();

        ReplHelper {
            commands_names,
            dial_names,
        }
    }
}

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let line = &line[..pos];
        // Dial names after `set `
        if let Some(partial) = line.strip_prefix("set ") {
            if partial.contains(' ') {
                return Ok((0, Vec::with_capacity(0)));
            }
            let matches = self
                .dial_names
                .iter()
                .filter(|d| d.starts_with(partial))
                .cloned()
                .collect();
            return Ok((4, matches));
        }
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}
impl Highlighter for ReplHelper {}
impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::GeminiClient;
    use crate::song::LatentParams;
    use tempfile::TempDir;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn parse(line: &str) -> InnerCommand {
        let args = shlex::split(line).unwrap();
        InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)))
            .unwrap()
            .command
    }

    // Nothing here reaches the network: the commands exercised never call the service.
    fn offline_repl() -> Repl {
        let client = GeminiClient::new("http://127.0.0.1:9", None, 1).unwrap();
        let studio = Studio::new(
            Arc::new(client),
            Box::new(|| Err(crate::audio::AudioOutputError::Closed)),
        );
        Repl::new(Arc::new(studio), VoiceName::Kore, "wav")
    }

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            parse("prompt rainy night jazz"),
            InnerCommand::Prompt { text } if text.join(" ") == "rainy night jazz"
        ));
        assert!(matches!(
            parse("prompt \"lofi beats, with -- dashes\""),
            InnerCommand::Prompt { text } if text == vec!["lofi beats, with -- dashes".to_string()]
        ));
        assert!(matches!(
            parse("set melodic-entropy 80"),
            InnerCommand::Set { dial, value: 80 } if dial == "melodic-entropy"
        ));
        assert!(matches!(
            parse("set harmonic-depth -3"),
            InnerCommand::Set { value: -3, .. }
        ));
        assert!(matches!(parse("preview"), InnerCommand::Preview { text } if text.is_empty()));
        assert!(matches!(parse("save-art cover"), InnerCommand::SaveArt { .. }));
        assert!(matches!(parse("exit"), InnerCommand::Exit));
    }

    #[test]
    fn test_inner_cli_is_well_formed() {
        InnerCli::command().debug_assert();
        assert!(matches!(parse("help"), InnerCommand::Help));
        assert!(matches!(parse("ping"), InnerCommand::Ping));
    }

    #[test]
    fn test_help_lists_every_command() {
        let cli = InnerCli::command();
        cli.clone().debug_assert();
        let names: Vec<String> = cli
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();
        for name in &names {
            assert!(
                COMMANDS_HELP.iter().any(|c| c.name == name),
                "{} missing from help",
                name
            );
        }
        assert_eq!(names.len(), COMMANDS_HELP.len());
        assert_eq!(names.iter().filter(|n| *n == "help").count(), 1);
    }

    #[test]
    fn test_save_album_art_infers_extension() {
        let dir = TempDir::new().unwrap();
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0; 16]);
        let art = AlbumArt::Inline {
            mime_type: "image/png".to_string(),
            data: data.clone(),
        };

        let written = save_album_art(&art, &dir.path().join("covers").join("neon")).unwrap();
        assert_eq!(written, dir.path().join("covers").join("neon.png"));
        assert_eq!(std::fs::read(&written).unwrap(), data);

        // Explicit extensions are kept
        let written = save_album_art(&art, &dir.path().join("cover.img")).unwrap();
        assert_eq!(written, dir.path().join("cover.img"));
    }

    #[test]
    fn test_save_album_art_falls_back_to_mime_subtype() {
        let dir = TempDir::new().unwrap();
        let art = AlbumArt::Inline {
            mime_type: "image/webp".to_string(),
            data: vec![1, 2, 3],
        };
        let written = save_album_art(&art, &dir.path().join("cover")).unwrap();
        assert_eq!(written, dir.path().join("cover.webp"));
    }

    #[test]
    fn test_save_placeholder_art_fails() {
        let dir = TempDir::new().unwrap();
        let art = AlbumArt::Url(crate::genai::PLACEHOLDER_ART_URL.to_string());
        let err = save_album_art(&art, &dir.path().join("cover")).unwrap_err();
        assert!(err.to_string().contains("remote placeholder"));
    }

    #[tokio::test]
    async fn test_prompt_and_set_commands() {
        let repl = offline_repl();

        assert_eq!(
            repl.execute_command("prompt rainy night jazz").await,
            CommandExecutionResult::Ok
        );
        assert_eq!(repl.studio.snapshot().prompt, "rainy night jazz");

        assert_eq!(
            repl.execute_command("set diffusion_steps 90").await,
            CommandExecutionResult::Ok
        );
        assert_eq!(repl.studio.snapshot().params.diffusion_steps, 90);

        assert!(matches!(
            repl.execute_command("set tempo 90").await,
            CommandExecutionResult::Error(msg) if msg.contains("Unknown dial")
        ));
        assert!(matches!(
            repl.execute_command("set melodic-entropy 101").await,
            CommandExecutionResult::Error(_)
        ));
        assert_eq!(repl.studio.snapshot().params, {
            let mut params = LatentParams::default();
            params.diffusion_steps = 90;
            params
        });

        assert_eq!(repl.execute_command("   ").await, CommandExecutionResult::Ok);
        assert_eq!(repl.execute_command("exit").await, CommandExecutionResult::Exit);
    }

    #[tokio::test]
    async fn test_commands_without_results() {
        let repl = offline_repl();

        // Empty prompt: generate is refused without touching the network
        assert_eq!(
            repl.execute_command("generate").await,
            CommandExecutionResult::Ok
        );
        assert!(repl.studio.snapshot().song.is_none());

        assert!(matches!(
            repl.execute_command("preview").await,
            CommandExecutionResult::Error(msg) if msg.contains("Nothing to preview")
        ));
        assert!(matches!(
            repl.execute_command("save-art cover.png").await,
            CommandExecutionResult::Error(_)
        ));
        assert!(matches!(
            repl.execute_command("save-preview out.wav").await,
            CommandExecutionResult::Error(_)
        ));
        assert!(!repl.studio.has_audio_context());
    }

    #[tokio::test]
    async fn test_preview_with_broken_output_is_silent() {
        let repl = offline_repl();
        assert_eq!(
            repl.execute_command("preview hello there").await,
            CommandExecutionResult::Ok
        );
        assert!(!repl.studio.is_audio_playing());
        assert!(repl.studio.snapshot().generation.error.is_none());
    }

    #[tokio::test]
    async fn test_help_and_ping_commands() {
        let repl = offline_repl();
        assert_eq!(repl.execute_command("help").await, CommandExecutionResult::Ok);
        assert!(matches!(
            repl.execute_command("ping").await,
            CommandExecutionResult::Error(msg) if msg.starts_with("Generation service unreachable")
        ));
    }
}
