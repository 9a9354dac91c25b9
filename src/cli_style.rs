use crate::song::{AlbumArt, Dial, LatentParams, SongStructure, DIAL_MAX};
use crate::studio::GenerationPhase;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const CYAN: Color = Color::Rgb {
        r: 34,
        g: 211,
        b: 238,
    };
    pub const PURPLE: Color = Color::Rgb {
        r: 168,
        g: 85,
        b: 247,
    };
    pub const PINK: Color = Color::Rgb {
        r: 236,
        g: 72,
        b: 153,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 74,
        g: 222,
        b: 128,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 251,
        g: 146,
        b: 60,
    };
    pub const RED: Color = Color::Rgb {
        r: 248,
        g: 113,
        b: 113,
    };
    pub const BLUE: Color = Color::Rgb {
        r: 96,
        g: 165,
        b: 250,
    };
    pub const DIM: Color = Color::Rgb {
        r: 113,
        g: 113,
        b: 122,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 244,
        g: 244,
        b: 245,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const DOUBLE_TOP_LEFT: &str = "╔";
    pub const DOUBLE_TOP_RIGHT: &str = "╗";
    pub const DOUBLE_BOTTOM_LEFT: &str = "╚";
    pub const DOUBLE_BOTTOM_RIGHT: &str = "╝";
    pub const DOUBLE_HORIZONTAL: &str = "═";
    pub const DOUBLE_VERTICAL: &str = "║";

    pub const SINGLE_HORIZONTAL: &str = "─";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const ARROW_RIGHT: &str = "▶";
    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
    pub const NOTE: &str = "♪";

    pub const METER_FULL: &str = "█";
    pub const METER_EMPTY: &str = "░";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Banner
// ═══════════════════════════════════════════════════════════════════════════════

const BANNER: &str = r#"
  ██████╗ ██╗███████╗███████╗██╗   ██╗███████╗ ██████╗ ███╗   ██╗ ██████╗
  ██╔══██╗██║██╔════╝██╔════╝██║   ██║██╔════╝██╔═══██╗████╗  ██║██╔════╝
  ██║  ██║██║█████╗  █████╗  ██║   ██║███████╗██║   ██║██╔██╗ ██║██║  ███╗
  ██║  ██║██║██╔══╝  ██╔══╝  ██║   ██║╚════██║██║   ██║██║╚██╗██║██║   ██║
  ██████╔╝██║██║     ██║     ╚██████╔╝███████║╚██████╔╝██║ ╚████║╚██████╔╝
  ╚═════╝ ╚═╝╚═╝     ╚═╝      ╚═════╝ ╚══════╝ ╚═════╝ ╚═╝  ╚═══╝ ╚═════╝"#;

pub fn print_banner() {
    // Print with gradient effect
    let lines: Vec<&str> = BANNER.lines().collect();
    let gradient_colors = [
        colors::CYAN,
        colors::CYAN,
        colors::BLUE,
        colors::PURPLE,
        colors::PURPLE,
        colors::PINK,
        colors::PINK,
    ];

    for (i, line) in lines.iter().enumerate() {
        let color = gradient_colors.get(i).unwrap_or(&colors::CYAN);
        println!("{}", line.with(*color).bold());
    }

    let subtitle = "  ═══════════════════════  LATENT MUSIC STUDIO  ══════════════════════";
    println!("{}", subtitle.with(colors::DIM));
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.to_string().with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    println!(
        " {} {}",
        box_chars::CROSS_MARK.to_string().with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

pub fn print_info(message: &str) {
    println!(
        " {} {}",
        "ℹ".with(colors::BLUE).bold(),
        message.with(colors::BLUE)
    );
}

/// One line per pipeline phase, printed as the studio reports it.
pub fn print_phase(phase: GenerationPhase) {
    let (color, text) = match phase {
        GenerationPhase::Idle => (colors::DIM, "Idle"),
        GenerationPhase::Composing => (colors::CYAN, "Composing song concept..."),
        GenerationPhase::Visualizing => (colors::PURPLE, "Visualizing album art..."),
        GenerationPhase::Synthesizing => (colors::PINK, "Synthesizing audio..."),
        GenerationPhase::Completed => (colors::GREEN, "Generation complete"),
    };
    println!(
        " {} {}",
        box_chars::NOTE.with(color).bold(),
        text.with(color).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Section Headers
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_section_header(title: &str) {
    let width: usize = 60;
    let title_len = title.width();
    let padding = width.saturating_sub(title_len + 4) / 2;

    println!();
    print!("{}", box_chars::ROUND_TOP_LEFT.with(colors::PURPLE));
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(padding)
            .with(colors::PURPLE)
    );
    print!(
        " {} ",
        title.with(colors::PURPLE).bold().attribute(Attribute::Italic)
    );
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(width.saturating_sub(title_len + 4 + padding))
            .with(colors::PURPLE)
    );
    println!("{}", box_chars::ROUND_TOP_RIGHT.with(colors::PURPLE));
}

pub fn print_section_footer() {
    let width = 60;
    print!("{}", box_chars::ROUND_BOTTOM_LEFT.with(colors::PURPLE));
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(width)
            .with(colors::PURPLE)
    );
    println!("{}", box_chars::ROUND_BOTTOM_RIGHT.with(colors::PURPLE));
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Key-Value Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::PURPLE),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::DIAMOND.with(colors::PINK),
        format!("{}:", key).with(colors::CYAN).bold(),
        value.with(colors::GREEN).bold()
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// List Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_list_item(item: &str, indent: usize) {
    let indent_str = "  ".repeat(indent);
    println!(
        "{}{}  {}",
        indent_str,
        box_chars::ARROW_RIGHT.with(colors::CYAN),
        item.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Studio Display
// ═══════════════════════════════════════════════════════════════════════════════

const METER_WIDTH: usize = 20;

/// Horizontal meter for a dial value, e.g. `█████░░░░░...`.
pub fn dial_meter(value: u8) -> String {
    let filled = (value.min(DIAL_MAX) as usize * METER_WIDTH + DIAL_MAX as usize / 2)
        / DIAL_MAX as usize;
    format!(
        "{}{}",
        box_chars::METER_FULL.repeat(filled),
        box_chars::METER_EMPTY.repeat(METER_WIDTH - filled)
    )
}

pub fn print_params(params: &LatentParams) {
    print_section_header("Latent Parameters");
    let label_width = Dial::ALL.iter().map(|d| d.label().width()).max().unwrap_or(0);
    for dial in Dial::ALL {
        let value = params.get(dial);
        let label = dial.label();
        println!(
            "  {}{}  {} {}  {}",
            label.with(colors::WHITE),
            " ".repeat(label_width - label.width()),
            dial_meter(value).with(colors::CYAN),
            format!("{:>3}", value).with(colors::GREEN).bold(),
            dial.as_str().with(colors::DIM)
        );
    }
    print_section_footer();
}

pub fn print_song(song: &SongStructure, art: Option<&AlbumArt>) {
    print_section_header(&song.title);
    print_key_value_highlight("Genre", &song.genre);
    print_key_value("Tempo", &format!("{} BPM", song.tempo));
    print_key_value("Key", &song.key);
    print_key_value("Mood", &song.mood);
    match art {
        Some(AlbumArt::Inline { mime_type, data }) => {
            print_key_value("Album art", &format!("{} ({} bytes)", mime_type, data.len()))
        }
        Some(AlbumArt::Url(url)) => print_key_value("Album art", url),
        None => {}
    }

    println!();
    println!("  {}", "Instrumentation".with(colors::PURPLE).bold());
    if song.instrumentation.is_empty() {
        print_empty_list("none listed");
    }
    for instrument in &song.instrumentation {
        print_list_item(instrument, 1);
    }

    for (name, text) in song.lyrics.sections() {
        println!();
        println!("  {}", name.with(colors::PINK).bold());
        for line in text.lines() {
            println!("    {}", line.with(colors::WHITE));
        }
    }

    println!();
    println!("  {}", "Compositional Analysis".with(colors::PURPLE).bold());
    println!(
        "    {}",
        song.compositional_analysis
            .as_str()
            .with(colors::DIM)
            .attribute(Attribute::Italic)
    );
    print_section_footer();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt Styling
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_prompt() -> String {
    format!(
        "{}{}{} ",
        "♪".with(colors::CYAN).bold(),
        "♪".with(colors::PURPLE).bold(),
        "❯".with(colors::PINK).bold(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Welcome Message
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_welcome(lines: &[(&str, &str)]) {
    print_banner();

    let box_width = 64;

    // Top border
    print!("  {}", box_chars::DOUBLE_TOP_LEFT.with(colors::PURPLE));
    print!(
        "{}",
        box_chars::DOUBLE_HORIZONTAL
            .repeat(box_width)
            .with(colors::PURPLE)
    );
    println!("{}", box_chars::DOUBLE_TOP_RIGHT.with(colors::PURPLE));

    for (key, value) in lines {
        print!("  {}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));
        let content = format!("  {} {}", format!("{}:", key).with(colors::DIM), value);
        let visible_len = key.width() + 2 + value.width() + 2;
        print!("{}", content);
        print!("{}", " ".repeat(box_width.saturating_sub(visible_len)));
        println!("{}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));
    }

    print!("  {}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));
    print!("{}", " ".repeat(box_width));
    println!("{}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));

    print!("  {}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));
    let help_msg = "  Type 'help' for available commands";
    print!("{}", help_msg.with(colors::DIM));
    print!("{}", " ".repeat(box_width - help_msg.len()));
    println!("{}", box_chars::DOUBLE_VERTICAL.with(colors::PURPLE));

    // Bottom border
    print!("  {}", box_chars::DOUBLE_BOTTOM_LEFT.with(colors::PURPLE));
    print!(
        "{}",
        box_chars::DOUBLE_HORIZONTAL
            .repeat(box_width)
            .with(colors::PURPLE)
    );
    println!("{}", box_chars::DOUBLE_BOTTOM_RIGHT.with(colors::PURPLE));
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Help Display
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub fn print_help(commands: &[CommandHelp]) {
    println!();
    print_section_header("Available Commands");
    println!();

    let compose_commands: Vec<_> = commands
        .iter()
        .filter(|c| matches!(c.name, "prompt" | "params" | "set" | "generate"))
        .collect();

    let result_commands: Vec<_> = commands
        .iter()
        .filter(|c| {
            matches!(
                c.name,
                "show" | "preview" | "save-art" | "save-preview" | "status"
            )
        })
        .collect();

    let system_commands: Vec<_> = commands
        .iter()
        .filter(|c| matches!(c.name, "ping" | "help" | "exit"))
        .collect();

    fn print_command_group(title: &str, commands: &[&CommandHelp], color: CtColor) {
        println!(
            "  {} {}",
            box_chars::DIAMOND.with(color),
            title.with(color).bold()
        );
        for cmd in commands {
            println!(
                "      {} {}  {}",
                cmd.name.with(colors::GREEN).bold(),
                cmd.args.with(colors::DIM),
                cmd.description.with(colors::WHITE)
            );
        }
        println!();
    }

    print_command_group("Compose", &compose_commands, colors::CYAN);
    print_command_group("Results", &result_commands, colors::PINK);
    print_command_group("System", &system_commands, colors::ORANGE);

    print_section_footer();
}

pub fn print_goodbye() {
    println!();
    println!(
        "  {} {}",
        box_chars::NOTE.with(colors::CYAN),
        "Fading out. Thanks for using DiffuSong".with(colors::PURPLE).bold()
    );
    println!();
}
