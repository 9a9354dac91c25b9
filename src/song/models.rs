//! Song concept models shared by the generation client and the studio.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound for every latent dial.
pub const DIAL_MAX: u8 = 100;

/// Errors raised when editing latent parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Unknown dial: {0}")]
    UnknownDial(String),

    #[error("{dial} must be between 0 and {max}, got {value}")]
    OutOfRange { dial: Dial, value: i64, max: u8 },
}

/// One of the five user-facing latent dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dial {
    MelodicEntropy,
    HarmonicDepth,
    RhythmicDensity,
    EmotionalVariance,
    DiffusionSteps,
}

impl Dial {
    pub const ALL: [Dial; 5] = [
        Dial::MelodicEntropy,
        Dial::HarmonicDepth,
        Dial::RhythmicDensity,
        Dial::EmotionalVariance,
        Dial::DiffusionSteps,
    ];

    /// Kebab-case name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dial::MelodicEntropy => "melodic-entropy",
            Dial::HarmonicDepth => "harmonic-depth",
            Dial::RhythmicDensity => "rhythmic-density",
            Dial::EmotionalVariance => "emotional-variance",
            Dial::DiffusionSteps => "diffusion-steps",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Dial::MelodicEntropy => "Melodic Entropy",
            Dial::HarmonicDepth => "Harmonic Depth",
            Dial::RhythmicDensity => "Rhythmic Density",
            Dial::EmotionalVariance => "Emotional Variance",
            Dial::DiffusionSteps => "Diffusion Steps",
        }
    }
}

impl fmt::Display for Dial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dial {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Dial::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ParamError::UnknownDial(s.to_string()))
    }
}

/// The five latent dials steering a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatentParams {
    pub melodic_entropy: u8,
    pub harmonic_depth: u8,
    pub rhythmic_density: u8,
    pub emotional_variance: u8,
    pub diffusion_steps: u8,
}

impl Default for LatentParams {
    fn default() -> Self {
        Self {
            melodic_entropy: 45,
            harmonic_depth: 60,
            rhythmic_density: 50,
            emotional_variance: 70,
            diffusion_steps: 50,
        }
    }
}

impl LatentParams {
    pub fn get(&self, dial: Dial) -> u8 {
        match dial {
            Dial::MelodicEntropy => self.melodic_entropy,
            Dial::HarmonicDepth => self.harmonic_depth,
            Dial::RhythmicDensity => self.rhythmic_density,
            Dial::EmotionalVariance => self.emotional_variance,
            Dial::DiffusionSteps => self.diffusion_steps,
        }
    }

    /// Set a dial, rejecting values outside `0..=100`.
    pub fn set(&mut self, dial: Dial, value: i64) -> Result<(), ParamError> {
        if !(0..=DIAL_MAX as i64).contains(&value) {
            return Err(ParamError::OutOfRange {
                dial,
                value,
                max: DIAL_MAX,
            });
        }
        let value = value as u8;
        match dial {
            Dial::MelodicEntropy => self.melodic_entropy = value,
            Dial::HarmonicDepth => self.harmonic_depth = value,
            Dial::RhythmicDensity => self.rhythmic_density = value,
            Dial::EmotionalVariance => self.emotional_variance = value,
            Dial::DiffusionSteps => self.diffusion_steps = value,
        }
        Ok(())
    }

    /// Check every dial is within range. Used for values coming from config files.
    pub fn validate(&self) -> Result<(), ParamError> {
        for dial in Dial::ALL {
            let value = self.get(dial);
            if value > DIAL_MAX {
                return Err(ParamError::OutOfRange {
                    dial,
                    value: value as i64,
                    max: DIAL_MAX,
                });
            }
        }
        Ok(())
    }
}

/// The five lyric sections of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub verse1: String,
    pub chorus: String,
    pub verse2: String,
    pub bridge: String,
    pub outro: String,
}

impl Lyrics {
    /// Sections in display order, paired with their titles.
    pub fn sections(&self) -> [(&'static str, &str); 5] {
        [
            ("Verse I", self.verse1.as_str()),
            ("Chorus", self.chorus.as_str()),
            ("Verse II", self.verse2.as_str()),
            ("Bridge", self.bridge.as_str()),
            ("Outro", self.outro.as_str()),
        ]
    }
}

/// A generated song concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongStructure {
    pub title: String,
    pub genre: String,
    /// Beats per minute.
    pub tempo: u32,
    pub key: String,
    pub mood: String,
    pub lyrics: Lyrics,
    pub instrumentation: Vec<String>,
    pub compositional_analysis: String,
}

impl SongStructure {
    /// Name of the first required field that is blank, if any.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("title");
        }
        let lyrics = [
            ("lyrics.verse1", &self.lyrics.verse1),
            ("lyrics.chorus", &self.lyrics.chorus),
            ("lyrics.verse2", &self.lyrics.verse2),
            ("lyrics.bridge", &self.lyrics.bridge),
            ("lyrics.outro", &self.lyrics.outro),
        ];
        if let Some((name, _)) = lyrics.iter().find(|(_, text)| text.trim().is_empty()) {
            return Some(name);
        }
        if self.instrumentation.is_empty() {
            return Some("instrumentation");
        }
        None
    }
}

/// Album art returned by the image call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumArt {
    /// Image bytes produced by the service.
    Inline { mime_type: String, data: Vec<u8> },
    /// A remote image, used when the service returned no image.
    Url(String),
}

impl AlbumArt {
    /// A reference usable wherever an image source is expected: a data URI or a URL.
    pub fn to_uri(&self) -> String {
        use base64::Engine as _;
        match self {
            AlbumArt::Inline { mime_type, data } => format!(
                "data:{};base64,{}",
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(data)
            ),
            AlbumArt::Url(url) => url.clone(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, AlbumArt::Inline { .. })
    }
}

/// Prebuilt voices offered by the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum VoiceName {
    #[default]
    Kore,
    Puck,
    Zephyr,
}

impl VoiceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceName::Kore => "Kore",
            VoiceName::Puck => "Puck",
            VoiceName::Zephyr => "Zephyr",
        }
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) fn sample_song() -> SongStructure {
    SongStructure {
        title: "Neon Drizzle".to_string(),
        genre: "Jazz Noir".to_string(),
        tempo: 84,
        key: "D minor".to_string(),
        mood: "Melancholic".to_string(),
        lyrics: Lyrics {
            verse1: "Streetlights hum beneath the rain".to_string(),
            chorus: "Drizzle on the neon, wash the night away".to_string(),
            verse2: "Saxophone whispers through the haze".to_string(),
            bridge: "Hold the silence, let it stay".to_string(),
            outro: "Fading footsteps, break of day".to_string(),
        },
        instrumentation: vec!["Upright Bass".to_string(), "Muted Trumpet".to_string()],
        compositional_analysis: "High harmonic depth yields extended chords.".to_string(),
    }
}
