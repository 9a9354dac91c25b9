use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub voice: Option<String>,
    pub request_timeout_sec: Option<u64>,
    pub placeholder_art_url: Option<String>,
    pub output_dir: Option<String>,
    pub audio_sink: Option<String>,

    pub models: Option<ModelsConfig>,
    pub params: Option<ParamsConfig>,
}

/// `[models]` section.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    pub concept: Option<String>,
    pub image: Option<String>,
    pub speech: Option<String>,
}

/// `[params]` section: starting position of the latent dials.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ParamsConfig {
    pub melodic_entropy: Option<i64>,
    pub harmonic_depth: Option<i64>,
    pub rhythmic_density: Option<i64>,
    pub emotional_variance: Option<i64>,
    pub diffusion_steps: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "from-file"
voice = "puck"

[models]
concept = "gemini-2.5-pro"

[params]
diffusion_steps = 90
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.voice.as_deref(), Some("puck"));
        let models = config.models.unwrap();
        assert_eq!(models.concept.as_deref(), Some("gemini-2.5-pro"));
        assert!(models.image.is_none());
        assert_eq!(config.params.unwrap().diffusion_steps, Some(90));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_sec = \"soon\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/diffusong.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
