use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::state::AudienceMode;
use crate::services::episode::DEFAULT_CONTEXT_EXCERPT_CHARS;
use crate::services::llm::LlmConfig;
use crate::services::prompt::{DEFAULT_OUTLINE_REFERENCE_CHARS, DEFAULT_REFERENCE_EXCERPT_CHARS};
use crate::services::script::DEFAULT_SPEAKER_MAX_CHARS;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input_folder: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    /// Skip the menus: pick the first documents, generate, export, exit.
    #[serde(default)]
    pub unattended: bool,

    pub llm: LlmConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default)]
    pub mode: AudienceMode,

    #[serde(default = "default_context_excerpt_chars")]
    pub context_excerpt_chars: usize,

    #[serde(default = "default_reference_excerpt_chars")]
    pub reference_excerpt_chars: usize,

    #[serde(default = "default_outline_reference_chars")]
    pub outline_reference_chars: usize,

    #[serde(default = "default_speaker_max_chars")]
    pub speaker_max_chars: usize,

    /// Blocks generated per unattended run.
    #[serde(default = "default_unattended_blocks")]
    pub unattended_blocks: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: AudienceMode::default(),
            context_excerpt_chars: default_context_excerpt_chars(),
            reference_excerpt_chars: default_reference_excerpt_chars(),
            outline_reference_chars: default_outline_reference_chars(),
            speaker_max_chars: default_speaker_max_chars(),
            unattended_blocks: default_unattended_blocks(),
        }
    }
}

fn default_input() -> String {
    "input".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_context_excerpt_chars() -> usize {
    DEFAULT_CONTEXT_EXCERPT_CHARS
}
fn default_reference_excerpt_chars() -> usize {
    DEFAULT_REFERENCE_EXCERPT_CHARS
}
fn default_outline_reference_chars() -> usize {
    DEFAULT_OUTLINE_REFERENCE_CHARS
}
fn default_speaker_max_chars() -> usize {
    DEFAULT_SPEAKER_MAX_CHARS
}
fn default_unattended_blocks() -> usize {
    3
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(CONFIG_FILE, content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        for category in crate::core::state::Category::ALL {
            fs::create_dir_all(Path::new(&self.input_folder).join(category.folder()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let yaml = r#"
llm:
  provider: gemini
  gemini:
    api_key: test-key
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.input_folder, "input");
        assert_eq!(config.output_folder, "output");
        assert!(!config.unattended);
        assert_eq!(config.llm.timeout_seconds, None);
        assert_eq!(config.llm.gemini.unwrap().model, "gemini-3-pro-preview");
        assert_eq!(config.generation.mode, AudienceMode::Male);
        assert_eq!(config.generation.context_excerpt_chars, 500);
        assert_eq!(config.generation.reference_excerpt_chars, 1000);
        assert_eq!(config.generation.outline_reference_chars, 2000);
        assert_eq!(config.generation.speaker_max_chars, 15);
    }

    #[test]
    fn test_generation_overrides() {
        let yaml = r#"
unattended: true
llm:
  provider: ollama
  timeout_seconds: 120
  ollama:
    base_url: http://127.0.0.1:11434
    model: qwen3
generation:
  mode: female
  context_excerpt_chars: 300
  unattended_blocks: 5
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.unattended);
        assert_eq!(config.llm.timeout_seconds, Some(120));
        assert_eq!(config.generation.mode, AudienceMode::Female);
        assert_eq!(config.generation.context_excerpt_chars, 300);
        assert_eq!(config.generation.speaker_max_chars, 15);
        assert_eq!(config.generation.unattended_blocks, 5);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("config.yml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_ensure_directories_creates_category_folders() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::parse("llm:\n  provider: gemini\n").unwrap();
        config.input_folder = dir.path().join("in").to_string_lossy().to_string();
        config.output_folder = dir.path().join("out").to_string_lossy().to_string();
        config.ensure_directories().unwrap();

        assert!(dir.path().join("in/original").is_dir());
        assert!(dir.path().join("in/layout_reference").is_dir());
        assert!(dir.path().join("in/outline_reference").is_dir());
        assert!(dir.path().join("out").is_dir());
    }
}
