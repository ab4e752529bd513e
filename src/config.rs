use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use av3a::process::extract::ExtractorConfig;
use serde::{Deserialize, Serialize};

use crate::cli::command::Cli;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings loaded from `--config`. Command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub chunk_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frame_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub role_flags: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_us: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_size: None,
            language: None,
            role_flags: 0,
            format_id: None,
            start_time_us: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        Self::from_yaml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;

        anyhow::ensure!(config.chunk_size > 0, "chunk_size must be positive");

        Ok(config)
    }

    /// File settings, if any, overridden by the global command line flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(chunk_size) = cli.chunk_size {
            anyhow::ensure!(chunk_size > 0, "--chunk-size must be positive");
            config.chunk_size = chunk_size;
        }

        if cli.start_time.is_some() {
            config.start_time_us = cli.start_time;
        }

        Ok(config)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            format_id: self.format_id.clone(),
            language: self.language.clone(),
            role_flags: self.role_flags,
            max_frame_size: self.max_frame_size,
        }
    }
}

#[test]
fn partial_yaml_keeps_defaults() {
    let config = Config::from_yaml("language: zho\nstart_time_us: 40000\n").unwrap();

    assert_eq!(config.language.as_deref(), Some("zho"));
    assert_eq!(config.start_time_us, Some(40000));
    assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.max_frame_size, None);

    let extractor = config.extractor_config();
    assert_eq!(extractor.language.as_deref(), Some("zho"));
    assert_eq!(extractor.max_frame_size, None);

    let capped = Config::from_yaml("max_frame_size: 4096\n").unwrap();
    assert_eq!(capped.extractor_config().max_frame_size, Some(4096));
}

#[test]
fn rejects_bad_config() {
    assert!(Config::from_yaml("chunk_size: 0\n").is_err());
    assert!(Config::from_yaml("chunk_sise: 10\n").is_err());
}
