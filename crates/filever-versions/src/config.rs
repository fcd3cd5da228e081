//! Configuration for the version store.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/filever/filever.json(c)`
//! 2. Environment variable: `FILEVER_CONFIG_CONTENT`
//! 3. Project config: `filever.jsonc` or `filever.json` in the project directory
//!
//! JSONC comments are allowed and `{env:VAR_NAME}` is replaced with the
//! value of the environment variable.

use filever_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Environment variable holding inline JSONC configuration.
pub const CONFIG_CONTENT_ENV: &str = "FILEVER_CONFIG_CONTENT";

const MAX_CONTEXT_LINES: usize = 100;

static VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn var_regex() -> &'static regex::Regex {
    VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{env:([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },

    /// Environment variable not found during substitution.
    #[error("environment variable not found: {name}")]
    EnvVarNotFound { name: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Version store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Versions kept by cleanup, in addition to version 1. Used by auto
    /// cleanup and by `cleanup_default`.
    pub keep_versions: usize,

    /// Run cleanup after every new version.
    pub auto_cleanup: bool,

    /// Context lines in unified diffs.
    pub diff_context_lines: usize,

    /// Characters shown per section in change summaries.
    pub preview_chars: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            keep_versions: 5,
            auto_cleanup: false,
            diff_context_lines: 3,
            preview_chars: 100,
            log_level: None,
        }
    }
}

/// Partially specified configuration as read from one source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    keep_versions: Option<usize>,
    auto_cleanup: Option<bool>,
    diff_context_lines: Option<usize>,
    preview_chars: Option<usize>,
    log_level: Option<LogLevel>,
}

impl VersionsConfig {
    /// Load configuration from all sources.
    ///
    /// Returns the merged configuration and the files it was read from.
    pub async fn load(project_dir: Option<&Path>) -> ConfigResult<(Self, Vec<PathBuf>)> {
        let mut config = Self::default();
        let mut sources = Vec::new();

        if let Some(global_dir) = Self::global_config_dir() {
            if let Some(path) = Self::first_existing(&global_dir) {
                config = config.merge(Self::load_layer(&path).await?);
                sources.push(path);
            }
        }

        if let Ok(content) = std::env::var(CONFIG_CONTENT_ENV) {
            let content = Self::substitute_variables(&content)?;
            config = config.merge(Self::parse_jsonc(&content, "<env>")?);
        }

        if let Some(dir) = project_dir {
            if let Some(path) = Self::first_existing(dir) {
                config = config.merge(Self::load_layer(&path).await?);
                sources.push(path);
            }
        }

        config.validate()?;
        Ok((config, sources))
    }

    /// Load a single configuration file on top of the defaults.
    pub async fn load_file(path: &Path) -> ConfigResult<Self> {
        let config = Self::default().merge(Self::load_layer(path).await?);
        config.validate()?;
        Ok(config)
    }

    /// Global config directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("filever");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("filever"))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.diff_context_lines > MAX_CONTEXT_LINES {
            return Err(ConfigError::Validation {
                message: format!(
                    "diff_context_lines must be at most {MAX_CONTEXT_LINES}, got {}",
                    self.diff_context_lines
                ),
            });
        }
        if self.auto_cleanup && self.keep_versions == 0 {
            return Err(ConfigError::Validation {
                message: "keep_versions must be at least 1 when auto_cleanup is enabled".to_string(),
            });
        }
        Ok(())
    }

    fn first_existing(dir: &Path) -> Option<PathBuf> {
        ["filever.jsonc", "filever.json"]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    async fn load_layer(path: &Path) -> ConfigResult<ConfigLayer> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::substitute_variables(&content)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(v) = layer.keep_versions {
            self.keep_versions = v;
        }
        if let Some(v) = layer.auto_cleanup {
            self.auto_cleanup = v;
        }
        if let Some(v) = layer.diff_context_lines {
            self.diff_context_lines = v;
        }
        if let Some(v) = layer.preview_chars {
            self.preview_chars = v;
        }
        if layer.log_level.is_some() {
            self.log_level = layer.log_level;
        }
        self
    }

    fn parse_jsonc(content: &str, source: &str) -> ConfigResult<ConfigLayer> {
        let stripped = strip_comments(content);
        serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    fn substitute_variables(content: &str) -> ConfigResult<String> {
        let mut result = content.to_string();
        for cap in var_regex().captures_iter(content) {
            let (Some(full), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str()).map_err(|_| ConfigError::EnvVarNotFound {
                name: name.as_str().to_string(),
            })?;
            result = result.replace(full.as_str(), &value);
        }
        Ok(result)
    }
}

/// Strip `//` and `/* */` comments outside of string literals.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }

        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // Keep line numbers stable for error messages
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}
