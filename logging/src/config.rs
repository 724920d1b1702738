use crate::error::{Error, Result};

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::Directive;

// --- Raw, as written in YAML ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfigRaw {
  #[serde(default = "default_level")]
  pub level: String,
  /// Extra per-target directives in `EnvFilter` syntax, e.g. `gallery_cache=trace`.
  #[serde(default)]
  pub filter: Vec<String>,
  #[serde(default)]
  pub format: FormatRaw,
  #[serde(default = "default_true")]
  pub ansi: bool,
  #[serde(default = "default_true")]
  pub console: bool,
  #[serde(default)]
  pub file: Option<FileConfigRaw>,
}

impl Default for LoggingConfigRaw {
  fn default() -> Self {
    Self {
      level: default_level(),
      filter: Vec::new(),
      format: FormatRaw::default(),
      ansi: true,
      console: true,
      file: None,
    }
  }
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatRaw {
  #[default]
  Pattern,
  Json,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfigRaw {
  pub directory: String,
  #[serde(default = "default_file_name_prefix")]
  pub file_name_prefix: String,
  #[serde(default = "default_rotation")]
  pub rotation: String,
}

fn default_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_file_name_prefix() -> String {
  "gallery.log".to_string()
}

fn default_rotation() -> String {
  "daily".to_string()
}

// --- Processed ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Pattern,
  Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileConfig {
  pub directory: PathBuf,
  pub file_name_prefix: String,
  pub rotation: Rotation,
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
  pub level: LevelFilter,
  pub directives: Vec<String>,
  pub format: Format,
  pub ansi: bool,
  pub console: bool,
  pub file: Option<FileConfig>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: LevelFilter::INFO,
      directives: Vec::new(),
      format: Format::Pattern,
      ansi: true,
      console: true,
      file: None,
    }
  }
}

impl LoggingConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let raw: LoggingConfigRaw = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    process_raw_config(raw)
  }
}

pub fn process_raw_config(raw: LoggingConfigRaw) -> Result<LoggingConfig> {
  let level = LevelFilter::from_str(&raw.level).map_err(|_| Error::InvalidConfigValue {
    field: "level".to_string(),
    message: format!("'{}' is not a valid level", raw.level),
  })?;

  for directive in &raw.filter {
    Directive::from_str(directive).map_err(|e| Error::InvalidConfigValue {
      field: "filter".to_string(),
      message: format!("'{directive}': {e}"),
    })?;
  }

  let file = raw.file.map(process_file_config).transpose()?;
  if !raw.console && file.is_none() {
    return Err(Error::InvalidConfigValue {
      field: "console".to_string(),
      message: "console output is disabled and no file is configured".to_string(),
    });
  }

  Ok(LoggingConfig {
    level,
    directives: raw.filter,
    format: match raw.format {
      FormatRaw::Pattern => Format::Pattern,
      FormatRaw::Json => Format::Json,
    },
    ansi: raw.ansi,
    console: raw.console,
    file,
  })
}

fn process_file_config(raw: FileConfigRaw) -> Result<FileConfig> {
  if raw.directory.is_empty() {
    return Err(Error::InvalidConfigValue {
      field: "file.directory".to_string(),
      message: "must not be empty".to_string(),
    });
  }
  Ok(FileConfig {
    directory: PathBuf::from(raw.directory),
    file_name_prefix: raw.file_name_prefix,
    rotation: parse_rotation(&raw.rotation)?,
  })
}

fn parse_rotation(value: &str) -> Result<Rotation> {
  match value.to_lowercase().as_str() {
    "minutely" => Ok(Rotation::MINUTELY),
    "hourly" => Ok(Rotation::HOURLY),
    "daily" => Ok(Rotation::DAILY),
    "never" => Ok(Rotation::NEVER),
    _ => Err(Error::InvalidConfigValue {
      field: "file.rotation".to_string(),
      message: format!("'{value}' is not one of minutely, hourly, daily, never"),
    }),
  }
}
