use crate::config::{Format, LoggingConfig, LoggingConfigRaw, process_raw_config};
use crate::error::{Error, Result};
use crate::InitResult;

use std::{
  env,
  fs::File,
  io,
  path::{Path, PathBuf},
};

use tracing::Dispatch;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
  filter::EnvFilter,
  fmt::MakeWriter,
  prelude::*,
  Layer, Registry,
};

const DEFAULT_CONFIG_BASE_NAME: &str = "gallery_logging";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Finds the configuration file in the working directory.
///
/// Looks for `gallery_logging.<env>.yaml` and then `gallery_logging.yaml`,
/// taking `<env>` from the argument, `GALLERY_ENV` or `APP_ENV`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Like [`find_config_file`], searching `dir`.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("GALLERY_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{DEFAULT_CONFIG_BASE_NAME}.{env_str}.{DEFAULT_CONFIG_EXTENSION}"));
    }
  }
  files_to_check.push(format!("{DEFAULT_CONFIG_BASE_NAME}.{DEFAULT_CONFIG_EXTENSION}"));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check GALLERY_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Reads a YAML config and installs the global subscriber.
pub fn init_from_file(config_path: &Path) -> Result<InitResult> {
  let file = File::open(config_path)?;
  let raw: LoggingConfigRaw =
    serde_yaml::from_reader(io::BufReader::new(file)).map_err(|e| Error::ConfigParse(e.to_string()))?;
  let config = process_raw_config(raw)?;
  init(&config)
}

/// Installs the global subscriber and bridges `log` records into it.
pub fn init(config: &LoggingConfig) -> Result<InitResult> {
  let (dispatch, result) = build_dispatch(config)?;

  tracing_log::LogTracer::init().map_err(|e| Error::LogBridgeInit(e.to_string()))?;
  tracing::dispatcher::set_global_default(dispatch).map_err(|e| Error::GlobalSubscriberSet(e.to_string()))?;

  tracing::debug!(level = %config.level, file = config.file.is_some(), "logging initialized");
  Ok(result)
}

/// Builds the subscriber without installing it.
///
/// The returned [`InitResult`] owns the file writer's worker; output is
/// flushed when it drops.
pub fn build_dispatch(config: &LoggingConfig) -> Result<(Dispatch, InitResult)> {
  let mut layers: Vec<BoxedLayer> = Vec::new();
  let mut result = InitResult::new();

  if config.console {
    layers.push(fmt_layer(config.format, config.ansi, io::stdout));
  }

  if let Some(file) = &config.file {
    if !file.directory.exists() {
      std::fs::create_dir_all(&file.directory).map_err(|e| {
        Error::AppenderSetup(format!("Failed to create directory {:?}: {}", file.directory, e))
      })?;
    }
    let appender = RollingFileAppender::builder()
      .rotation(file.rotation.clone())
      .filename_prefix(&file.file_name_prefix)
      .build(&file.directory)
      .map_err(|e| Error::AppenderSetup(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    result.guards.push(guard);
    layers.push(fmt_layer(config.format, false, writer));
  }

  let subscriber = tracing_subscriber::registry().with(layers).with(env_filter(config)?);
  Ok((Dispatch::new(subscriber), result))
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
  EnvFilter::builder()
    .with_default_directive(config.level.into())
    .parse(config.directives.join(","))
    .map_err(|e| Error::InvalidConfigValue {
      field: "filter".to_string(),
      message: e.to_string(),
    })
}

fn fmt_layer<W>(format: Format, ansi: bool, writer: W) -> BoxedLayer
where
  W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
  let layer = tracing_subscriber::fmt::layer()
    .with_ansi(ansi)
    .with_target(true)
    .with_writer(writer);
  match format {
    Format::Pattern => layer.boxed(),
    Format::Json => layer.json().boxed(),
  }
}
