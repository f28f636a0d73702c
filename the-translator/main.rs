use std::process::ExitCode;

use anyhow::{
  Context,
  Result,
};

use crate::{
  cli::CliOptions,
  config::{
    Config,
    ConfigLoadError,
  },
};

mod cli;
mod commands;
mod config;
mod display;
mod logging;
mod paths;

#[tokio::main]
async fn main() -> Result<ExitCode> {
  let options = CliOptions::parse()?;

  paths::initialize_config_file(options.config_file.clone());
  paths::initialize_log_file(options.log_file.clone())
    .context("failed to create the log directory")?;
  logging::setup_logging(options.verbosity, &paths::log_file())?;

  let config = match Config::load_user() {
    Ok(config) => config,
    Err(ConfigLoadError::BadConfig(err)) => {
      return Err(err).with_context(|| {
        format!(
          "bad config in {} or {}",
          paths::config_file().display(),
          paths::workspace_config_file().display()
        )
      });
    },
    Err(err) => {
      log::warn!("falling back to default config: {err}");
      Config::default()
    },
  };
  log::debug!("running {:?} with {config:?}", options.command);

  commands::run(options.command, &config).await
}
