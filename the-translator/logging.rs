use std::path::Path;

use anyhow::{
  Context,
  Result,
};
use log::LevelFilter;

pub fn level_for(verbosity: u8) -> LevelFilter {
  match verbosity {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

/// Routes all `log` output to `log_file` with a timestamp per line.
pub fn setup_logging(verbosity: u8, log_file: &Path) -> Result<()> {
  let file = fern::log_file(log_file)
    .with_context(|| format!("failed to open log file {}", log_file.display()))?;

  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .level(level_for(verbosity))
    .chain(file)
    .apply()
    .context("logger already initialized")?;

  Ok(())
}
