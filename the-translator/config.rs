use std::{
  fmt,
  fs,
  io::Error as IOError,
  time::Duration,
};

use serde::Deserialize;
use the_segment::navigation::VisibilityFilter;
use the_session::{
  SessionConfig,
  backend::DEFAULT_EXPORT_NAME,
  http::DEFAULT_BASE_URL,
};
use toml::{
  Value,
  de::Error as TomlError,
};

use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BackendConfig {
  pub url:          String,
  pub timeout_secs: u64,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url:          DEFAULT_BASE_URL.to_string(),
      timeout_secs: 30,
    }
  }
}

impl BackendConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditorConfig {
  /// Hide units whose source is empty or whitespace only.
  pub hide_empty_sources:  bool,
  /// Check marker counts locally before sending a save.
  pub preflight_tag_check: bool,
  pub default_export_name: String,
}

impl Default for EditorConfig {
  fn default() -> Self {
    Self {
      hide_empty_sources:  true,
      preflight_tag_check: true,
      default_export_name: DEFAULT_EXPORT_NAME.to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
  pub backend: BackendConfig,
  pub editor:  EditorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
  backend: Option<Value>,
  editor:  Option<Value>,
}

#[derive(Debug)]
pub enum ConfigLoadError {
  BadConfig(TomlError),
  Error(IOError),
}

impl fmt::Display for ConfigLoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadConfig(err) => write!(f, "bad config: {err}"),
      Self::Error(err) => write!(f, "failed to read config: {err}"),
    }
  }
}

impl std::error::Error for ConfigLoadError {}

impl Config {
  /// Merges the workspace-local config onto the global one. A file that is
  /// missing or unreadable is skipped; a file that does not parse is an
  /// error.
  pub fn load(
    global: Result<String, ConfigLoadError>,
    local: Result<String, ConfigLoadError>,
  ) -> Result<Config, ConfigLoadError> {
    let global_config: Result<ConfigRaw, ConfigLoadError> =
      global.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));
    let local_config: Result<ConfigRaw, ConfigLoadError> =
      local.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));

    let config = match (global_config, local_config) {
      (Ok(global), Ok(local)) => {
        Config {
          backend: merge_section(global.backend, local.backend)?,
          editor:  merge_section(global.editor, local.editor)?,
        }
      },
      (_, Err(ConfigLoadError::BadConfig(err))) | (Err(ConfigLoadError::BadConfig(err)), _) => {
        return Err(ConfigLoadError::BadConfig(err));
      },
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => {
        Config {
          backend: merge_section(config.backend, None)?,
          editor:  merge_section(config.editor, None)?,
        }
      },
      (Err(err), Err(_)) => return Err(err),
    };

    Ok(config)
  }

  /// Loads the user's global config and the workspace config, falling back
  /// to defaults when neither exists.
  pub fn load_user() -> Result<Config, ConfigLoadError> {
    let global_config = fs::read_to_string(paths::config_file()).map_err(ConfigLoadError::Error);
    let local_config =
      fs::read_to_string(paths::workspace_config_file()).map_err(ConfigLoadError::Error);
    match Self::load(global_config, local_config) {
      Err(ConfigLoadError::Error(err)) => {
        log::debug!("no config file loaded: {err}");
        Ok(Config::default())
      },
      result => result,
    }
  }

  pub fn session_config(&self) -> SessionConfig {
    SessionConfig {
      filter:              VisibilityFilter {
        hide_empty_sources: self.editor.hide_empty_sources,
      },
      preflight_tag_check: self.editor.preflight_tag_check,
      default_export_name: self.editor.default_export_name.clone(),
    }
  }
}

fn merge_section<T>(global: Option<Value>, local: Option<Value>) -> Result<T, ConfigLoadError>
where
  T: Default + serde::de::DeserializeOwned,
{
  let value = match (global, local) {
    (None, None) => return Ok(T::default()),
    (None, Some(val)) | (Some(val), None) => val,
    (Some(global), Some(local)) => paths::merge_toml_values(global, local, 3),
  };
  value.try_into().map_err(ConfigLoadError::BadConfig)
}
