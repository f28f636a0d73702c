use std::{
  io,
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};

const APP_DIR: &str = "the-translator";

const PROJECT_DIR: &str = ".the-translator";

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) -> io::Result<()> {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  create_parent_dir(&log_file)?;
  LOG_FILE.set(log_file).ok();
  Ok(())
}

pub fn config_dir() -> PathBuf {
  if let Some(dir) = env_dir("THE_TRANSLATOR_CONFIG_DIR") {
    return dir;
  }
  let mut path = choose_base_strategy()
    .map(|strategy| strategy.config_dir())
    .unwrap_or_else(|_| fallback_dir(".config"));
  path.push(APP_DIR);
  path
}

pub fn cache_dir() -> PathBuf {
  if let Some(dir) = env_dir("THE_TRANSLATOR_CACHE_DIR") {
    return dir;
  }
  let mut path = choose_base_strategy()
    .map(|strategy| strategy.cache_dir())
    .unwrap_or_else(|_| fallback_dir(".cache"));
  path.push(APP_DIR);
  path
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE.get_or_init(default_config_file).clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE.get_or_init(default_log_file).clone()
}

/// Project config of the nearest `.the-translator` directory at or above the
/// CWD, or under the CWD itself when there is none.
pub fn workspace_config_file() -> PathBuf {
  let cwd = std::env::current_dir().unwrap_or_default();
  find_project_dir(&cwd)
    .unwrap_or(cwd)
    .join(PROJECT_DIR)
    .join("config.toml")
}

pub fn default_log_file() -> PathBuf {
  cache_dir().join("the-translator.log")
}

/// Walks up from `dir` to the first ancestor holding a `.the-translator`
/// directory. The search stops at a repository root (`.git`), so a project
/// config never leaks in from an enclosing checkout.
pub fn find_project_dir(dir: &Path) -> Option<PathBuf> {
  for ancestor in dir.ancestors() {
    if ancestor.join(PROJECT_DIR).is_dir() {
      return Some(ancestor.to_owned());
    }
    if ancestor.join(".git").exists() {
      break;
    }
  }
  None
}

/// Merge two TOML documents, merging values from `right` onto `left`.
///
/// `merge_depth` sets the nesting depth up to which tables are merged instead
/// of overridden. With a depth of 3 a local
///
/// ```toml
/// [backend]
/// url = "http://translate.internal:8000"
/// ```
///
/// only replaces `backend.url` and keeps every other key of the global file.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

fn default_config_file() -> PathBuf {
  config_dir().join("config.toml")
}

fn env_dir(var: &str) -> Option<PathBuf> {
  let dir = std::env::var_os(var).filter(|dir| !dir.is_empty())?;
  Some(expand_tilde(PathBuf::from(dir)))
}

fn expand_tilde(path: PathBuf) -> PathBuf {
  let Ok(rest) = path.strip_prefix("~") else {
    return path;
  };
  match etcetera::home_dir() {
    Ok(home) => home.join(rest),
    Err(_) => path,
  }
}

fn fallback_dir(name: &str) -> PathBuf {
  etcetera::home_dir()
    .map(|home| home.join(name))
    .unwrap_or_else(|_| std::env::temp_dir())
}

fn create_parent_dir(path: &Path) -> io::Result<()> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
    _ => Ok(()),
  }
}
