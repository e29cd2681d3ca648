use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub paging: PagingConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// `userId` sent with newly created posts
  #[serde(default = "default_user_id")]
  pub user_id: i64,
  /// Connect/request timeout, also the budget for a single page fetch
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      user_id: default_user_id(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for PagingConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Database file (defaults to $XDG_DATA_HOME/postcache/cache.db)
  pub path: Option<PathBuf>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_user_id() -> i64 {
  1
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_page_size() -> u32 {
  10
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./postcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/postcache/config.yaml
  ///
  /// Unlike an explicit path, a missing default file is not an error: the
  /// built-in defaults talk to the public JSONPlaceholder service.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.with_env_overrides().validated()
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("postcache.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("postcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to null; treat it as all defaults
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Apply `POSTCACHE_BASE_URL` over whatever the file said.
  fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("POSTCACHE_BASE_URL") {
      self.api.base_url = url;
    }
    self
  }

  fn validated(self) -> Result<Self> {
    url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;

    if self.paging.page_size == 0 {
      return Err(eyre!("paging.page_size must be at least 1"));
    }
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be at least 1"));
    }

    Ok(self)
  }

  /// Path of the cache database.
  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(p) => Ok(p.clone()),
      None => Ok(data_dir()?.join("cache.db")),
    }
  }
}

/// Application data directory ($XDG_DATA_HOME/postcache).
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("postcache"))
}
