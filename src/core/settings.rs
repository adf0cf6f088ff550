use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;


const APP_NAME: &str = "hpc-notebook";
const CONFIG_NAME: &str = "config";

#[derive(Error, Debug)]
pub enum SettingsError {
  #[error("Filesystem error: {0}")]
  FilesystemError(#[from] std::io::Error),
  #[error("IO Error: {0}")]
  ConfyError(#[from] confy::ConfyError),
  #[error("Could not determine the home directory")]
  HomeDirNotFound,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
  /// Directory holding the certificate, key and notebook server configuration
  pub config_dir: Option<PathBuf>,
  pub notebook_command: String,
  pub openssl_command: String,
  pub certificate_days: u32,
  /// 0 lets the OS pick a free port at launch
  pub port: u16,
  pub job: JobSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      config_dir: None,
      notebook_command: "jupyter notebook".into(),
      openssl_command: "openssl".into(),
      certificate_days: 365,
      port: 0,
      job: JobSettings::default(),
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct JobSettings {
  pub cores: u32,
  pub walltime: String,
  /// Megabytes
  pub memory: u32,
  pub name: String,
  pub template: Option<PathBuf>,
  /// Replaces the scheduler's submission command; must contain `{job_file}`
  pub submit_command: Option<String>,
  /// Seconds; 0 waits forever
  pub submit_timeout: u64,
  /// Fixed job-description file name, overwritten on every submission
  pub job_file: Option<String>,
}

impl Default for JobSettings {
  fn default() -> Self {
    Self {
      cores: 1,
      walltime: "04:00".into(),
      memory: 4096,
      name: "notebook".into(),
      template: None,
      submit_command: None,
      submit_timeout: 60,
      job_file: None,
    }
  }
}

impl Settings {
  pub fn config_dir(&self) -> Result<PathBuf, SettingsError> {
    match &self.config_dir {
      Some(dir) => Ok(dir.clone()),
      None => default_config_dir(),
    }
  }
}

pub fn default_config_dir() -> Result<PathBuf, SettingsError> {
  let home = dirs::home_dir().ok_or(SettingsError::HomeDirNotFound)?;
  Ok(home.join(".hpc-notebook"))
}

/// Resolves the settings file: the explicit path if one was given, confy's
/// per-user location otherwise.
pub fn settings_path(path: Option<&Path>) -> Result<PathBuf, SettingsError> {
  match path {
    Some(path) => Ok(path.to_path_buf()),
    None => Ok(confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?),
  }
}

/// Loads the settings, creating the file with defaults when it is missing.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
  let settings: Settings = confy::load_path(path)?;
  Ok(settings)
}

pub fn store_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  confy::store_path(path, settings)?;
  Ok(())
}

/// Writes the default settings unless a file is already there.
pub fn init_settings(path: &Path) -> Result<bool, SettingsError> {
  if path.exists() {
    return Ok(false);
  }
  store_settings(path, &Settings::default())?;
  Ok(true)
}
