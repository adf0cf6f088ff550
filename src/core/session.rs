mod certificate;
mod network;
mod password;


use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::jobs::Scheduler;
use crate::core::settings::{Settings, SettingsError};

pub use certificate::{Certificate, generate_certificate};
pub use network::{hostname, on_compute_node, pick_free_port, resolve_address};
use password::{hash_password, prompt_password};

pub const NOTEBOOK_CONFIG_FILE: &str = "jupyter_notebook_config.py";

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Settings Error: {0}")]
  SettingsError(#[from] SettingsError),
  #[error("Passwords do not match")]
  PasswordMismatch,
  #[error("Password must not be empty")]
  EmptyPassword,
  #[error("Certificate generation failed: {0}")]
  Certificate(String),
  #[error("Notebook server already configured at '{}'; use --force to replace it", .0.display())]
  AlreadyConfigured(PathBuf),
  #[error("Notebook server not configured, '{}' is missing; run `setup` first", .0.display())]
  NotConfigured(PathBuf),
  #[error("Notebook server exited with status {0:?}")]
  NotebookExited(Option<i32>),
  #[error("Spawn Error: {0}")]
  SpawnError(String),
  #[error("Notebook command is empty")]
  EmptyCommand,
}

/// Sets up and starts the notebook server described by `Settings`.
pub struct NotebookSession<'a> {
  settings: &'a Settings,
  config_dir: PathBuf,
}

impl<'a> NotebookSession<'a> {
  pub fn new(settings: &'a Settings) -> Result<Self, SessionError> {
    let config_dir = settings.config_dir()?;
    Ok(NotebookSession {
      settings,
      config_dir,
    })
  }

  pub fn config_path(&self) -> PathBuf {
    self.config_dir.join(NOTEBOOK_CONFIG_FILE)
  }

  /// Prompts for a password, then writes certificate, key and server config.
  pub fn setup(&self, force: bool) -> Result<PathBuf, SessionError> {
    self.check_not_configured(force)?;
    let password = prompt_password()?;
    self.setup_with_password_hash(&hash_password(&password), force)
  }

  pub fn setup_with_password_hash(
    &self,
    password_hash: &str,
    force: bool,
  ) -> Result<PathBuf, SessionError> {
    self.check_not_configured(force)?;
    create_private_dir(&self.config_dir)?;

    let common_name = hostname().unwrap_or_else(|e| {
      warn!("Cannot determine hostname ({}), using localhost", e);
      "localhost".to_string()
    });
    let certificate = generate_certificate(
      &self.settings.openssl_command,
      &self.config_dir,
      self.settings.certificate_days,
      &common_name,
    )?;

    let config_path = self.config_path();
    std::fs::write(
      &config_path,
      render_notebook_config(&certificate, password_hash),
    )?;
    info!("Notebook configuration written to {:?}", config_path);
    Ok(config_path)
  }

  fn check_not_configured(&self, force: bool) -> Result<(), SessionError> {
    let config_path = self.config_path();
    if config_path.exists() && !force {
      return Err(SessionError::AlreadyConfigured(config_path));
    }
    Ok(())
  }

  /// Starts the notebook server and blocks until it exits.
  pub fn launch(
    &self,
    scheduler: Scheduler,
    port: Option<u16>,
    ip: Option<String>,
  ) -> Result<(), SessionError> {
    let config_path = self.config_path();
    if !config_path.is_file() {
      return Err(SessionError::NotConfigured(config_path));
    }

    match scheduler.node_env_var() {
      Some(var) if on_compute_node(var) => {
        info!("Running on a compute node allocated by {}", scheduler)
      }
      Some(var) => warn!(
        "{} is not set; the notebook server will run on this login node",
        var
      ),
      None => debug!("No batch scheduler detected"),
    }

    let ip = match ip {
      Some(ip) => ip,
      None => resolve_address(&hostname()?),
    };
    let port = match port.unwrap_or(self.settings.port) {
      0 => pick_free_port()?,
      port => port,
    };

    let mut command = self.notebook_command(&config_path, &ip, port)?;
    println!("Notebook server starting at https://{}:{}/", ip, port);
    let status = command
      .status()
      .map_err(|e| SessionError::SpawnError(format!("{}: {}", self.settings.notebook_command, e)))?;
    if !status.success() {
      return Err(SessionError::NotebookExited(status.code()));
    }
    Ok(())
  }

  fn notebook_command(
    &self,
    config_path: &Path,
    ip: &str,
    port: u16,
  ) -> Result<Command, SessionError> {
    let mut parts = self.settings.notebook_command.split_whitespace();
    let program = parts.next().ok_or(SessionError::EmptyCommand)?;
    let mut command = Command::new(program);
    command
      .args(parts)
      .arg(format!("--config={}", config_path.display()))
      .arg(format!("--ip={}", ip))
      .arg(format!("--port={}", port))
      .arg("--no-browser");
    Ok(command)
  }
}

fn python_quote(s: &str) -> String {
  format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Server configuration covering both the classic notebook and jupyter_server.
pub fn render_notebook_config(certificate: &Certificate, password_hash: &str) -> String {
  let certfile = python_quote(&certificate.certfile.to_string_lossy());
  let keyfile = python_quote(&certificate.keyfile.to_string_lossy());
  let password = python_quote(password_hash);

  let mut config = String::from("# Generated by hpc-notebook setup\nc = get_config()\n\n");
  for app in ["NotebookApp", "ServerApp"] {
    config.push_str(&format!("c.{}.certfile = {}\n", app, certfile));
    config.push_str(&format!("c.{}.keyfile = {}\n", app, keyfile));
    config.push_str(&format!("c.{}.password = {}\n", app, password));
    config.push_str(&format!("c.{}.open_browser = False\n", app));
  }
  config.push_str(&format!(
    "c.PasswordIdentityProvider.hashed_password = {}\n",
    password
  ));
  config
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> Result<(), SessionError> {
  use std::os::unix::fs::PermissionsExt;
  std::fs::create_dir_all(path)?;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
  Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> Result<(), SessionError> {
  std::fs::create_dir_all(path)?;
  Ok(())
}
