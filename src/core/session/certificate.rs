use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use super::SessionError;

const CERT_FILE: &str = "notebook.pem";
const KEY_FILE: &str = "notebook.key";

#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
  pub certfile: PathBuf,
  pub keyfile: PathBuf,
}

/// Generates a self-signed certificate and unencrypted key in `dir` with the
/// external `openssl` tool.
pub fn generate_certificate(
  openssl: &str,
  dir: &Path,
  days: u32,
  common_name: &str,
) -> Result<Certificate, SessionError> {
  let certificate = Certificate {
    certfile: dir.join(CERT_FILE),
    keyfile: dir.join(KEY_FILE),
  };

  let output = Command::new(openssl)
    .args(["req", "-x509", "-nodes", "-newkey", "rsa:2048", "-days"])
    .arg(days.to_string())
    .arg("-keyout")
    .arg(&certificate.keyfile)
    .arg("-out")
    .arg(&certificate.certfile)
    .arg("-subj")
    .arg(format!("/CN={}", common_name))
    .output()
    .map_err(|e| SessionError::SpawnError(format!("{}: {}", openssl, e)))?;

  if !output.status.success() {
    return Err(SessionError::Certificate(
      String::from_utf8_lossy(&output.stderr).trim().to_string(),
    ));
  }
  for file in [&certificate.certfile, &certificate.keyfile] {
    if !file.is_file() {
      return Err(SessionError::Certificate(format!(
        "{} did not create {:?}",
        openssl, file
      )));
    }
  }

  make_private(&certificate.keyfile)?;
  info!("Self-signed certificate written to {:?}", certificate.certfile);
  Ok(certificate)
}

#[cfg(unix)]
fn make_private(path: &Path) -> Result<(), SessionError> {
  use std::os::unix::fs::PermissionsExt;
  let mut perms = std::fs::metadata(path)?.permissions();
  perms.set_mode(0o600);
  std::fs::set_permissions(path, perms)?;
  Ok(())
}

#[cfg(not(unix))]
fn make_private(_path: &Path) -> Result<(), SessionError> {
  Ok(())
}
