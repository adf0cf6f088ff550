use std::io::{BufRead, IsTerminal, Write};
use std::process::{Command, Stdio};

use log::warn;
use rand::Rng;
use sha2::{Digest, Sha256};

use super::SessionError;

const ALGORITHM: &str = "sha256";
// 6 random bytes, 12 hex characters
const SALT_BYTES: usize = 6;

/// Asks for the password twice on the terminal without echoing it.
pub fn prompt_password() -> Result<String, SessionError> {
  let password = read_hidden("Notebook password: ")?;
  if password.is_empty() {
    return Err(SessionError::EmptyPassword);
  }
  let confirmation = read_hidden("Verify password: ")?;
  if password != confirmation {
    return Err(SessionError::PasswordMismatch);
  }
  Ok(password)
}

fn read_hidden(prompt: &str) -> Result<String, SessionError> {
  eprint!("{}", prompt);
  std::io::stderr().flush()?;

  let stdin = std::io::stdin();
  let _echo = if stdin.is_terminal() {
    Some(EchoGuard::disable())
  } else {
    None
  };
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Turns terminal echo off until dropped, so read errors and panics restore
/// it. A SIGINT at the prompt kills the process without unwinding and leaves
/// echo off; `stty echo` (or `reset`) recovers the terminal.
pub(super) struct EchoGuard;

impl EchoGuard {
  pub(super) fn disable() -> Self {
    set_echo(false);
    EchoGuard
  }
}

impl Drop for EchoGuard {
  fn drop(&mut self) {
    set_echo(true);
    eprintln!();
  }
}

fn set_echo(on: bool) {
  let status = Command::new("stty")
    .arg(if on { "echo" } else { "-echo" })
    .stdin(Stdio::inherit())
    .status();
  if !matches!(status, Ok(s) if s.success()) {
    warn!("Could not toggle terminal echo");
  }
}

/// Salted hash in the `algorithm:salt:hexdigest` form the notebook server
/// checks passwords against.
pub fn hash_password(password: &str) -> String {
  let salt: [u8; SALT_BYTES] = rand::thread_rng().r#gen();
  let salt: String = salt.iter().map(|b| format!("{:02x}", b)).collect();
  hash_password_with_salt(password, &salt)
}

pub fn hash_password_with_salt(password: &str, salt: &str) -> String {
  format!("{}:{}:{}", ALGORITHM, salt, digest(password, salt))
}

#[cfg(test)]
pub fn verify_password(password: &str, hashed: &str) -> bool {
  match hashed.splitn(3, ':').collect::<Vec<_>>().as_slice() {
    [ALGORITHM, salt, expected] => digest(password, salt) == *expected,
    _ => false,
  }
}

fn digest(password: &str, salt: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(password.as_bytes());
  hasher.update(salt.as_bytes());
  format!("{:x}", hasher.finalize())
}
