use std::ffi::OsStr;
use std::path::Path;

use log::debug;
use strum::IntoEnumIterator;

use super::Scheduler;

/// Probes `PATH` for scheduler client executables. The first kind found wins;
/// `Scheduler::None` when nothing is installed.
pub fn detect() -> Scheduler {
  match std::env::var_os("PATH") {
    Some(path) => detect_in_path(&path),
    None => Scheduler::None,
  }
}

pub fn detect_in_path(search_path: &OsStr) -> Scheduler {
  for scheduler in Scheduler::iter() {
    let Some(profile) = scheduler.profile() else {
      continue;
    };
    if let Some(found) = find_executable(search_path, profile.executable) {
      debug!("Detected scheduler {} via {:?}", scheduler, found);
      return scheduler;
    }
  }
  debug!("No batch scheduler found on the search path");
  Scheduler::None
}

fn find_executable(search_path: &OsStr, name: &str) -> Option<std::path::PathBuf> {
  std::env::split_paths(search_path)
    .map(|dir| dir.join(name))
    .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  match std::fs::metadata(path) {
    Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
    Err(_) => false,
  }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
