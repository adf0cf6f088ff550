use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::utils::parse_walltime;
use super::{JobError, Scheduler};

static PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
  pub hours: u32,
  pub minutes: u32,
}

impl FromStr for WallTime {
  type Err = JobError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (hours, minutes) = parse_walltime(s)?;
    Ok(WallTime { hours, minutes })
  }
}

impl fmt::Display for WallTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hours, self.minutes)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
  /// The template bundled for the detected scheduler
  BuiltIn,
  File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ResourceRequest {
  pub cores: u32,
  pub walltime: WallTime,
  /// Megabytes
  pub memory: u32,
  pub name: String,
  /// Shell command the job runs to start the notebook server
  pub command: String,
  pub template: TemplateSource,
}

impl ResourceRequest {
  pub fn new(
    cores: u32,
    walltime: &str,
    memory: u32,
    name: &str,
    command: &str,
    template: TemplateSource,
  ) -> Result<Self, JobError> {
    if cores == 0 {
      return Err(JobError::InvalidRequest("core count must be positive".into()));
    }
    if memory == 0 {
      return Err(JobError::InvalidRequest("memory must be positive".into()));
    }
    if name.is_empty() || name.chars().any(char::is_whitespace) {
      return Err(JobError::InvalidRequest(format!(
        "job name '{}' must be non-empty and contain no whitespace",
        name
      )));
    }
    Ok(ResourceRequest {
      cores,
      walltime: walltime.parse()?,
      memory,
      name: name.to_string(),
      command: command.to_string(),
      template,
    })
  }

  fn value_of(&self, placeholder: &str) -> Option<String> {
    match placeholder {
      "walltime" => Some(self.walltime.to_string()),
      "cores" => Some(self.cores.to_string()),
      "memory" => Some(self.memory.to_string()),
      "name" => Some(self.name.clone()),
      "command" => Some(self.command.clone()),
      _ => None,
    }
  }
}

/// Fills the job-description template for `scheduler` with `request`.
///
/// A template file in the request takes precedence over the built-in one and
/// is used whatever the scheduler kind. Every `{{placeholder}}` must have a
/// value, and none may survive substitution.
pub fn render(scheduler: Scheduler, request: &ResourceRequest) -> Result<String, JobError> {
  let template = match &request.template {
    TemplateSource::File(path) => {
      debug!("Reading job template from {:?}", path);
      std::fs::read_to_string(path).map_err(|source| JobError::TemplateRead {
        path: path.clone(),
        source,
      })?
    }
    TemplateSource::BuiltIn => scheduler.submission()?.template.to_string(),
  };

  let mut rendered = String::with_capacity(template.len());
  let mut last = 0;
  for caps in PLACEHOLDER.captures_iter(&template) {
    let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
      continue;
    };
    let value = request
      .value_of(name.as_str())
      .ok_or_else(|| JobError::UnresolvedPlaceholder(name.as_str().to_string()))?;
    rendered.push_str(&template[last..whole.start()]);
    rendered.push_str(&value);
    last = whole.end();
  }
  rendered.push_str(&template[last..]);

  if let Some(leftover) = PLACEHOLDER.captures(&rendered).and_then(|c| c.get(1)) {
    return Err(JobError::UnresolvedPlaceholder(leftover.as_str().to_string()));
  }

  Ok(rendered)
}
