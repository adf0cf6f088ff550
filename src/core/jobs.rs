mod detect;
mod lsf;
mod slurm;
mod submit;
mod template;
mod utils;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

pub use detect::detect;
pub use submit::{JobFile, JobSubmitter};
pub use template::{ResourceRequest, TemplateSource, render};
pub use utils::shell_quote;

/// Batch scheduler kinds, in detection priority order.
#[derive(Debug, Display, EnumString, EnumIter, PartialEq, Eq, Clone, Copy)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Scheduler {
  Lsf,
  Slurm,
  None,
}

/// Everything that varies between scheduler kinds, kept in one record so a
/// new kind is added in one place.
#[derive(Debug)]
pub struct SchedulerProfile {
  /// Client executable probed on the search path
  pub executable: &'static str,
  /// Set by the scheduler on an allocated compute node
  pub node_env_var: &'static str,
  /// `None` when jobs cannot be submitted to this kind
  pub submission: Option<SubmissionProfile>,
}

#[derive(Debug)]
pub struct SubmissionProfile {
  pub template: &'static str,
  /// Run through `sh -c`; `{job_file}` is replaced by the quoted job file path
  pub submit_command: &'static str,
  /// First capture group is the job identifier
  pub job_id_pattern: &'static str,
}

impl Scheduler {
  pub fn profile(&self) -> Option<&'static SchedulerProfile> {
    match self {
      Scheduler::Lsf => Some(&lsf::LSF),
      Scheduler::Slurm => Some(&slurm::SLURM),
      Scheduler::None => None,
    }
  }

  pub fn submission(&self) -> Result<&'static SubmissionProfile, JobError> {
    self
      .profile()
      .and_then(|p| p.submission.as_ref())
      .ok_or(JobError::UnsupportedScheduler(*self))
  }

  pub fn node_env_var(&self) -> Option<&'static str> {
    self.profile().map(|p| p.node_env_var)
  }
}

#[derive(Error, Debug)]
pub enum JobError {
  #[error("Job submission is not supported for scheduler {0}")]
  UnsupportedScheduler(Scheduler),
  #[error("Cannot read template '{}': {source}", .path.display())]
  TemplateRead {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("Template placeholder '{0}' has no value")]
  UnresolvedPlaceholder(String),
  #[error("Invalid Time Format: {0}")]
  InvalidTimeFormat(String),
  #[error("Invalid resource request: {0}")]
  InvalidRequest(String),
  #[error("Cannot write job file '{}': {source}", .path.display())]
  SubmissionIo {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("Job submission failed: {reason}\n{output}")]
  SubmissionFailed { reason: String, output: String },
  #[error("Job submission timed out after {seconds}s\n{output}")]
  Timeout { seconds: u64, output: String },
  #[error("Job Spawn: {0}")]
  SpawnError(String),
  #[error("Invalid job id pattern: {0}")]
  Pattern(#[from] regex::Error),
}
