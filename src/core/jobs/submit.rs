use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, info};
use regex::Regex;

use super::utils::shell_quote;
use super::{JobError, Scheduler};

const JOB_FILE_PLACEHOLDER: &str = "{job_file}";
const JOB_FILE_PREFIX: &str = "notebook_job.";
// Exit status `timeout` reports when it had to stop the command
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Where the rendered job description is written.
#[derive(Debug, Clone, PartialEq)]
pub enum JobFile {
  /// A fresh `notebook_job.XXXXXX` per submission, kept for inspection
  Unique,
  /// A fixed name, truncated and rewritten on every submission
  Fixed(String),
}

#[derive(Debug, Clone)]
pub struct JobSubmitter {
  workdir: PathBuf,
  job_file: JobFile,
  submit_command: Option<String>,
  timeout: Option<u64>,
}

impl JobSubmitter {
  pub fn new(workdir: impl Into<PathBuf>) -> Self {
    JobSubmitter {
      workdir: workdir.into(),
      job_file: JobFile::Unique,
      submit_command: None,
      timeout: Some(60),
    }
  }

  pub fn job_file(mut self, job_file: JobFile) -> Self {
    self.job_file = job_file;
    self
  }

  /// Overrides the scheduler's own submission command.
  pub fn submit_command(mut self, command: Option<String>) -> Self {
    self.submit_command = command;
    self
  }

  /// Seconds to wait for the submission command; 0 waits forever.
  pub fn timeout(mut self, seconds: u64) -> Self {
    self.timeout = if seconds == 0 { None } else { Some(seconds) };
    self
  }

  /// Writes `rendered` to the job file, hands it to the scheduler and returns
  /// the job identifier parsed from the scheduler's output.
  pub fn submit(&self, scheduler: Scheduler, rendered: &str) -> Result<String, JobError> {
    let profile = scheduler.submission()?;
    let command_template = self
      .submit_command
      .as_deref()
      .unwrap_or(profile.submit_command);
    if command_template.matches(JOB_FILE_PLACEHOLDER).count() != 1 {
      return Err(JobError::InvalidRequest(format!(
        "submission command '{}' must contain {} exactly once",
        command_template, JOB_FILE_PLACEHOLDER
      )));
    }

    let path = self.write(rendered)?;
    info!("Job description written to {:?}", path);

    let command = command_template.replace(
      JOB_FILE_PLACEHOLDER,
      &shell_quote(&path.to_string_lossy()),
    );
    let output = self.run(&command)?;
    let job_id = extract_job_id(profile.job_id_pattern, &output)?;
    info!("Submitted job {} to {}", job_id, scheduler);
    Ok(job_id)
  }

  fn write(&self, rendered: &str) -> Result<PathBuf, JobError> {
    match &self.job_file {
      JobFile::Fixed(name) => {
        let path = self.workdir.join(name);
        write_job_file(&path, rendered)?;
        Ok(path)
      }
      JobFile::Unique => {
        let io_err = |source: std::io::Error| JobError::SubmissionIo {
          path: self.workdir.clone(),
          source,
        };
        let mut file = tempfile::Builder::new()
          .prefix(JOB_FILE_PREFIX)
          .tempfile_in(&self.workdir)
          .map_err(io_err)?;
        file.write_all(rendered.as_bytes()).map_err(io_err)?;
        let (_, path) = file.keep().map_err(|e| io_err(e.error))?;
        Ok(path)
      }
    }
  }

  /// Runs `command` through `sh` with stderr folded into stdout.
  fn run(&self, command: &str) -> Result<String, JobError> {
    let script = format!("exec 2>&1; {}", command);
    let mut cmd = match self.timeout {
      Some(seconds) => {
        let mut cmd = Command::new("timeout");
        cmd.arg(seconds.to_string()).arg("sh");
        cmd
      }
      None => Command::new("sh"),
    };
    cmd
      .arg("-c")
      .arg(&script)
      .current_dir(&self.workdir)
      .stdin(Stdio::null());

    debug!("Running submission command: {}", command);
    let start = Instant::now();
    let output = cmd
      .output()
      .map_err(|e| JobError::SpawnError(format!("Failed to run '{}': {}", command, e)))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    debug!("Submission output: {}", text.trim_end());

    // A command may exit 124 on its own; only a full wait counts as a timeout
    if let Some(seconds) = self.timeout {
      if output.status.code() == Some(TIMEOUT_EXIT_CODE)
        && start.elapsed() >= Duration::from_secs(seconds)
      {
        return Err(JobError::Timeout {
          seconds,
          output: text,
        });
      }
    }
    if !output.status.success() {
      return Err(JobError::SubmissionFailed {
        reason: format!("'{}' exited with {}", command, output.status),
        output: text,
      });
    }
    Ok(text)
  }
}

/// Writes the job description at `path`, replacing any previous content.
pub fn write_job_file(path: &Path, rendered: &str) -> Result<(), JobError> {
  std::fs::write(path, rendered).map_err(|source| JobError::SubmissionIo {
    path: path.to_path_buf(),
    source,
  })
}

/// Pulls the job identifier out of captured scheduler output. The first
/// capture group of `pattern` is the identifier; several mentions of the same
/// identifier are fine, different identifiers are not.
pub fn extract_job_id(pattern: &str, output: &str) -> Result<String, JobError> {
  let regex = Regex::new(pattern)?;
  let mut ids: Vec<&str> = Vec::new();
  for caps in regex.captures_iter(output) {
    if let Some(id) = caps.get(1) {
      if !ids.contains(&id.as_str()) {
        ids.push(id.as_str());
      }
    }
  }

  match ids.as_slice() {
    [id] => Ok(id.to_string()),
    [] => Err(JobError::SubmissionFailed {
      reason: "no job identifier in scheduler output".into(),
      output: output.to_string(),
    }),
    _ => Err(JobError::SubmissionFailed {
      reason: format!("several job identifiers in scheduler output: {}", ids.join(", ")),
      output: output.to_string(),
    }),
  }
}
