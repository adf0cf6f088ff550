use std::path::Path;

use crate::core::jobs::utils::{parse_walltime, shell_quote};
use crate::core::jobs::{JobError, ResourceRequest, Scheduler, TemplateSource};


fn create_test_request(template: TemplateSource) -> ResourceRequest {
  ResourceRequest::new(
    4,
    "02:30",
    8000,
    "test_notebook",
    "hpc-notebook launch --port 8888",
    template,
  )
  .unwrap()
}

#[cfg(unix)]
fn make_executable(path: &Path) {
  use std::os::unix::fs::PermissionsExt;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

// ============================================================================
// Tests for parse_walltime
// ============================================================================

#[test]
fn test_parse_walltime_hhmm_format() {
  assert_eq!(parse_walltime("01:30").unwrap(), (1, 30));
  assert_eq!(parse_walltime("00:01").unwrap(), (0, 1));
  assert_eq!(parse_walltime("4:00").unwrap(), (4, 0));
  assert_eq!(parse_walltime("23:59").unwrap(), (23, 59));
}

#[test]
fn test_parse_walltime_beyond_one_day() {
  assert_eq!(parse_walltime("48:00").unwrap(), (48, 0));
  assert_eq!(parse_walltime("168:15").unwrap(), (168, 15));
}

#[test]
fn test_parse_walltime_invalid_formats() {
  assert!(parse_walltime("invalid").is_err());
  assert!(parse_walltime("1:2").is_err());
  assert!(parse_walltime("01:60").is_err());
  assert!(parse_walltime("01:30:00").is_err());
  assert!(parse_walltime(":30").is_err());
  assert!(parse_walltime("+1:30").is_err());
  assert!(parse_walltime("a:bc").is_err());
  assert!(matches!(
    parse_walltime("00:00"),
    Err(JobError::InvalidTimeFormat(s)) if s == "00:00"
  ));
}

// ============================================================================
// Tests for shell_quote
// ============================================================================

#[test]
fn test_shell_quote_plain_path() {
  assert_eq!(shell_quote("/home/me/notebook_job"), "'/home/me/notebook_job'");
}

#[test]
fn test_shell_quote_embedded_quote_and_spaces() {
  assert_eq!(shell_quote("my dir/it's"), "'my dir/it'\\''s'");
}

// ============================================================================
// Tests for Scheduler profiles
// ============================================================================

#[test]
fn test_scheduler_names() {
  assert_eq!(Scheduler::Lsf.to_string(), "LSF");
  assert_eq!(Scheduler::Slurm.to_string(), "SLURM");
  assert_eq!(Scheduler::None.to_string(), "NONE");
  assert_eq!("LSF".parse::<Scheduler>().unwrap(), Scheduler::Lsf);
}

#[test]
fn test_only_lsf_supports_submission() {
  assert!(Scheduler::Lsf.submission().is_ok());
  assert!(matches!(
    Scheduler::Slurm.submission(),
    Err(JobError::UnsupportedScheduler(Scheduler::Slurm))
  ));
  assert!(matches!(
    Scheduler::None.submission(),
    Err(JobError::UnsupportedScheduler(Scheduler::None))
  ));
}

#[test]
fn test_node_env_vars() {
  assert_eq!(Scheduler::Lsf.node_env_var(), Some("LSB_HOSTS"));
  assert_eq!(Scheduler::Slurm.node_env_var(), Some("SLURM_JOB_NODELIST"));
  assert_eq!(Scheduler::None.node_env_var(), None);
}
