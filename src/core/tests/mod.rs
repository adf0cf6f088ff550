use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::core::jobs::{JobError, Scheduler};
use crate::core::settings::Settings;
use crate::core::{Notebook, NotebookError, SubmitOptions};

fn create_test_notebook(temp_dir: &TempDir, submit_command: &str) -> Notebook {
  let mut settings = Settings::default();
  settings.port = 8888;
  settings.job.submit_command = Some(submit_command.to_string());
  settings.job.submit_timeout = 30;
  Notebook::with_settings(settings, temp_dir.path().join("settings.toml"))
}

#[test]
fn submit_with_settings_defaults() {
  let temp_dir = TempDir::new().unwrap();
  let notebook = create_test_notebook(
    &temp_dir,
    "cp {job_file} received.sh && echo 'Job <1001> is submitted to queue <normal>.'",
  );

  let id = notebook
    .submit_to(Scheduler::Lsf, temp_dir.path(), &SubmitOptions::default())
    .unwrap();
  assert_eq!(id, "1001");

  let received = fs::read_to_string(temp_dir.path().join("received.sh")).unwrap();
  assert!(received.contains("#BSUB -n 1\n"));
  assert!(received.contains("#BSUB -W 04:00\n"));
  assert!(received.contains("#BSUB -J notebook\n"));
  assert!(received.contains("launch --port 8888"));
}

#[test]
fn submit_to_unsupported_scheduler() {
  let temp_dir = TempDir::new().unwrap();
  let notebook = create_test_notebook(&temp_dir, "touch invoked; cat {job_file}");

  let result = notebook.submit_to(Scheduler::Slurm, temp_dir.path(), &SubmitOptions::default());
  assert!(matches!(
    result,
    Err(NotebookError::JobError(JobError::UnsupportedScheduler(Scheduler::Slurm)))
  ));
  assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn options_override_settings() {
  let temp_dir = TempDir::new().unwrap();
  let notebook = create_test_notebook(&temp_dir, "cat {job_file}");
  assert_eq!(notebook.settings().job.cores, 1);

  let options = SubmitOptions {
    cores: Some(16),
    walltime: Some("48:00".to_string()),
    memory: Some(64000),
    name: Some("bigmem".to_string()),
    template: None,
    port: Some(9191),
  };
  let rendered = notebook.render_job_for(Scheduler::Lsf, &options).unwrap();

  assert!(rendered.contains("#BSUB -n 16\n"));
  assert!(rendered.contains("#BSUB -W 48:00\n"));
  assert!(rendered.contains("#BSUB -M 64000MB\n"));
  assert!(rendered.contains("#BSUB -J bigmem\n"));
  assert!(rendered.contains("launch --port 9191"));
}

#[test]
fn launch_command_points_at_settings_file() {
  let temp_dir = TempDir::new().unwrap();
  let notebook = create_test_notebook(&temp_dir, "cat {job_file}");
  let rendered = notebook
    .render_job_for(Scheduler::Lsf, &SubmitOptions::default())
    .unwrap();

  let settings_path = temp_dir.path().join("settings.toml");
  assert!(rendered.contains(&format!("--config '{}' launch", settings_path.display())));
}

#[test]
fn template_from_settings_and_options() {
  let temp_dir = TempDir::new().unwrap();
  let settings_template = temp_dir.path().join("site.sh");
  let option_template = temp_dir.path().join("mine.sh");
  fs::write(&settings_template, "# SITE {{cores}}\n").unwrap();
  fs::write(&option_template, "# MINE {{cores}}\n").unwrap();

  let mut settings = Settings::default();
  settings.job.template = Some(settings_template);
  let notebook = Notebook::with_settings(settings, PathBuf::from("settings.toml"));

  let rendered = notebook
    .render_job_for(Scheduler::None, &SubmitOptions::default())
    .unwrap();
  assert_eq!(rendered, "# SITE 1\n");

  let options = SubmitOptions {
    template: Some(option_template),
    ..SubmitOptions::default()
  };
  let rendered = notebook.render_job_for(Scheduler::None, &options).unwrap();
  assert_eq!(rendered, "# MINE 1\n");
}

#[test]
fn invalid_settings_walltime_is_reported() {
  let mut settings = Settings::default();
  settings.job.walltime = "four hours".to_string();
  let notebook = Notebook::with_settings(settings, PathBuf::from("settings.toml"));

  assert!(matches!(
    notebook.render_job_for(Scheduler::Lsf, &SubmitOptions::default()),
    Err(NotebookError::JobError(JobError::InvalidTimeFormat(_)))
  ));
}

#[test]
fn init_writes_settings_once() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join("settings.toml");
  assert_eq!(Notebook::init(Some(&path)).unwrap(), path);
  fs::write(&path, "port = 1234\n").unwrap();
  Notebook::init(Some(&path)).unwrap();
  assert_eq!(fs::read_to_string(&path).unwrap(), "port = 1234\n");
}

#[test]
fn new_loads_settings_file() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join("settings.toml");
  fs::write(&path, "port = 4321\n").unwrap();
  let notebook = Notebook::new(Some(path)).unwrap();
  assert_eq!(notebook.settings().port, 4321);
}
