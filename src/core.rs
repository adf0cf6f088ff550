pub mod jobs;
pub mod session;
pub mod settings;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use log::info;

use crate::core::jobs::{
  JobFile, JobSubmitter, ResourceRequest, Scheduler, TemplateSource, shell_quote,
};
use crate::core::session::NotebookSession;
use crate::core::settings::Settings;

pub struct Notebook {
  settings: Settings,
  settings_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum NotebookError {
  #[error("Settings Error: {0}")]
  SettingsError(#[from] settings::SettingsError),
  #[error("Job Error: {0}")]
  JobError(#[from] jobs::JobError),
  #[error("Session Error: {0}")]
  SessionError(#[from] session::SessionError),
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
}

/// Per-invocation overrides of the `[job]` settings.
#[derive(Debug, Default, Clone)]
pub struct SubmitOptions {
  pub cores: Option<u32>,
  pub walltime: Option<String>,
  pub memory: Option<u32>,
  pub name: Option<String>,
  pub template: Option<PathBuf>,
  pub port: Option<u16>,
}

impl Notebook {
  pub fn new(settings_path: Option<PathBuf>) -> Result<Self, NotebookError> {
    let _ = env_logger::try_init();

    let settings_path = settings::settings_path(settings_path.as_deref())?;
    let settings = settings::load_settings(&settings_path)?;
    Ok(Notebook {
      settings,
      settings_path,
    })
  }

  #[cfg(test)]
  pub fn with_settings(settings: Settings, settings_path: PathBuf) -> Self {
    Notebook {
      settings,
      settings_path,
    }
  }

  /// Writes the default settings file and returns where it lives.
  pub fn init(settings_path: Option<&Path>) -> Result<PathBuf, NotebookError> {
    let path = settings::settings_path(settings_path)?;
    if !settings::init_settings(&path)? {
      info!("Settings file {:?} already exists, leaving it untouched", path);
    }
    Ok(path)
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn setup(&self, force: bool) -> Result<PathBuf, NotebookError> {
    Ok(NotebookSession::new(&self.settings)?.setup(force)?)
  }

  pub fn launch(&self, port: Option<u16>, ip: Option<String>) -> Result<(), NotebookError> {
    let scheduler = jobs::detect();
    Ok(NotebookSession::new(&self.settings)?.launch(scheduler, port, ip)?)
  }

  /// Renders the job description for the scheduler installed here.
  pub fn render_job(&self, options: &SubmitOptions) -> Result<String, NotebookError> {
    let scheduler = jobs::detect();
    self.render_job_for(scheduler, options)
  }

  pub fn render_job_for(
    &self,
    scheduler: Scheduler,
    options: &SubmitOptions,
  ) -> Result<String, NotebookError> {
    let request = self.resource_request(options)?;
    Ok(jobs::render(scheduler, &request)?)
  }

  /// Submits a notebook job to the scheduler installed here and returns its
  /// identifier.
  pub fn submit(&self, options: &SubmitOptions) -> Result<String, NotebookError> {
    let scheduler = jobs::detect();
    info!("Using scheduler {}", scheduler);
    let workdir = std::env::current_dir()?;
    self.submit_to(scheduler, &workdir, options)
  }

  pub fn submit_to(
    &self,
    scheduler: Scheduler,
    workdir: &Path,
    options: &SubmitOptions,
  ) -> Result<String, NotebookError> {
    // Refuse before rendering anything
    scheduler.submission()?;
    let rendered = self.render_job_for(scheduler, options)?;
    Ok(self.submitter(workdir).submit(scheduler, &rendered)?)
  }

  fn submitter(&self, workdir: &Path) -> JobSubmitter {
    let job = &self.settings.job;
    let job_file = match &job.job_file {
      Some(name) => JobFile::Fixed(name.clone()),
      None => JobFile::Unique,
    };
    JobSubmitter::new(workdir)
      .job_file(job_file)
      .submit_command(job.submit_command.clone())
      .timeout(job.submit_timeout)
  }

  fn resource_request(&self, options: &SubmitOptions) -> Result<ResourceRequest, NotebookError> {
    let job = &self.settings.job;
    let template = match options.template.as_ref().or(job.template.as_ref()) {
      Some(path) => TemplateSource::File(path.clone()),
      None => TemplateSource::BuiltIn,
    };
    Ok(ResourceRequest::new(
      options.cores.unwrap_or(job.cores),
      options.walltime.as_deref().unwrap_or(&job.walltime),
      options.memory.unwrap_or(job.memory),
      options.name.as_deref().unwrap_or(&job.name),
      &self.launch_command(options.port)?,
      template,
    )?)
  }

  /// The command a submitted job runs on its compute node: this same binary's
  /// `launch`, pointed at the same settings file.
  fn launch_command(&self, port: Option<u16>) -> Result<String, NotebookError> {
    let exe = std::env::current_exe()?;
    let port = port.unwrap_or(self.settings.port);
    Ok(format!(
      "{} --config {} launch --port {}",
      shell_quote(&exe.to_string_lossy()),
      shell_quote(&self.settings_path.to_string_lossy()),
      port
    ))
  }
}
