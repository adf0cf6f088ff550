use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::core::{self, Notebook, SubmitOptions};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
  /// Settings file to use instead of the per-user default
  #[arg(long, global = true)]
  config: Option<PathBuf>,
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write the default settings file
  Init {},
  /// Create the notebook password, certificate and server configuration
  Setup {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },
  /// Start the notebook server on this node
  Launch {
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    ip: Option<String>,
  },
  /// Submit a job that launches the notebook server on a compute node
  Submit {
    #[arg(short = 'n', long)]
    cores: Option<u32>,
    /// Wall-time as HH:MM
    #[arg(short = 'W', long)]
    walltime: Option<String>,
    /// Memory in MB
    #[arg(short = 'M', long)]
    memory: Option<u32>,
    #[arg(short = 'J', long)]
    name: Option<String>,
    /// Job-description template to use instead of the built-in one
    #[arg(long)]
    template: Option<PathBuf>,
    #[arg(long)]
    port: Option<u16>,
    /// Print the rendered job description without submitting it
    #[arg(long)]
    dry_run: bool,
  },
}

pub fn main() -> Result<()> {
  let cli = Cli::parse();

  if let Commands::Init {} = &cli.command {
    let path = Notebook::init(cli.config.as_deref()).context("Failed to write default settings")?;
    println!("✅ Settings written to '{}'", path.display());
    return Ok(());
  }

  let notebook = core::Notebook::new(cli.config).context("Failed to load settings")?;

  match cli.command {
    Commands::Setup { force } => {
      let path = notebook
        .setup(force)
        .context("Failed to set up the notebook server")?;
      println!("✅ Notebook configuration written to '{}'", path.display());
      println!(
        "   Certificate valid for {} days",
        notebook.settings().certificate_days
      );
    }
    Commands::Launch { port, ip } => {
      notebook
        .launch(port, ip)
        .context("Failed to launch the notebook server")?;
    }
    Commands::Submit {
      cores,
      walltime,
      memory,
      name,
      template,
      port,
      dry_run,
    } => {
      let options = SubmitOptions {
        cores,
        walltime,
        memory,
        name,
        template,
        port,
      };
      if dry_run {
        let rendered = notebook
          .render_job(&options)
          .context("Failed to render the job description")?;
        print!("{}", rendered);
      } else {
        let job_id = notebook
          .submit(&options)
          .context("Failed to submit the notebook job")?;
        println!("✅ Notebook job <{}> submitted", job_id);
      }
    }
    Commands::Init {} => {}
  }

  Ok(())
}
