use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use cert_get_core::{retrieve_with, DownloadParams, DEFAULT_PORT};
use clap::Parser;
use inquire::Text;
use log::{debug, info};

use crate::progress;

const DEFAULT_HOST: &str = "localhost";

/// Download the certificate chain of a TLS server as PEM files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct DownloadArgs {
    /// Batch mode (non-interactive)
    #[arg(short, long, requires = "host")]
    batch: bool,

    /// Server host/ip
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Output directory where certificates will be saved
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Connect and handshake timeout, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
}

impl DownloadArgs {
    pub fn run(&self) -> Result<()> {
        let params = match self.batch_host() {
            Some(host) => {
                debug!("entering batch mode (non-interactive)");
                self.batch_params(host)
            }
            None => {
                debug!("entering interactive mode");
                self.interactive_params()?
            }
        };

        let pb = progress::get_spinner();
        let summary = retrieve_with(&params, |state| progress::update(&pb, state))?;

        for saved in &summary.files {
            info!(
                "{}: {:?} -> {}",
                saved.order,
                saved.common_name.as_deref().unwrap_or(&saved.subject),
                saved.path.display()
            );
        }

        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Host to use without prompting; clap rejects `--batch` without `--host`
    fn batch_host(&self) -> Option<&str> {
        self.host.as_deref().filter(|_| self.batch)
    }

    fn batch_params(&self, host: &str) -> DownloadParams {

        DownloadParams::new(&format!("{host}:{}", self.port), &self.output_dir)
            .with_connect_timeout(self.timeout())
    }

    fn interactive_params(&self) -> Result<DownloadParams> {
        let host = Text::new("Server host/ip")
            .with_default(self.host.as_deref().unwrap_or(DEFAULT_HOST))
            .prompt()?;

        let port = Text::new("Server port")
            .with_default(&self.port.to_string())
            .prompt()?;

        let output_dir = Text::new("Output directory")
            .with_default(&self.output_dir.to_string_lossy())
            .prompt()?;

        Ok(
            DownloadParams::new(&format!("{}:{}", host.trim(), port.trim()), output_dir)
                .with_connect_timeout(self.timeout()),
        )
    }
}
