//! cert-get downloads the certificates presented by TLS servers.

use anyhow::Result;
use clap::Parser;

pub mod download;
pub mod progress;

use download::DownloadArgs;

fn main() -> Result<()> {
    log_init();

    DownloadArgs::parse().run()
}

/// Log at `info` unless `RUST_LOG` says otherwise
fn log_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
