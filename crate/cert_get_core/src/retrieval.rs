use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info};

use crate::{
    chain::{extract_chain, CertificateRecord},
    endpoint::Endpoint,
    error::Error,
    handshake::{fetch_chain, DEFAULT_CONNECT_TIMEOUT},
    output::write_chain,
};

/// Pipeline stages an [`Error`] can be raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parsing,
    Connecting,
    Extracting,
    Writing,
}

/// State of a retrieval.
///
/// `Idle -> Parsing -> Connecting -> Extracting -> Writing -> Done`, or
/// `Failed` from any non-terminal state. The error of a failed retrieval is
/// the one returned by [`retrieve_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalState {
    Idle,
    Parsing,
    Connecting,
    Extracting,
    Writing,
    Done,
    Failed(Stage),
}

impl RetrievalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetrievalState::Done | RetrievalState::Failed(_))
    }
}

/// Options for the download of server certificates
#[derive(Debug, Clone)]
pub struct DownloadParams {
    /// Server address, `HOST:PORT` or `IP:PORT`
    pub address: String,
    /// Directory the certificates are written to, created if missing
    pub output_dir: PathBuf,
    /// Bound on the TCP connect and on each handshake read/write
    pub connect_timeout: Duration,
}

impl DownloadParams {
    pub fn new(address: &str, output_dir: impl AsRef<Path>) -> Self {
        DownloadParams {
            address: address.to_owned(),
            output_dir: output_dir.as_ref().to_path_buf(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// The chain fetched from `endpoint`, before it is written
#[derive(Debug)]
pub struct RetrievalResult {
    pub endpoint: Endpoint,
    pub records: Vec<CertificateRecord>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCertificate {
    pub order: usize,
    pub subject: String,
    pub common_name: Option<String>,
    pub path: PathBuf,
}

/// Outcome of a successful retrieval
#[derive(Debug, Clone)]
pub struct RetrievalSummary {
    pub endpoint: Endpoint,
    /// Number of certificates written
    pub count: usize,
    pub output_dir: PathBuf,
    /// One entry per certificate, leaf first
    pub files: Vec<SavedCertificate>,
}

struct StateMachine<F> {
    state: RetrievalState,
    observer: F,
}

impl<F: FnMut(RetrievalState)> StateMachine<F> {
    fn enter(&mut self, next: RetrievalState) {
        debug!("retrieval: {:?} -> {:?}", self.state, next);
        self.state = next;
        (self.observer)(next);
    }

    fn run(&mut self, params: &DownloadParams) -> Result<RetrievalSummary, Error> {
        self.enter(RetrievalState::Parsing);
        let endpoint = Endpoint::parse(&params.address)?;

        self.enter(RetrievalState::Connecting);
        let raw_chain = fetch_chain(&endpoint, params.connect_timeout)?;

        self.enter(RetrievalState::Extracting);
        let result = RetrievalResult {
            records: extract_chain(&raw_chain)?,
            endpoint,
            output_dir: params.output_dir.clone(),
        };

        self.enter(RetrievalState::Writing);
        let paths = write_chain(&result.output_dir, &result.records)?;

        let files = result
            .records
            .into_iter()
            .zip(paths)
            .map(|(record, path)| SavedCertificate {
                order: record.order,
                subject: record.subject,
                common_name: record.common_name,
                path,
            })
            .collect::<Vec<_>>();

        self.enter(RetrievalState::Done);

        Ok(RetrievalSummary {
            endpoint: result.endpoint,
            count: files.len(),
            output_dir: result.output_dir,
            files,
        })
    }
}

/// Run a single retrieval, reporting each state transition to `observer`.
///
/// The call blocks for the name resolution, the TCP connect and the TLS
/// handshake. Nothing is retried: the first error stops the pipeline.
pub fn retrieve_with<F>(params: &DownloadParams, observer: F) -> Result<RetrievalSummary, Error>
where
    F: FnMut(RetrievalState),
{
    let mut machine = StateMachine {
        state: RetrievalState::Idle,
        observer,
    };

    match machine.run(params) {
        Ok(summary) => {
            info!(
                "{}: {} certificate(s) written to {}",
                summary.endpoint,
                summary.count,
                summary.output_dir.display()
            );
            Ok(summary)
        }
        Err(error) => {
            machine.enter(RetrievalState::Failed(error.stage()));
            Err(error)
        }
    }
}
