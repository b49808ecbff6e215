//! Retrieval of the certificate chain presented by a TLS server.
//!
//! [`download_certs`] connects to a `host:port` address, completes a TLS
//! handshake without trusting the server, and writes every certificate the
//! server sent to `<output_dir>/cert-<n>.pem`, leaf first.

use std::path::Path;

pub mod chain;
pub mod endpoint;
pub mod error;
pub mod handshake;
pub mod output;
pub mod retrieval;

pub use chain::CertificateRecord;
pub use endpoint::{Endpoint, DEFAULT_PORT};
pub use error::Error;
pub use handshake::DEFAULT_CONNECT_TIMEOUT;
pub use retrieval::{
    retrieve_with, DownloadParams, RetrievalResult, RetrievalState, RetrievalSummary,
    SavedCertificate, Stage,
};

/// Download all certificates from the TLS server at `address`.
///
/// Blocking. Hosts with an event loop should call it from a worker thread.
pub fn download_certs(address: &str, output_dir: impl AsRef<Path>) -> Result<RetrievalSummary, Error> {
    download_certs_with(&DownloadParams::new(address, output_dir))
}

pub fn download_certs_with(params: &DownloadParams) -> Result<RetrievalSummary, Error> {
    retrieve_with(params, |_| {})
}
