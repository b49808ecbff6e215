use std::path::PathBuf;

use thiserror::Error;

use crate::retrieval::Stage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("InvalidAddress: {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("ConnectionError: {0}")]
    ConnectionError(String),
    #[error("HandshakeError: {0}")]
    HandshakeError(String),
    #[error("CertificateParseError: certificate #{index}: {reason}")]
    CertificateParseError { index: usize, reason: String },
    #[error("OutputDirError: {}: {reason}", path.display())]
    OutputDirError { path: PathBuf, reason: String },
    #[error("WriteError: {}: {reason}", path.display())]
    WriteError { path: PathBuf, reason: String },
}

impl Error {
    /// Pipeline stage the error was raised in
    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidAddress { .. } => Stage::Parsing,
            Error::ConnectionError(_) | Error::HandshakeError(_) => Stage::Connecting,
            Error::CertificateParseError { .. } => Stage::Extracting,
            Error::OutputDirError { .. } | Error::WriteError { .. } => Stage::Writing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage() {
        let err = Error::InvalidAddress {
            address: "badhost".to_owned(),
            reason: "missing port".to_owned(),
        };
        assert_eq!(err.stage(), Stage::Parsing);
        assert_eq!(
            Error::HandshakeError("eof".to_owned()).stage(),
            Stage::Connecting
        );
        assert_eq!(
            Error::CertificateParseError {
                index: 2,
                reason: "bad".to_owned()
            }
            .stage(),
            Stage::Extracting
        );

        let err = Error::WriteError {
            path: PathBuf::from("/tmp/certs/cert-0.pem"),
            reason: "disk full".to_owned(),
        };
        assert_eq!(err.stage(), Stage::Writing);
        assert_eq!(
            err.to_string(),
            "WriteError: /tmp/certs/cert-0.pem: disk full"
        );
    }
}
