use x509_parser::{certificate::X509Certificate, parse_x509_certificate};

use crate::error::Error;

/// One certificate of the chain presented by a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// 0-based position in the transmitted chain (0 is the leaf)
    pub order: usize,
    pub subject: String,
    pub issuer: String,
    pub common_name: Option<String>,
    pub raw_der: Vec<u8>,
}

/// Parse every DER entry of `raw_chain`, keeping the transmitted order.
///
/// This is structural parsing only: neither the signatures nor the issuer
/// links between the certificates are checked.
pub fn extract_chain<T: AsRef<[u8]>>(raw_chain: &[T]) -> Result<Vec<CertificateRecord>, Error> {
    raw_chain
        .iter()
        .enumerate()
        .map(|(order, der)| parse_record(order, der.as_ref()))
        .collect()
}

pub fn parse_record(order: usize, der: &[u8]) -> Result<CertificateRecord, Error> {
    let invalid = |reason: String| Error::CertificateParseError {
        index: order,
        reason,
    };

    let (rem, certificate) = parse_x509_certificate(der).map_err(|e| invalid(e.to_string()))?;

    if !rem.is_empty() {
        return Err(invalid(format!(
            "{} trailing byte(s) after the certificate",
            rem.len()
        )));
    }

    Ok(CertificateRecord {
        order,
        subject: certificate.subject().to_string(),
        issuer: certificate.issuer().to_string(),
        common_name: common_name(&certificate),
        raw_der: der.to_vec(),
    })
}

fn common_name(certificate: &X509Certificate) -> Option<String> {
    certificate
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_owned)
}
