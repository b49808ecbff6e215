use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    process,
};

use der::pem::{self, LineEnding};
use log::{debug, warn};

use crate::{chain::CertificateRecord, error::Error};

const PEM_LABEL: &str = "CERTIFICATE";

/// File name of the certificate at position `order` in the chain
pub fn cert_file_name(order: usize) -> String {
    format!("cert-{order}.pem")
}

/// Create `dir` if missing and check it can receive certificates
pub fn ensure_output_dir(dir: &Path) -> Result<(), Error> {
    let invalid = |reason: String| Error::OutputDirError {
        path: dir.to_path_buf(),
        reason,
    };

    match fs::metadata(dir) {
        Ok(metadata) if !metadata.is_dir() => {
            Err(invalid("exists and is not a directory".to_owned()))
        }
        Ok(_) => check_writable(dir).map_err(|e| invalid(format!("not writable: {e}"))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("creating {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| invalid(e.to_string()))
        }
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Create then remove a scratch file, so permission problems surface here
/// rather than on the first certificate write
fn check_writable(dir: &Path) -> io::Result<()> {
    let scratch = dir.join(format!(".cert-get-{}.tmp", process::id()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)?;

    if let Err(e) = fs::remove_file(&scratch) {
        warn!("can't remove {}: {e}", scratch.display());
    }
    Ok(())
}

pub fn to_pem(record: &CertificateRecord) -> Result<String, pem::Error> {
    pem::encode_string(PEM_LABEL, LineEnding::LF, &record.raw_der)
}

/// Write one PEM file per record into `dir`.
///
/// Files are named after the record order so a new retrieval overwrites the
/// previous one. `cert-<k>.pem` files left over from a longer chain are
/// removed afterwards. Returns the written paths, in record order.
pub fn write_chain(dir: &Path, records: &[CertificateRecord]) -> Result<Vec<PathBuf>, Error> {
    ensure_output_dir(dir)?;

    let mut files = Vec::with_capacity(records.len());
    for record in records {
        let path = dir.join(cert_file_name(record.order));

        let pem = to_pem(record).map_err(|e| Error::WriteError {
            path: path.clone(),
            reason: format!("pem encoding: {e}"),
        })?;
        fs::write(&path, pem).map_err(|e| Error::WriteError {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!("#{} {:?} -> {}", record.order, record.subject, path.display());
        files.push(path);
    }

    remove_stale_files(dir, records.len());

    Ok(files)
}

fn remove_stale_files(dir: &Path, from: usize) {
    for order in from.. {
        let path = dir.join(cert_file_name(order));
        if !path.is_file() {
            break;
        }

        if let Err(e) = fs::remove_file(&path) {
            warn!("can't remove stale {}: {e}", path.display());
            break;
        }
        debug!("removed stale {}", path.display());
    }
}
