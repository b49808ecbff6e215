use std::{
    io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::{Duration, SystemTime},
};

use log::debug;
use rustls::{
    client::{ServerCertVerified, ServerCertVerifier, ServerName},
    Certificate, ClientConfig, ClientConnection, Error as RustTLSError, RootCertStore,
};

use crate::{endpoint::Endpoint, error::Error};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// DER certificates in the order the server sent them
pub type RawChain = Vec<Vec<u8>>;

/// Accept whatever certificate the server presents.
///
/// Handshake signatures are still checked by the default trait methods, so
/// the handshake runs to completion against a genuine TLS server.
pub struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _: &Certificate,                    // end_entity
        _: &[Certificate],                  // intermediates
        _: &ServerName,                     // server_name
        _: &mut dyn Iterator<Item = &[u8]>, // scts
        _: &[u8],                           // ocsp_response
        _: SystemTime,                      // now
    ) -> Result<ServerCertVerified, RustTLSError> {
        Ok(ServerCertVerified::assertion())
    }
}

/// Get the certificate chain presented by `endpoint`.
///
/// `timeout` bounds the TCP connect to each resolved address and every
/// read or write performed during the handshake.
pub fn fetch_chain(endpoint: &Endpoint, timeout: Duration) -> Result<RawChain, Error> {
    let server_name = ServerName::try_from(endpoint.server_name()).map_err(|e| {
        Error::HandshakeError(format!(
            "{endpoint}: {:?} is not a valid server name: {e}",
            endpoint.server_name()
        ))
    })?;

    let mut socket = connect(endpoint, timeout)?;
    socket
        .set_read_timeout(Some(timeout))
        .and_then(|_| socket.set_write_timeout(Some(timeout)))
        .map_err(|e| Error::ConnectionError(format!("{endpoint}: {e}")))?;

    let mut config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(RootCertStore::empty())
        .with_no_client_auth();
    config
        .dangerous()
        .set_certificate_verifier(Arc::new(NoVerifier));

    let mut client = ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| Error::HandshakeError(format!("{endpoint}: {e}")))?;

    while client.is_handshaking() {
        client
            .complete_io(&mut socket)
            .map_err(|e| handshake_error(endpoint, &e))?;
    }

    let chain: RawChain = client
        .peer_certificates()
        .map(|certificates| certificates.iter().map(|c| c.0.clone()).collect())
        .unwrap_or_default();

    debug!(
        "{endpoint}: handshake done ({:?}, {} certificate(s))",
        client.protocol_version(),
        chain.len()
    );

    close(&mut client, &mut socket);

    if chain.is_empty() {
        return Err(Error::HandshakeError(format!(
            "{endpoint}: the server offered no certificate"
        )));
    }

    Ok(chain)
}

/// Try each resolved address of `endpoint` in turn
fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream, Error> {
    let addresses: Vec<SocketAddr> = (endpoint.server_name(), endpoint.port())
        .to_socket_addrs()
        .map_err(|e| Error::ConnectionError(format!("{endpoint}: can't resolve host: {e}")))?
        .collect();

    let mut last_error = None;
    for address in addresses {
        debug!("{endpoint}: connecting to {address}");
        match TcpStream::connect_timeout(&address, timeout) {
            Ok(socket) => return Ok(socket),
            Err(e) => {
                debug!("{endpoint}: {address}: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(Error::ConnectionError(match last_error {
        Some(e) => format!("{endpoint}: {e}"),
        None => format!("{endpoint}: host resolved to no address"),
    }))
}

fn handshake_error(endpoint: &Endpoint, error: &io::Error) -> Error {
    match error.kind() {
        io::ErrorKind::UnexpectedEof => Error::HandshakeError(format!(
            "{endpoint}: connection closed by peer during the handshake"
        )),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::HandshakeError(format!(
            "{endpoint}: timed out waiting for the server handshake"
        )),
        _ => Error::HandshakeError(format!("{endpoint}: {error}")),
    }
}

/// Best effort `close_notify`, the socket is dropped by the caller anyway
fn close(client: &mut ClientConnection, socket: &mut TcpStream) {
    client.send_close_notify();
    while client.wants_write() {
        if let Err(e) = client.write_tls(socket) {
            debug!("close_notify not sent: {e}");
            break;
        }
    }
}
