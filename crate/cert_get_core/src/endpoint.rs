use std::{fmt, str::FromStr};

use crate::error::Error;

pub const DEFAULT_PORT: u16 = 443;

/// A remote TLS server, as given by a `host:port` address.
///
/// Instances are only built through [`Endpoint::parse`] or [`Endpoint::new`],
/// so `host` is never empty and `port` is never 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Result<Self, Error> {
        Self::parse(&format!("{host}:{port}"))
    }

    /// Parse a `host:port` address.
    ///
    /// The address is split on its last `:` so that unbracketed IPv6 hosts
    /// still parse (`::1:443`). The port must be a decimal integer in
    /// `[1, 65535]` made of ASCII digits only.
    pub fn parse(address: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidAddress {
            address: address.to_owned(),
            reason: reason.to_owned(),
        };

        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing ':' between host and port"))?;

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("port is not a decimal integer"));
        }

        let port = match port.parse::<u16>() {
            Ok(0) | Err(_) => return Err(invalid("port is out of range [1, 65535]")),
            Ok(port) => port,
        };

        Ok(Endpoint {
            host: host.to_owned(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Host without IPv6 brackets, as used for SNI and name resolution
    pub fn server_name(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
