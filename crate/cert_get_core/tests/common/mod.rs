#![allow(dead_code)]

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
    thread,
    time::Duration,
};

use der::{Decode, Encode};
use p256::{ecdsa::DerSignature, pkcs8::EncodePrivateKey, pkcs8::EncodePublicKey};
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::{
    builder::{Builder, CertificateBuilder, Profile},
    name::Name,
    serial_number::SerialNumber,
    time::Validity,
};

pub struct TestChain {
    /// DER certificates, leaf first
    pub certificates: Vec<Vec<u8>>,
    /// PKCS#8 DER private key of the leaf
    pub leaf_key: Vec<u8>,
}

pub fn leaf_subject() -> &'static str {
    "CN=leaf.cert-get.test,O=cert-get"
}

pub fn ca_subject(depth: usize) -> String {
    format!("CN=ca-{depth}.cert-get.test,O=cert-get")
}

/// Generate a chain of `len` P-256 certificates: a leaf, `len - 2`
/// intermediates and a self-signed root. With `len == 1` the leaf is
/// self-signed.
pub fn generate_chain(len: usize) -> TestChain {
    assert!(len >= 1);
    let mut csrng = ChaChaRng::from_entropy();

    let keys: Vec<p256::SecretKey> = (0..len)
        .map(|_| p256::SecretKey::random(&mut csrng))
        .collect();
    // keys[0] is the leaf, keys[len - 1] the root
    let subjects: Vec<String> = (0..len)
        .map(|i| {
            if i == 0 {
                leaf_subject().to_owned()
            } else {
                ca_subject(i)
            }
        })
        .collect();

    let mut certificates = Vec::with_capacity(len);
    for i in 0..len {
        let issuer_index = if i + 1 < len { i + 1 } else { i };
        let subject = Name::from_str(&subjects[i]).unwrap();
        let issuer = Name::from_str(&subjects[issuer_index]).unwrap();

        let profile = if i == issuer_index {
            Profile::Root
        } else if i == 0 {
            Profile::Leaf {
                issuer,
                enable_key_agreement: false,
                enable_key_encipherment: false,
                include_subject_key_identifier: true,
            }
        } else {
            Profile::SubCA {
                issuer,
                path_len_constraint: None,
            }
        };

        let public_key = keys[i].public_key().to_public_key_der().unwrap();
        let pk_info = SubjectPublicKeyInfoOwned::from_der(public_key.as_bytes()).unwrap();
        let signer = p256::ecdsa::SigningKey::from(keys[issuer_index].clone());

        let builder = CertificateBuilder::new(
            profile,
            SerialNumber::from(i as u32 + 1),
            Validity::from_now(Duration::from_secs(24 * 60 * 60)).unwrap(),
            subject,
            pk_info,
            &signer,
        )
        .unwrap();

        let certificate = builder.build::<DerSignature>().unwrap();
        certificates.push(certificate.to_der().unwrap());
    }

    TestChain {
        certificates,
        leaf_key: keys[0].to_pkcs8_der().unwrap().as_bytes().to_vec(),
    }
}

/// Serve `chain` over TLS on an ephemeral localhost port, forever
pub fn spawn_tls_server(chain: &TestChain) -> SocketAddr {
    let config = rustls::ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(
            chain
                .certificates
                .iter()
                .cloned()
                .map(rustls::Certificate)
                .collect(),
            rustls::PrivateKey(chain.leaf_key.clone()),
        )
        .unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut socket) = stream else {
                break;
            };
            let Ok(mut server) = rustls::ServerConnection::new(config.clone()) else {
                break;
            };
            while server.is_handshaking() {
                if server.complete_io(&mut socket).is_err() {
                    break;
                }
            }
            // wait for the client close_notify or EOF
            let _ = server.complete_io(&mut socket);
        }
    });

    address
}

/// Answer every connection with a plain HTTP error, like a non-TLS service
pub fn spawn_plain_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut socket) = stream else {
                break;
            };
            let mut buffer = [0u8; 4096];
            let _ = socket.read(&mut buffer);
            let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n");
        }
    });

    address
}

/// A localhost port nothing listens on
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
