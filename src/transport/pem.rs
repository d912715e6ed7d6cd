//! Loads PEM-encoded certificate/key material for the TLS, DTLS, and RELP-TLS transports.

use std::io;
use std::path::Path;

use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslConnector, SslConnectorBuilder, SslFiletype, SslMethod, SslVerifyMode, SslVersion};
use openssl::x509::X509;

/// Reads a PEM certificate chain from disk.
pub fn read_certificate(path: impl AsRef<Path>) -> io::Result<X509> {
    let bytes = std::fs::read(path)?;
    X509::from_pem(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Reads a PEM private key from disk.
pub fn read_private_key(path: impl AsRef<Path>) -> io::Result<PKey<Private>> {
    let bytes = std::fs::read(path)?;
    PKey::private_key_from_pem(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Builds an [`SslConnectorBuilder`] for the given method, applying the CA/cert/key files and
/// custom `SSL_CONF_cmd`-style settings that `-x`/`-z`/`-Z`/`-k` provide.
pub fn build_connector(
    method: SslMethod,
    ca_file: Option<&Path>,
    cert_file: Option<&Path>,
    key_file: Option<&Path>,
    custom: &[(String, String)],
) -> io::Result<SslConnector> {
    let mut builder: SslConnectorBuilder = SslConnector::builder(method)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    // This tool never authenticates the peer by design: it stresses a receiver's parsing and
    // ingestion path, not its certificate validation, and test receivers are routinely run
    // with self-signed certs that wouldn't otherwise validate.
    builder.set_verify(SslVerifyMode::NONE);

    if let Some(ca) = ca_file {
        builder
            .set_ca_file(ca)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    }
    if let Some(cert) = cert_file {
        builder
            .set_certificate_file(cert, SslFiletype::PEM)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    }
    if let Some(key) = key_file {
        builder
            .set_private_key_file(key, SslFiletype::PEM)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    }
    for (cmd, value) in custom {
        apply_custom_config_cmd(&mut builder, cmd, value);
    }
    Ok(builder.build())
}

/// Applies the subset of OpenSSL's `SSL_CONF_cmd` command names that the safe `openssl` crate
/// exposes equivalents for. Unrecognized commands are logged and skipped rather than failing
/// the connect, since `-k` is a free-form passthrough and not every command has a binding.
fn apply_custom_config_cmd(builder: &mut SslConnectorBuilder, cmd: &str, value: &str) {
    match cmd {
        "CipherString" | "Ciphersuites" => {
            if let Err(e) = builder.set_cipher_list(value) {
                tracing::warn!(cmd = %cmd, value = %value, error = %e, "failed to apply custom TLS cipher list");
            }
        }
        "MinProtocol" => match parse_ssl_version(value) {
            Some(v) => {
                if let Err(e) = builder.set_min_proto_version(Some(v)) {
                    tracing::warn!(cmd = %cmd, value = %value, error = %e, "failed to apply MinProtocol");
                }
            }
            None => tracing::warn!(cmd = %cmd, value = %value, "unrecognized protocol version"),
        },
        "MaxProtocol" => match parse_ssl_version(value) {
            Some(v) => {
                if let Err(e) = builder.set_max_proto_version(Some(v)) {
                    tracing::warn!(cmd = %cmd, value = %value, error = %e, "failed to apply MaxProtocol");
                }
            }
            None => tracing::warn!(cmd = %cmd, value = %value, "unrecognized protocol version"),
        },
        other => tracing::debug!(cmd = %other, value = %value, "unrecognized custom TLS config command, ignored"),
    }
}

fn parse_ssl_version(value: &str) -> Option<SslVersion> {
    match value {
        "SSLv3" => Some(SslVersion::SSL3),
        "TLSv1" => Some(SslVersion::TLS1),
        "TLSv1.1" => Some(SslVersion::TLS1_1),
        "TLSv1.2" => Some(SslVersion::TLS1_2),
        "TLSv1.3" => Some(SslVersion::TLS1_3),
        _ => None,
    }
}
