//! TLS listener configuration.

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;

use crate::config::TlsConfig;
use crate::downstream::tls::crypto_provider;

/// Load the listener certificate chain and private key (PEM).
///
/// The server config is built on the same ring provider as outbound calls,
/// so it does not depend on a process-wide default being installed.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, io::Error> {
    let cert_path = Path::new(&tls.cert_path);
    let key_path = Path::new(&tls.key_path);

    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {:?}", kind, path),
            ));
        }
    }

    let certs = CertificateDer::pem_file_iter(cert_path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|e| invalid_data(format!("certificate {:?}: {}", cert_path, e)))?;
    if certs.is_empty() {
        return Err(invalid_data(format!("no certificate in {:?}", cert_path)));
    }
    let key = PrivateKeyDer::from_pem_file(key_path)
        .map_err(|e| invalid_data(format!("private key {:?}: {}", key_path, e)))?;

    let mut config = ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .and_then(|builder| builder.with_no_client_auth().with_single_cert(certs, key))
        .map_err(|e| invalid_data(e.to_string()))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/tls/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[tokio::test]
    async fn test_missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let tls = TlsConfig {
            cert_path: dir.path().join("cert.pem").display().to_string(),
            key_path: dir.path().join("key.pem").display().to_string(),
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Certificate"));
    }

    #[tokio::test]
    async fn test_loads_pem_pair() {
        let tls = TlsConfig {
            cert_path: fixture("cert.pem"),
            key_path: fixture("key.pem"),
        };
        let config = load_tls_config(&tls).await.unwrap();
        assert!(config.get_inner().alpn_protocols.contains(&b"http/1.1".to_vec()));
    }

    #[tokio::test]
    async fn test_garbage_key_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.pem");
        std::fs::write(&key_path, "not a key").unwrap();
        let tls = TlsConfig {
            cert_path: fixture("cert.pem"),
            key_path: key_path.display().to_string(),
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
