//! TLS configuration and certificate loading.

use std::io;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

/// Load the PEM certificate chain and private key.
pub async fn load_tls_config(paths: &TlsPaths) -> io::Result<RustlsConfig> {
    for (what, path) in [("certificate", &paths.cert_path), ("private key", &paths.key_path)] {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", what, path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(&paths.cert_path, &paths.key_path).await
}
