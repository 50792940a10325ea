use ingress_controller_core::Server;

/// The certificate and key file for a host, resolved by the caller from the Ingress's TLS secret.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PemFile {
    /// The path of a combined certificate and key file.
    Resolved(String),

    /// The secret could not be resolved. The host still listens for TLS but rejects every
    /// handshake.
    Missing,

    /// The host is covered by the controller's wildcard certificate at this path.
    Wildcard(String),
}

/// Indicates whether the connection from the proxy to a backend uses TLS.
///
/// Backends listed as SSL services always do. With mesh identity certificates, every backend does
/// unless the Ingress is an internal route, whose traffic is already authenticated by the mesh.
pub fn ssl_enabled(ssl_service: bool, spiffe_server_certs: bool, spiffe_certs: bool) -> bool {
    ssl_service || (spiffe_certs && !spiffe_server_certs)
}

// === impl PemFile ===

impl PemFile {
    pub const MISSING_SECRET_PATH: &'static str = "/etc/nginx/secrets/default";

    /// A cipher list that disables every cipher.
    pub const NULL_CIPHERS: &'static str = "NULL";

    pub fn path(&self) -> &str {
        match self {
            Self::Resolved(path) | Self::Wildcard(path) => path,
            Self::Missing => Self::MISSING_SECRET_PATH,
        }
    }

    pub(crate) fn apply(&self, server: &mut Server) {
        server.ssl = true;
        server.ssl_certificate = Some(self.path().to_string());
        server.ssl_certificate_key = Some(self.path().to_string());
        if let Self::Missing = self {
            server.ssl_ciphers = Some(Self::NULL_CIPHERS.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, false, false)]
    #[case(false, false, true, true)]
    #[case(false, true, false, false)]
    #[case(false, true, true, false)]
    #[case(true, false, false, true)]
    #[case(true, false, true, true)]
    #[case(true, true, false, true)]
    #[case(true, true, true, true)]
    fn backend_tls(
        #[case] ssl_service: bool,
        #[case] spiffe_server_certs: bool,
        #[case] spiffe_certs: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(
            ssl_enabled(ssl_service, spiffe_server_certs, spiffe_certs),
            expected
        );
    }

    #[test]
    fn missing_secret_disables_ciphers() {
        let mut server = Server::default();
        PemFile::Missing.apply(&mut server);
        assert_eq!(
            server,
            Server {
                ssl: true,
                ssl_certificate: Some("/etc/nginx/secrets/default".to_string()),
                ssl_certificate_key: Some("/etc/nginx/secrets/default".to_string()),
                ssl_ciphers: Some("NULL".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn resolved_and_wildcard_use_their_path() {
        for pem in [
            PemFile::Resolved("/etc/nginx/secrets/default-cafe-secret".to_string()),
            PemFile::Wildcard("/etc/nginx/secrets/wildcard".to_string()),
        ] {
            let mut server = Server::default();
            pem.apply(&mut server);
            assert!(server.ssl);
            assert_eq!(server.ssl_certificate.as_deref(), Some(pem.path()));
            assert_eq!(server.ssl_certificate_key.as_deref(), Some(pem.path()));
            assert_eq!(server.ssl_ciphers, None);
        }
    }
}
