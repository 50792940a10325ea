use crate::IngressRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// The configuration of a single virtual host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub name: String,
    pub server_tokens: String,
    pub locations: Vec<Location>,

    pub ssl: bool,
    pub ssl_certificate: Option<String>,
    pub ssl_certificate_key: Option<String>,

    /// Overrides the listener's cipher list. `NULL` disables every cipher.
    pub ssl_ciphers: Option<String>,
    pub ssl_redirect: bool,
    pub redirect_to_https: bool,

    pub status_zone: String,
    pub hsts: bool,
    pub hsts_max_age: i64,
    pub hsts_include_subdomains: bool,
    pub hsts_behind_proxy: bool,

    pub ports: Vec<u16>,
    pub ssl_ports: Vec<u16>,

    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,
    pub server_snippets: Vec<String>,

    /// Active health checks, keyed by upstream name.
    pub health_checks: BTreeMap<String, HealthCheck>,

    pub jwt_auth: Option<JwtAuth>,
    pub jwt_redirect_locations: Vec<JwtRedirectLocation>,

    /// Indicates that clients must present mesh identity certificates.
    pub spiffe_certs: bool,

    pub app_protect: Option<AppProtect>,
}

/// Routes a request path to an upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub path: String,
    pub upstream: String,
    pub service_name: String,

    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub proxy_buffering: bool,
    pub proxy_buffers: Option<String>,
    pub proxy_buffer_size: Option<String>,
    pub proxy_max_temp_file_size: Option<String>,
    pub location_snippets: Vec<String>,

    /// Indicates that the upstream connection uses TLS.
    pub ssl: bool,
    pub proxy_ssl_name: String,

    pub jwt_auth: Option<JwtAuth>,

    /// Set when the location was contributed by a minion.
    pub minion_ingress: Option<IngressRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuth {
    pub key: String,
    pub realm: String,
    pub token: String,
    pub redirect_location_name: Option<String>,
}

/// A named internal location that redirects unauthenticated clients to a login page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtRedirectLocation {
    pub name: String,
    pub login_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub upstream_name: String,
    pub uri: String,
    pub scheme: String,
    pub interval: i32,
    pub fails: i32,
    pub passes: i32,
    pub timeout_seconds: i64,
    pub mandatory: bool,
    pub mandatory_queue: i64,
    pub headers: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppProtect {
    pub enable: bool,
    pub policy: Option<String>,
    pub log_enable: bool,
    pub log_conf: Option<String>,
    pub log_destination: Option<String>,
}

// === impl Server ===

impl Server {
    pub fn has_location(&self, path: &str) -> bool {
        self.locations.iter().any(|loc| loc.path == path)
    }

    /// Registers a redirect location unless one with the same name already exists.
    pub fn add_jwt_redirect_location(&mut self, redirect: JwtRedirectLocation) {
        if !self
            .jwt_redirect_locations
            .iter()
            .any(|r| r.name == redirect.name)
        {
            self.jwt_redirect_locations.push(redirect);
        }
    }
}
