use std::collections::BTreeSet;

/// Parameters that control how an Ingress is compiled.
///
/// The `Default` value holds the process-wide defaults. Annotations never modify a value in place;
/// [`ConfigParams::with_annotations`](crate::ConfigParams::with_annotations) returns a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigParams {
    pub lb_method: String,
    pub upstream_zone_size: String,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    pub keepalive: u32,

    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub proxy_buffering: bool,
    pub proxy_buffers: Option<String>,
    pub proxy_buffer_size: Option<String>,
    pub proxy_max_temp_file_size: Option<String>,
    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,
    pub location_snippets: Vec<String>,

    pub server_tokens: String,
    pub server_snippets: Vec<String>,
    pub hsts: bool,
    pub hsts_max_age: i64,
    pub hsts_include_subdomains: bool,
    pub hsts_behind_proxy: bool,
    pub ssl_redirect: bool,
    pub redirect_to_https: bool,
    pub ports: Vec<u16>,
    pub ssl_ports: Vec<u16>,

    /// Services that expect TLS from the proxy.
    pub ssl_services: BTreeSet<String>,

    /// Set for internal routes, whose clients authenticate with mesh identity certificates.
    pub spiffe_server_certs: bool,

    pub jwt_key: Option<String>,
    pub jwt_realm: String,
    pub jwt_token: String,
    pub jwt_login_url: Option<String>,

    pub health_check_enabled: bool,
    pub health_check_mandatory: bool,
    pub health_check_mandatory_queue: i64,

    pub app_protect_enable: bool,
    pub app_protect_log_enable: bool,
    pub app_protect_log_destination: Option<String>,
}

/// Process-wide parameters that annotations cannot override.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticConfigParams {
    /// Indicates that the proxy holds mesh identity certificates.
    pub spiffe_certs: bool,

    /// Permits Ingresses to be marked as internal routes.
    pub enable_internal_routes: bool,

    /// Indicates that the App Protect module is loaded.
    pub app_protect: bool,

    pub external_name_policy: ExternalNamePolicy,
}

/// Describes how upstreams are built for `ExternalName` services.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExternalNamePolicy {
    /// Endpoints are used exactly as resolved by the caller.
    #[default]
    Static,

    /// Endpoints are DNS names that the proxy re-resolves through its configured resolver.
    Resolve,
}

// === impl ConfigParams ===

impl ConfigParams {
    pub const DEFAULT_HSTS_MAX_AGE: i64 = 2_592_000;
}

impl Default for ConfigParams {
    fn default() -> Self {
        Self {
            lb_method: "random two least_conn".to_string(),
            upstream_zone_size: "256k".to_string(),
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
            keepalive: 0,

            proxy_connect_timeout: "60s".to_string(),
            proxy_read_timeout: "60s".to_string(),
            proxy_send_timeout: "60s".to_string(),
            client_max_body_size: "1m".to_string(),
            proxy_buffering: true,
            proxy_buffers: None,
            proxy_buffer_size: None,
            proxy_max_temp_file_size: None,
            proxy_hide_headers: vec![],
            proxy_pass_headers: vec![],
            location_snippets: vec![],

            server_tokens: "on".to_string(),
            server_snippets: vec![],
            hsts: false,
            hsts_max_age: Self::DEFAULT_HSTS_MAX_AGE,
            hsts_include_subdomains: false,
            hsts_behind_proxy: false,
            ssl_redirect: true,
            redirect_to_https: false,
            ports: vec![80],
            ssl_ports: vec![443],

            ssl_services: BTreeSet::new(),
            spiffe_server_certs: false,

            jwt_key: None,
            jwt_realm: String::new(),
            jwt_token: String::new(),
            jwt_login_url: None,

            health_check_enabled: false,
            health_check_mandatory: false,
            health_check_mandatory_queue: 0,

            app_protect_enable: false,
            app_protect_log_enable: false,
            app_protect_log_destination: None,
        }
    }
}
