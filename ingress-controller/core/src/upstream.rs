use serde::Serialize;

/// A named, load-balanced group of backend endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,
    pub lb_method: String,
    pub zone_size: String,
    pub servers: Vec<UpstreamServer>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamServer {
    pub address: String,
    pub port: u16,
    pub max_fails: u32,

    /// Zero means unbounded.
    pub max_conns: u32,
    pub fail_timeout: String,

    /// Indicates that `address` is a DNS name that the proxy must re-resolve at runtime.
    pub resolve: bool,
}

// === impl Upstream ===

impl Upstream {
    /// Address of the local responder that answers 502 when a service has no ready endpoints.
    pub const PLACEHOLDER_ADDRESS: &'static str = "127.0.0.1";
    pub const PLACEHOLDER_PORT: u16 = 8181;
}
