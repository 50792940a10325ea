#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The renderer-ready model of an NGINX configuration compiled from one Ingress resource (or one
//! group of mergeable Ingress resources).
//!
//! Every value in this crate is built fresh for each compilation and is never mutated once it has
//! been attached to a [`ProxyConfig`].

pub mod server;
pub mod upstream;

pub use self::{
    server::{AppProtect, HealthCheck, JwtAuth, JwtRedirectLocation, Location, Server},
    upstream::{Upstream, UpstreamServer},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// The compiled configuration for an Ingress resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub upstreams: Vec<Upstream>,
    pub servers: Vec<Server>,

    /// The number of idle keepalive connections to upstreams, if configured.
    pub keepalive: Option<u32>,

    /// The resource this configuration was compiled from. For a merged group this is the master.
    pub ingress: IngressRef,

    /// Indicates that the proxy presents its own mesh identity when connecting to backends.
    pub spiffe_client_certs: bool,
}

/// Identifies an Ingress resource for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngressRef {
    pub namespace: String,
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}
