//! NGINX Ingress configuration compiler
//!
//! Compiles Kubernetes `Ingress` resources, together with the cluster state they reference, into
//! the renderer-ready model in `ingress-controller-core`:
//!
//! - Annotations are layered over process-wide defaults to produce the [`ConfigParams`] for each
//!   Ingress.
//! - Each backend service port reached through a host becomes an `Upstream`, named after the
//!   Ingress that references it.
//! - Each host becomes a `Server` and each path a `Location` routed to an upstream.
//! - Several Ingresses may share a host: a master Ingress owns the host's server block and its
//!   minions contribute locations to it.
//!
//! ```text
//! [ master ] -> [ Server ] <- [ Location ] <- [ minion ]
//!                                 |
//!                                 v
//!                            [ Upstream ]
//! ```
//!
//! Compilation is pure and deterministic: the same inputs always produce the same configuration.
//! Problems confined to a single annotation, endpoint, or path are reported as [`Warning`]s and
//! compilation continues. Conflicts that make a configuration unusable are [`Error`]s.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
mod health_check;
mod jwt;
mod location;
mod merge;
mod mergeable;
pub mod metrics;
mod params;
mod server;
mod tls;
mod upstream;

#[cfg(test)]
mod tests;

pub use self::{
    location::generate_ingress_path,
    mergeable::MergeableType,
    metrics::CompileMetrics,
    params::{ConfigParams, ExternalNamePolicy, StaticConfigParams},
    server::{APP_PROTECT_LOG_CONF, APP_PROTECT_POLICY},
    tls::{ssl_enabled, PemFile},
};
use ingress_controller_core::ProxyConfig;
use ingress_controller_k8s_api::{MergeableIngresses, MissingMetadata, ResolvedIngress, ResourceId};
use std::collections::BTreeMap;

/// Settings shared by every compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub defaults: ConfigParams,
    pub statics: StaticConfigParams,

    /// Enables features that require NGINX Plus.
    pub is_plus: bool,
}

/// Files the caller has written for an Ingress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngressFiles {
    /// Certificate and key files, by host.
    pub pems: BTreeMap<String, PemFile>,

    /// App Protect resource files, keyed by [`APP_PROTECT_POLICY`] and [`APP_PROTECT_LOG_CONF`].
    pub app_protect: BTreeMap<String, String>,

    /// The JWT key file. May be empty when the key could not be written.
    pub jwt_key_file: String,
}

/// A compiled configuration and the warnings reported while compiling it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compiled {
    pub config: ProxyConfig,

    /// Warnings, tagged with the Ingress they concern.
    pub warnings: Vec<(ResourceId, Warning)>,
}

/// An independent compilation input.
#[derive(Clone, Debug)]
pub enum Input {
    Standalone {
        ingress: ResolvedIngress,
        files: IngressFiles,
    },
    Merged {
        set: MergeableIngresses,
        master_files: IngressFiles,
        minion_jwt_key_files: BTreeMap<ResourceId, String>,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MissingMetadata(#[from] MissingMetadata),

    #[error("path {path:?} on host {host:?} is defined by both {first} and {second}")]
    DuplicatePath {
        host: String,
        path: String,
        first: ResourceId,
        second: ResourceId,
    },

    #[error("upstream {upstream} is defined by both {first} and {second}")]
    UpstreamConflict {
        upstream: String,
        first: ResourceId,
        second: ResourceId,
    },
}

/// A problem that does not prevent compilation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Warning {
    #[error("invalid value {value:?} for annotation {annotation}: {reason}")]
    InvalidAnnotation {
        annotation: String,
        value: String,
        reason: String,
    },

    #[error("annotation {annotation} is not permitted on a {role} and was ignored")]
    IgnoredAnnotation {
        annotation: String,
        role: MergeableType,
    },

    #[error("invalid endpoint {endpoint:?} for service {service}")]
    InvalidEndpoint { service: String, endpoint: String },

    #[error("path {path:?} on host {host:?} does not reference a service")]
    UnsupportedBackend { host: String, path: String },

    #[error("TLS is configured by the master; the minion's TLS configuration was ignored")]
    MinionTls,

    #[error("host {host:?} is not served by the master")]
    UnknownHost { host: String },

    #[error("JWT key secret {resolved:?} does not match annotated key {annotated:?}")]
    JwtKeyMismatch { annotated: String, resolved: String },
}

/// Compiles a standalone Ingress.
pub fn compile(
    ingress: &ResolvedIngress,
    files: &IngressFiles,
    settings: &Settings,
) -> Result<Compiled, Error> {
    merge::merge(ingress, &[], files, &BTreeMap::new(), settings)
}

/// Compiles a master Ingress and its minions into a single configuration.
///
/// Minion JWT key files are looked up by the minion's identity.
pub fn compile_merged(
    set: &MergeableIngresses,
    master_files: &IngressFiles,
    minion_jwt_key_files: &BTreeMap<ResourceId, String>,
    settings: &Settings,
) -> Result<Compiled, Error> {
    merge::merge(
        &set.master,
        &set.minions,
        master_files,
        minion_jwt_key_files,
        settings,
    )
}

/// Compiles independent inputs. A failing input does not affect the others.
pub fn compile_all(
    inputs: impl IntoIterator<Item = Input>,
    settings: &Settings,
) -> Vec<(ResourceId, Result<Compiled, Error>)> {
    inputs
        .into_iter()
        .map(|input| {
            let id = input.id().unwrap_or_default();
            let result = match &input {
                Input::Standalone { ingress, files } => compile(ingress, files, settings),
                Input::Merged {
                    set,
                    master_files,
                    minion_jwt_key_files,
                } => compile_merged(set, master_files, minion_jwt_key_files, settings),
            };
            if let Err(error) = &result {
                tracing::debug!(ingress = %id, %error, "Compilation failed");
            }
            (id, result)
        })
        .collect()
}

// === impl Input ===

impl Input {
    /// The identity of the standalone Ingress or of the master.
    pub fn id(&self) -> Result<ResourceId, MissingMetadata> {
        match self {
            Self::Standalone { ingress, .. } => ingress.id(),
            Self::Merged { set, .. } => set.master.id(),
        }
    }
}

// === impl Warning ===

impl Warning {
    /// A short, stable name for the kind of warning.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAnnotation { .. } => "invalid_annotation",
            Self::IgnoredAnnotation { .. } => "ignored_annotation",
            Self::InvalidEndpoint { .. } => "invalid_endpoint",
            Self::UnsupportedBackend { .. } => "unsupported_backend",
            Self::MinionTls => "minion_tls",
            Self::UnknownHost { .. } => "unknown_host",
            Self::JwtKeyMismatch { .. } => "jwt_key_mismatch",
        }
    }
}
