use crate::{
    Ingress, IngressBackend, IngressRule, IngressTLS, MissingMetadata, Probe, ResourceExt,
    ResourceId, Secret,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An Ingress resource together with the cluster state it references, resolved by the caller.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIngress {
    pub ingress: Ingress,

    /// TLS secrets by name. `None` indicates that the secret could not be resolved.
    #[serde(default)]
    pub tls_secrets: BTreeMap<String, Option<Secret>>,

    /// Ready `address:port` endpoints, keyed by `<service><port>`.
    #[serde(default)]
    pub endpoints: BTreeMap<String, Vec<String>>,

    /// Services of type `ExternalName`, whose endpoints are DNS names.
    #[serde(default)]
    pub external_name_services: BTreeSet<String>,

    /// Readiness probes of the pods backing each service port, keyed by `<service><port>`.
    #[serde(default)]
    pub health_checks: BTreeMap<String, Probe>,

    #[serde(default)]
    pub jwt_key: Option<JwtKey>,
}

/// The secret referenced by an Ingress's JWT key annotation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtKey {
    pub name: String,
    #[serde(default)]
    pub secret: Option<Secret>,
}

/// A master Ingress and the minions that contribute paths to its hosts.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeableIngresses {
    pub master: ResolvedIngress,
    #[serde(default)]
    pub minions: Vec<ResolvedIngress>,
}

// === impl ResolvedIngress ===

impl ResolvedIngress {
    pub fn id(&self) -> Result<ResourceId, MissingMetadata> {
        ResourceId::from_meta(&self.ingress.metadata)
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        self.ingress.annotations()
    }

    pub fn rules(&self) -> impl Iterator<Item = &IngressRule> {
        self.ingress
            .spec
            .iter()
            .flat_map(|spec| spec.rules.iter().flatten())
    }

    pub fn tls(&self) -> impl Iterator<Item = &IngressTLS> {
        self.ingress
            .spec
            .iter()
            .flat_map(|spec| spec.tls.iter().flatten())
    }

    pub fn default_backend(&self) -> Option<&IngressBackend> {
        self.ingress.spec.as_ref()?.default_backend.as_ref()
    }

    /// Hosts served by this Ingress, in rule order and without duplicates.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts = Vec::new();
        for rule in self.rules() {
            let host = rule.host.clone().unwrap_or_default();
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
        hosts
    }
}
