use crate::{
    configs::{Input, IngressFiles, MergeableType, PemFile},
    k8s::{MergeableIngresses, ResolvedIngress, ResourceId},
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Resolved Ingresses, as written by the watch loop.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub ingresses: Vec<ResolvedIngress>,
}

/// Describes where secret files are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLayout {
    pub secrets_dir: PathBuf,

    /// The certificate for TLS bindings that do not name a secret.
    pub wildcard: Option<PathBuf>,
}

// === impl Manifest ===

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open manifest {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Groups the manifest's Ingresses into independent compilation inputs.
    ///
    /// Each master claims its hosts; a later master for an already claimed host is skipped.
    /// Minions join the master serving their first host; a minion without a master is skipped.
    /// Inputs are ordered as their standalone Ingress or master appears in the manifest.
    pub fn into_inputs(self, layout: &FileLayout) -> Vec<Input> {
        // Standalone Ingresses have no minion list.
        let mut groups = Vec::<(ResolvedIngress, Option<Vec<ResolvedIngress>>)>::new();
        let mut masters_by_host = BTreeMap::<String, usize>::new();
        let mut minions = Vec::new();

        for ingress in self.ingresses {
            let Ok(id) = ingress.id() else {
                warn!(name = ?ingress.ingress.metadata.name, "Skipping Ingress without a namespace or name");
                continue;
            };

            let role = match MergeableType::from_annotations(ingress.annotations()) {
                Ok(role) => role,
                Err(error) => {
                    warn!(ingress = %id, %error, "Compiling as a standalone Ingress");
                    None
                }
            };
            match role {
                Some(MergeableType::Minion) => minions.push((id, ingress)),
                Some(MergeableType::Master) => {
                    let hosts = ingress.hosts();
                    if let Some(host) = hosts.iter().find(|h| masters_by_host.contains_key(*h)) {
                        warn!(ingress = %id, %host, "Skipping master for a claimed host");
                        continue;
                    }
                    let idx = groups.len();
                    masters_by_host.extend(hosts.into_iter().map(|host| (host, idx)));
                    groups.push((ingress, Some(vec![])));
                }
                None => groups.push((ingress, None)),
            }
        }

        for (id, minion) in minions {
            let master = minion
                .hosts()
                .first()
                .and_then(|host| masters_by_host.get(host))
                .copied();
            match master {
                Some(idx) => groups[idx].1.get_or_insert_with(Vec::new).push(minion),
                None => info!(ingress = %id, "Skipping minion without a master"),
            }
        }

        groups
            .into_iter()
            .map(|(master, minions)| {
                let files = layout.ingress_files(&master);
                let Some(minions) = minions else {
                    return Input::Standalone {
                        ingress: master,
                        files,
                    };
                };
                let minion_jwt_key_files = minions
                    .iter()
                    .filter_map(|minion| {
                        let id = minion.id().ok()?;
                        let key = layout.jwt_key_file(minion, &id);
                        Some((id, key))
                    })
                    .collect();
                Input::Merged {
                    set: MergeableIngresses { master, minions },
                    master_files: files,
                    minion_jwt_key_files,
                }
            })
            .collect()
    }
}

// === impl FileLayout ===

impl FileLayout {
    pub fn ingress_files(&self, ingress: &ResolvedIngress) -> IngressFiles {
        let Ok(id) = ingress.id() else {
            return IngressFiles::default();
        };

        let mut pems = BTreeMap::new();
        for tls in ingress.tls() {
            let pem = match tls.secret_name.as_deref().filter(|s| !s.is_empty()) {
                Some(secret) => match ingress.tls_secrets.get(secret) {
                    Some(Some(_)) => PemFile::Resolved(self.secret_file(&id.namespace, secret)),
                    _ => {
                        warn!(ingress = %id, %secret, "TLS secret could not be resolved");
                        PemFile::Missing
                    }
                },
                None => match self.wildcard.as_ref() {
                    Some(wildcard) => PemFile::Wildcard(wildcard.display().to_string()),
                    None => continue,
                },
            };
            for host in tls.hosts.iter().flatten() {
                pems.entry(host.clone()).or_insert_with(|| pem.clone());
            }
        }

        IngressFiles {
            pems,
            app_protect: BTreeMap::new(),
            jwt_key_file: self.jwt_key_file(ingress, &id),
        }
    }

    /// The key file for the Ingress's JWT secret, or empty if the secret was not resolved.
    fn jwt_key_file(&self, ingress: &ResolvedIngress, id: &ResourceId) -> String {
        match ingress.jwt_key.as_ref() {
            Some(key) if key.secret.is_some() => self.secret_file(&id.namespace, &key.name),
            _ => String::new(),
        }
    }

    fn secret_file(&self, namespace: &str, name: &str) -> String {
        let id = ResourceId::new(namespace.to_string(), name.to_string());
        self.secrets_dir.join(id.file_name()).display().to_string()
    }
}
