//! Compiles a master Ingress and its minions into a single configuration.
//!
//! The master owns one server block per host. Its own paths, if any, are routed first. Each
//! minion then contributes locations to the master's servers, in input order. A standalone
//! Ingress is compiled as a master without minions.

use crate::{
    annotations, health_check, jwt,
    location::{self, generate_ingress_path},
    mergeable::MergeableType,
    params::ConfigParams,
    server,
    upstream::{self, upstream_name},
    Compiled, Error, IngressFiles, Settings, Warning,
};
use ahash::AHashMap as HashMap;
use ingress_controller_core::{IngressRef, Location, ProxyConfig, Server, Upstream};
use ingress_controller_k8s_api::{PathType, ResolvedIngress, ResourceId, ServiceRef};
use std::collections::{hash_map::Entry, BTreeMap};

/// The Ingress whose paths are being compiled, with its resolved parameters.
pub(crate) struct Owner<'a> {
    pub(crate) id: ResourceId,
    pub(crate) ingress: &'a ResolvedIngress,
    pub(crate) params: ConfigParams,
    pub(crate) jwt_key_file: &'a str,

    /// Set when the owner is a minion.
    pub(crate) minion: Option<IngressRef>,
}

struct Builder<'s> {
    settings: &'s Settings,

    /// Internal routes are a property of the master's hosts and apply to every location on them.
    spiffe_server_certs: bool,

    servers: Vec<Server>,
    upstreams: Vec<Upstream>,
    upstream_owners: HashMap<String, ResourceId>,
    path_owners: HashMap<(usize, String), ResourceId>,
    warnings: Vec<(ResourceId, Warning)>,
}

pub(crate) fn merge(
    master: &ResolvedIngress,
    minions: &[ResolvedIngress],
    master_files: &IngressFiles,
    minion_jwt_key_files: &BTreeMap<ResourceId, String>,
    settings: &Settings,
) -> Result<Compiled, Error> {
    let master_id = master.id()?;
    let mut warnings = Vec::new();

    let mut master_annotations = master.annotations().clone();
    if merge_role(&master_annotations, &mut warnings) == Some(MergeableType::Master) {
        for annotation in annotations::filter_master(&mut master_annotations) {
            warnings.push(Warning::IgnoredAnnotation {
                annotation,
                role: MergeableType::Master,
            });
        }
    }
    let (params, param_warnings) = settings.defaults.with_annotations(
        &master_annotations,
        settings.is_plus,
        &settings.statics,
    );
    warnings.extend(param_warnings);
    warnings.extend(jwt::check_key(master, &params));

    let owner = Owner {
        id: master_id.clone(),
        ingress: master,
        params,
        jwt_key_file: &master_files.jwt_key_file,
        minion: None,
    };

    let mut builder = Builder {
        settings,
        spiffe_server_certs: owner.params.spiffe_server_certs,
        servers: master
            .hosts()
            .iter()
            .map(|host| server::build(host, &owner, master_files, &settings.statics))
            .collect(),
        upstreams: vec![],
        upstream_owners: HashMap::default(),
        path_owners: HashMap::default(),
        warnings: vec![],
    };
    builder.warn_all(&owner.id, warnings);

    let (mut pools, mut warnings) = builder.add_routes(&owner)?;
    let default_backend = match master.default_backend().map(ServiceRef::from_backend) {
        None => None,
        Some(Some(svc)) => {
            let name = upstream_name(&owner.id, "", &svc);
            let upstream = upstream::build(
                name.clone(),
                &owner,
                &svc,
                settings.statics.external_name_policy,
                &mut warnings,
            );
            pools.insert(name.clone(), upstream);
            Some((name, svc))
        }
        Some(None) => {
            warnings.push(Warning::UnsupportedBackend {
                host: String::new(),
                path: "/".to_string(),
            });
            None
        }
    };
    builder.add_pools(&owner.id, pools, warnings)?;

    for minion in minions {
        let minion_id = minion.id()?;
        let mut warnings = Vec::new();

        let mut annotations = minion.annotations().clone();
        for annotation in annotations::filter_minion(&mut annotations) {
            warnings.push(Warning::IgnoredAnnotation {
                annotation,
                role: MergeableType::Minion,
            });
        }
        annotations::inherit_from_master(&mut annotations, &master_annotations);
        let (params, param_warnings) =
            settings
                .defaults
                .with_annotations(&annotations, settings.is_plus, &settings.statics);
        warnings.extend(param_warnings);
        warnings.extend(jwt::check_key(minion, &params));
        if minion.tls().next().is_some() {
            warnings.push(Warning::MinionTls);
        }

        let minion_owner = Owner {
            minion: Some(ingress_ref(&minion_id, minion)),
            jwt_key_file: minion_jwt_key_files
                .get(&minion_id)
                .map(String::as_str)
                .unwrap_or_default(),
            id: minion_id,
            ingress: minion,
            params,
        };
        builder.warn_all(&minion_owner.id, warnings);

        let (pools, warnings) = builder.add_routes(&minion_owner)?;
        builder.add_pools(&minion_owner.id, pools, warnings)?;
    }

    if let Some((name, svc)) = default_backend {
        for idx in 0..builder.servers.len() {
            if builder.servers[idx].has_location("/") {
                continue;
            }
            let location = location::build(
                "/".to_string(),
                &name,
                &svc,
                &owner,
                builder.spiffe_server_certs,
                settings.statics.spiffe_certs,
            );
            builder.add_location(idx, location, &owner.id)?;
        }
    }

    tracing::debug!(
        ingress = %master_id,
        minions = minions.len(),
        servers = builder.servers.len(),
        upstreams = builder.upstreams.len(),
        "Compiled",
    );

    let config = ProxyConfig {
        upstreams: builder.upstreams,
        servers: builder.servers,
        keepalive: Some(owner.params.keepalive).filter(|k| *k > 0),
        ingress: ingress_ref(&master_id, master),
        spiffe_client_certs: settings.statics.spiffe_certs && !owner.params.spiffe_server_certs,
    };
    Ok(Compiled {
        config,
        warnings: builder.warnings,
    })
}

/// Reads the master's merge role. An invalid role is reported and treated as unset.
fn merge_role(
    annotations: &BTreeMap<String, String>,
    warnings: &mut Vec<Warning>,
) -> Option<MergeableType> {
    match MergeableType::from_annotations(annotations) {
        Ok(role) => role,
        Err(error) => {
            warnings.push(Warning::InvalidAnnotation {
                annotation: MergeableType::ANNOTATION.to_string(),
                value: annotations
                    .get(MergeableType::ANNOTATION)
                    .cloned()
                    .unwrap_or_default(),
                reason: error.to_string(),
            });
            None
        }
    }
}

fn ingress_ref(id: &ResourceId, ingress: &ResolvedIngress) -> IngressRef {
    IngressRef {
        namespace: id.namespace.clone(),
        name: id.name.clone(),
        annotations: ingress.annotations().clone(),
    }
}

// === impl Builder ===

impl Builder<'_> {
    /// Routes the owner's paths to the servers for their hosts, returning the owner's pools.
    fn add_routes(
        &mut self,
        owner: &Owner<'_>,
    ) -> Result<(BTreeMap<String, Upstream>, Vec<Warning>), Error> {
        let mut pools = BTreeMap::new();
        let mut warnings = Vec::new();

        // Minions authenticate their own locations; the master's auth is set on its servers.
        let location_jwt = owner
            .minion
            .as_ref()
            .and_then(|_| jwt::build(&owner.id, &owner.params, owner.jwt_key_file));

        for rule in owner.ingress.rules() {
            let host = rule.host.as_deref().unwrap_or_default();
            let Some(idx) = self.servers.iter().position(|s| s.name == host) else {
                warnings.push(Warning::UnknownHost {
                    host: host.to_string(),
                });
                continue;
            };

            for http_path in rule.http.iter().flat_map(|http| &http.paths) {
                let path = generate_ingress_path(
                    http_path.path.as_deref().unwrap_or_default(),
                    PathType::from_spec(&http_path.path_type),
                );
                let Some(svc) = ServiceRef::from_backend(&http_path.backend) else {
                    warnings.push(Warning::UnsupportedBackend {
                        host: host.to_string(),
                        path,
                    });
                    continue;
                };

                let name = upstream_name(&owner.id, host, &svc);
                if !pools.contains_key(&name) {
                    let upstream = upstream::build(
                        name.clone(),
                        owner,
                        &svc,
                        self.settings.statics.external_name_policy,
                        &mut warnings,
                    );
                    pools.insert(name.clone(), upstream);
                    self.add_health_check(idx, &name, &svc, owner);
                }

                let mut location = location::build(
                    path,
                    &name,
                    &svc,
                    owner,
                    self.spiffe_server_certs,
                    self.settings.statics.spiffe_certs,
                );
                if let Some((auth, redirect)) = location_jwt.as_ref() {
                    location.jwt_auth = Some(auth.clone());
                    if let Some(redirect) = redirect {
                        self.servers[idx].add_jwt_redirect_location(redirect.clone());
                    }
                }
                self.add_location(idx, location, &owner.id)?;
            }
        }

        Ok((pools, warnings))
    }

    fn add_health_check(&mut self, idx: usize, name: &str, svc: &ServiceRef, owner: &Owner<'_>) {
        if !self.settings.is_plus || !owner.params.health_check_enabled {
            return;
        }
        let Some(probe) = owner.ingress.health_checks.get(&svc.endpoints_key()) else {
            return;
        };
        if let Some(hc) = health_check::build(name, probe, &owner.params) {
            self.servers[idx].health_checks.insert(name.to_string(), hc);
        }
    }

    fn add_location(
        &mut self,
        idx: usize,
        location: Location,
        owner: &ResourceId,
    ) -> Result<(), Error> {
        match self.path_owners.entry((idx, location.path.clone())) {
            Entry::Occupied(entry) => {
                return Err(Error::DuplicatePath {
                    host: self.servers[idx].name.clone(),
                    path: location.path,
                    first: entry.get().clone(),
                    second: owner.clone(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(owner.clone());
            }
        }
        self.servers[idx].locations.push(location);
        Ok(())
    }

    /// Pool names embed the owner's namespace and name joined by `-`, so distinct owners may
    /// collide. A pool already added by the same owner is kept.
    fn add_pools(
        &mut self,
        owner: &ResourceId,
        pools: BTreeMap<String, Upstream>,
        warnings: Vec<Warning>,
    ) -> Result<(), Error> {
        for (name, upstream) in pools {
            match self.upstream_owners.entry(name) {
                Entry::Occupied(entry) if entry.get() != owner => {
                    return Err(Error::UpstreamConflict {
                        upstream: entry.key().clone(),
                        first: entry.get().clone(),
                        second: owner.clone(),
                    });
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    entry.insert(owner.clone());
                    self.upstreams.push(upstream);
                }
            }
        }
        self.warn_all(owner, warnings);
        Ok(())
    }

    fn warn_all(&mut self, owner: &ResourceId, warnings: Vec<Warning>) {
        for warning in warnings {
            tracing::debug!(ingress = %owner, %warning);
            self.warnings.push((owner.clone(), warning));
        }
    }
}
