use crate::{merge::Owner, params::ExternalNamePolicy, Warning};
use ingress_controller_core::{Upstream, UpstreamServer};
use ingress_controller_k8s_api::{ResourceId, ServiceRef};

/// Names the pool for a service port reached through `host` on the owning Ingress.
///
/// The default backend is pooled with an empty host.
pub(crate) fn upstream_name(owner: &ResourceId, host: &str, svc: &ServiceRef) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        owner.namespace, owner.name, host, svc.name, svc.port
    )
}

/// Builds the pool for a service port from the owner's resolved endpoints.
///
/// A service without usable endpoints gets the local placeholder server so that requests are
/// answered with a 502 rather than failing the whole configuration.
pub(crate) fn build(
    name: String,
    owner: &Owner<'_>,
    svc: &ServiceRef,
    external_names: ExternalNamePolicy,
    warnings: &mut Vec<Warning>,
) -> Upstream {
    let resolve = external_names == ExternalNamePolicy::Resolve
        && owner.ingress.external_name_services.contains(&svc.name);

    let mut servers = Vec::new();
    let endpoints = owner.ingress.endpoints.get(&svc.endpoints_key());
    for endpoint in endpoints.into_iter().flatten() {
        let Some((address, port)) = parse_endpoint(endpoint) else {
            tracing::debug!(ingress = %owner.id, service = %svc, %endpoint, "Skipping invalid endpoint");
            warnings.push(Warning::InvalidEndpoint {
                service: svc.to_string(),
                endpoint: endpoint.clone(),
            });
            continue;
        };
        servers.push(UpstreamServer {
            address: address.to_string(),
            port,
            max_fails: owner.params.max_fails,
            max_conns: owner.params.max_conns,
            fail_timeout: owner.params.fail_timeout.clone(),
            resolve,
        });
    }

    if servers.is_empty() {
        servers.push(UpstreamServer {
            address: Upstream::PLACEHOLDER_ADDRESS.to_string(),
            port: Upstream::PLACEHOLDER_PORT,
            max_fails: owner.params.max_fails,
            max_conns: owner.params.max_conns,
            fail_timeout: owner.params.fail_timeout.clone(),
            resolve: false,
        });
    }

    Upstream {
        name,
        lb_method: owner.params.lb_method.clone(),
        zone_size: owner.params.upstream_zone_size.clone(),
        servers,
    }
}

/// Splits an `address:port` endpoint at its last colon.
fn parse_endpoint(endpoint: &str) -> Option<(&str, u16)> {
    let (address, port) = endpoint.rsplit_once(':')?;
    if address.is_empty() {
        return None;
    }
    let port = port.parse().ok()?;
    Some((address, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ConfigParams;
    use ingress_controller_k8s_api::ResolvedIngress;
    use maplit::{btreemap, btreeset};
    use pretty_assertions::assert_eq;

    fn coffee() -> ServiceRef {
        ServiceRef {
            name: "coffee-svc".to_string(),
            port: "80".to_string(),
        }
    }

    fn owner(ingress: &ResolvedIngress) -> Owner<'_> {
        Owner {
            id: ResourceId::new("default".to_string(), "cafe-ingress".to_string()),
            ingress,
            params: ConfigParams::default(),
            jwt_key_file: "",
            minion: None,
        }
    }

    #[test]
    fn names() {
        let id = ResourceId::new("default".to_string(), "cafe-ingress".to_string());
        assert_eq!(
            upstream_name(&id, "cafe.example.com", &coffee()),
            "default-cafe-ingress-cafe.example.com-coffee-svc-80"
        );
        assert_eq!(
            upstream_name(&id, "", &coffee()),
            "default-cafe-ingress--coffee-svc-80"
        );
    }

    #[test]
    fn servers_from_endpoints() {
        let ingress = ResolvedIngress {
            endpoints: btreemap! {
                "coffee-svc80".to_string() => vec![
                    "10.0.0.1:80".to_string(),
                    "10.0.0.2".to_string(),
                    "[fd00::1]:8080".to_string(),
                ],
            },
            ..Default::default()
        };
        let mut warnings = vec![];
        let upstream = build(
            "coffee".to_string(),
            &owner(&ingress),
            &coffee(),
            ExternalNamePolicy::Static,
            &mut warnings,
        );

        assert_eq!(
            upstream,
            Upstream {
                name: "coffee".to_string(),
                lb_method: "random two least_conn".to_string(),
                zone_size: "256k".to_string(),
                servers: vec![
                    UpstreamServer {
                        address: "10.0.0.1".to_string(),
                        port: 80,
                        max_fails: 1,
                        max_conns: 0,
                        fail_timeout: "10s".to_string(),
                        resolve: false,
                    },
                    UpstreamServer {
                        address: "[fd00::1]".to_string(),
                        port: 8080,
                        max_fails: 1,
                        max_conns: 0,
                        fail_timeout: "10s".to_string(),
                        resolve: false,
                    },
                ],
            }
        );
        assert_eq!(
            warnings,
            vec![Warning::InvalidEndpoint {
                service: "coffee-svc:80".to_string(),
                endpoint: "10.0.0.2".to_string(),
            }]
        );
    }

    #[test]
    fn placeholder_without_endpoints() {
        let ingress = ResolvedIngress::default();
        let mut warnings = vec![];
        let upstream = build(
            "coffee".to_string(),
            &owner(&ingress),
            &coffee(),
            ExternalNamePolicy::Static,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        assert_eq!(upstream.servers.len(), 1);
        assert_eq!(upstream.servers[0].address, "127.0.0.1");
        assert_eq!(upstream.servers[0].port, 8181);
    }

    #[test]
    fn external_names_resolve_by_policy() {
        let ingress = ResolvedIngress {
            endpoints: btreemap! {
                "coffee-svc80".to_string() => vec!["coffee.example.net:80".to_string()],
            },
            external_name_services: btreeset! { "coffee-svc".to_string() },
            ..Default::default()
        };

        for (policy, resolve) in [
            (ExternalNamePolicy::Static, false),
            (ExternalNamePolicy::Resolve, true),
        ] {
            let upstream = build(
                "coffee".to_string(),
                &owner(&ingress),
                &coffee(),
                policy,
                &mut vec![],
            );
            assert_eq!(upstream.servers[0].address, "coffee.example.net");
            assert_eq!(upstream.servers[0].resolve, resolve, "{policy:?}");
        }
    }
}
