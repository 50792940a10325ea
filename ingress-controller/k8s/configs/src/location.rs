use crate::{merge::Owner, tls};
use ingress_controller_core::Location;
use ingress_controller_k8s_api::{PathType, ServiceRef};

/// Returns the NGINX location path for an Ingress path.
///
/// An empty path matches everything. `Exact` paths use NGINX's exact-match modifier; every other
/// path type is a prefix match.
pub fn generate_ingress_path(path: &str, path_type: Option<PathType>) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    match path_type {
        Some(PathType::Exact) => format!("= {path}"),
        Some(PathType::Prefix | PathType::ImplementationSpecific) | None => path.to_string(),
    }
}

/// The name presented via SNI when proxying to a service over TLS.
pub(crate) fn proxy_ssl_name(service: &str, namespace: &str) -> String {
    format!("{service}.{namespace}.svc")
}

pub(crate) fn build(
    path: String,
    upstream: &str,
    svc: &ServiceRef,
    owner: &Owner<'_>,
    spiffe_server_certs: bool,
    spiffe_certs: bool,
) -> Location {
    let params = &owner.params;
    let ssl_service = params.ssl_services.contains(&svc.name);
    Location {
        path,
        upstream: upstream.to_string(),
        service_name: svc.name.clone(),
        proxy_connect_timeout: params.proxy_connect_timeout.clone(),
        proxy_read_timeout: params.proxy_read_timeout.clone(),
        proxy_send_timeout: params.proxy_send_timeout.clone(),
        client_max_body_size: params.client_max_body_size.clone(),
        proxy_buffering: params.proxy_buffering,
        proxy_buffers: params.proxy_buffers.clone(),
        proxy_buffer_size: params.proxy_buffer_size.clone(),
        proxy_max_temp_file_size: params.proxy_max_temp_file_size.clone(),
        location_snippets: params.location_snippets.clone(),
        ssl: tls::ssl_enabled(ssl_service, spiffe_server_certs, spiffe_certs),
        proxy_ssl_name: proxy_ssl_name(&svc.name, &owner.id.namespace),
        jwt_auth: None,
        minion_ingress: owner.minion.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/coffee", Some(PathType::Exact), "= /coffee")]
    #[case("/coffee", Some(PathType::Prefix), "/coffee")]
    #[case("/coffee", Some(PathType::ImplementationSpecific), "/coffee")]
    #[case("/coffee", None, "/coffee")]
    #[case("", Some(PathType::Exact), "/")]
    #[case("", None, "/")]
    fn ingress_paths(
        #[case] path: &str,
        #[case] path_type: Option<PathType>,
        #[case] expected: &str,
    ) {
        assert_eq!(generate_ingress_path(path, path_type), expected);
    }

    #[test]
    fn ssl_names() {
        assert_eq!(proxy_ssl_name("coffee-svc", "default"), "coffee-svc.default.svc");
    }
}
