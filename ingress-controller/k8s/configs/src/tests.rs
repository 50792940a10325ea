use super::*;
use ingress_controller_core::{IngressRef, Location, Server, Upstream, UpstreamServer};
use ingress_controller_k8s_api::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ObjectMeta, ServiceBackendPort,
};
use maplit::btreemap;
use tracing::Level;


const CAFE_HOST: &str = "cafe.example.com";
const CAFE_PEM: &str = "/etc/nginx/secrets/default-cafe-secret";

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .try_init()
        .ok();
}

fn mk_backend(service: &str, port: i32) -> IngressBackend {
    IngressBackend {
        service: Some(IngressServiceBackend {
            name: service.to_string(),
            port: Some(ServiceBackendPort {
                number: Some(port),
                ..Default::default()
            }),
        }),
        ..Default::default()
    }
}

fn mk_path(path: &str, path_type: &str, service: &str, port: i32) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(path.to_string()),
        path_type: path_type.to_string(),
        backend: mk_backend(service, port),
    }
}

fn mk_rule(host: &str, paths: Vec<HTTPIngressPath>) -> IngressRule {
    IngressRule {
        host: Some(host.to_string()),
        http: Some(HTTPIngressRuleValue { paths }),
    }
}

fn mk_tls(hosts: &[&str], secret: &str) -> IngressTLS {
    IngressTLS {
        hosts: Some(hosts.iter().map(|h| h.to_string()).collect()),
        secret_name: Some(secret.to_string()),
    }
}

fn mk_ingress(
    ns: impl ToString,
    name: impl ToString,
    annotations: BTreeMap<String, String>,
    rules: Vec<IngressRule>,
    tls: Vec<IngressTLS>,
) -> ResolvedIngress {
    ResolvedIngress {
        ingress: Ingress {
            metadata: ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(rules),
                tls: Some(tls).filter(|tls| !tls.is_empty()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The cafe example: coffee and tea on a single TLS host.
fn mk_cafe(annotations: BTreeMap<String, String>) -> ResolvedIngress {
    let mut cafe = mk_ingress(
        "default",
        "cafe-ingress",
        annotations,
        vec![mk_rule(
            CAFE_HOST,
            vec![
                mk_path("/coffee", "Prefix", "coffee-svc", 80),
                mk_path("/tea", "Prefix", "tea-svc", 80),
            ],
        )],
        vec![mk_tls(&[CAFE_HOST], "cafe-secret")],
    );
    cafe.endpoints = btreemap! {
        "coffee-svc80".to_string() => vec!["10.0.0.1:80".to_string()],
        "tea-svc80".to_string() => vec!["10.0.0.2:80".to_string()],
    };
    cafe
}

fn mk_cafe_files() -> IngressFiles {
    IngressFiles {
        pems: btreemap! {
            CAFE_HOST.to_string() => PemFile::Resolved(CAFE_PEM.to_string()),
        },
        ..Default::default()
    }
}

fn mk_upstream(name: &str, address: &str) -> Upstream {
    Upstream {
        name: name.to_string(),
        lb_method: "random two least_conn".to_string(),
        zone_size: "256k".to_string(),
        servers: vec![UpstreamServer {
            address: address.to_string(),
            port: 80,
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
            resolve: false,
        }],
    }
}

fn mk_location(path: &str, upstream: &str, service: &str, ns: &str) -> Location {
    Location {
        path: path.to_string(),
        upstream: upstream.to_string(),
        service_name: service.to_string(),
        proxy_connect_timeout: "60s".to_string(),
        proxy_read_timeout: "60s".to_string(),
        proxy_send_timeout: "60s".to_string(),
        client_max_body_size: "1m".to_string(),
        proxy_buffering: true,
        proxy_ssl_name: format!("{service}.{ns}.svc"),
        ..Default::default()
    }
}

fn mk_tls_server(host: &str, locations: Vec<Location>) -> Server {
    Server {
        name: host.to_string(),
        server_tokens: "on".to_string(),
        locations,
        ssl: true,
        ssl_certificate: Some(CAFE_PEM.to_string()),
        ssl_certificate_key: Some(CAFE_PEM.to_string()),
        ssl_redirect: true,
        status_zone: host.to_string(),
        hsts_max_age: ConfigParams::DEFAULT_HSTS_MAX_AGE,
        ports: vec![80],
        ssl_ports: vec![443],
        ..Default::default()
    }
}

fn mk_ingress_ref(ingress: &ResolvedIngress) -> IngressRef {
    let id = ingress.id().unwrap();
    IngressRef {
        namespace: id.namespace,
        name: id.name,
        annotations: ingress.annotations().clone(),
    }
}

fn mk_annotations<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn plus() -> Settings {
    Settings {
        is_plus: true,
        ..Default::default()
    }
}
