use crate::params::ConfigParams;
use ingress_controller_core::HealthCheck;
use ingress_controller_k8s_api::Probe;
use std::collections::BTreeMap;

const DEFAULT_URI: &str = "/";
const DEFAULT_SCHEME: &str = "http";
const DEFAULT_INTERVAL: i32 = 10;
const DEFAULT_FAILS: i32 = 3;
const DEFAULT_PASSES: i32 = 1;
const DEFAULT_TIMEOUT_SECONDS: i32 = 1;

/// Derives an active health check for a pool from its pods' readiness probe.
///
/// Only HTTP probes can be expressed as NGINX health checks.
pub(crate) fn build(upstream_name: &str, probe: &Probe, params: &ConfigParams) -> Option<HealthCheck> {
    let http = probe.http_get.as_ref()?;

    let mut headers = http
        .http_headers
        .iter()
        .flatten()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect::<BTreeMap<_, _>>();
    if let Some(host) = http.host.as_ref().filter(|h| !h.is_empty()) {
        headers
            .entry("Host".to_string())
            .or_insert_with(|| host.clone());
    }

    Some(HealthCheck {
        upstream_name: upstream_name.to_string(),
        uri: http
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_URI.to_string()),
        scheme: http
            .scheme
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
        interval: probe.period_seconds.unwrap_or(DEFAULT_INTERVAL),
        fails: probe.failure_threshold.unwrap_or(DEFAULT_FAILS),
        passes: probe.success_threshold.unwrap_or(DEFAULT_PASSES),
        timeout_seconds: probe.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS).into(),
        mandatory: params.health_check_mandatory,
        mandatory_queue: params.health_check_mandatory_queue,
        headers,
    })
}
