//! Ingress annotations recognized by the compiler.
//!
//! Annotations are read by [`ConfigParams::with_annotations`], which layers them over a set of
//! defaults. Unknown annotations are ignored. A value that cannot be parsed leaves the parameter
//! unchanged and is reported as a [`Warning::InvalidAnnotation`].

use crate::{
    params::{ConfigParams, StaticConfigParams},
    Warning,
};
use anyhow::{bail, ensure, Context, Result};
use std::{collections::BTreeMap, num::NonZeroU16};

pub const SERVER_TOKENS: &str = "nginx.org/server-tokens";
pub const LB_METHOD: &str = "nginx.org/lb-method";
pub const PROXY_CONNECT_TIMEOUT: &str = "nginx.org/proxy-connect-timeout";
pub const PROXY_READ_TIMEOUT: &str = "nginx.org/proxy-read-timeout";
pub const PROXY_SEND_TIMEOUT: &str = "nginx.org/proxy-send-timeout";
pub const PROXY_HIDE_HEADERS: &str = "nginx.org/proxy-hide-headers";
pub const PROXY_PASS_HEADERS: &str = "nginx.org/proxy-pass-headers";
pub const CLIENT_MAX_BODY_SIZE: &str = "nginx.org/client-max-body-size";
pub const REDIRECT_TO_HTTPS: &str = "nginx.org/redirect-to-https";
pub const SSL_REDIRECT: &str = "ingress.kubernetes.io/ssl-redirect";
pub const PROXY_BUFFERING: &str = "nginx.org/proxy-buffering";
pub const PROXY_BUFFERS: &str = "nginx.org/proxy-buffers";
pub const PROXY_BUFFER_SIZE: &str = "nginx.org/proxy-buffer-size";
pub const PROXY_MAX_TEMP_FILE_SIZE: &str = "nginx.org/proxy-max-temp-file-size";
pub const UPSTREAM_ZONE_SIZE: &str = "nginx.org/upstream-zone-size";
pub const HSTS: &str = "nginx.org/hsts";
pub const HSTS_MAX_AGE: &str = "nginx.org/hsts-max-age";
pub const HSTS_INCLUDE_SUBDOMAINS: &str = "nginx.org/hsts-include-subdomains";
pub const HSTS_BEHIND_PROXY: &str = "nginx.org/hsts-behind-proxy";
pub const LISTEN_PORTS: &str = "nginx.org/listen-ports";
pub const LISTEN_PORTS_SSL: &str = "nginx.org/listen-ports-ssl";
pub const KEEPALIVE: &str = "nginx.org/keepalive";
pub const MAX_FAILS: &str = "nginx.org/max-fails";
pub const MAX_CONNS: &str = "nginx.org/max-conns";
pub const FAIL_TIMEOUT: &str = "nginx.org/fail-timeout";
pub const SERVER_SNIPPETS: &str = "nginx.org/server-snippets";
pub const LOCATION_SNIPPETS: &str = "nginx.org/location-snippets";
pub const SSL_SERVICES: &str = "nginx.org/ssl-services";
pub const REWRITES: &str = "nginx.org/rewrites";
pub const GRPC_SERVICES: &str = "nginx.org/grpc-services";
pub const WEBSOCKET_SERVICES: &str = "nginx.org/websocket-services";
pub const STICKY_COOKIE_SERVICES: &str = "nginx.com/sticky-cookie-services";

pub const JWT_KEY: &str = "nginx.com/jwt-key";
pub const JWT_REALM: &str = "nginx.com/jwt-realm";
pub const JWT_TOKEN: &str = "nginx.com/jwt-token";
pub const JWT_LOGIN_URL: &str = "nginx.com/jwt-login-url";

pub const HEALTH_CHECKS: &str = "nginx.com/health-checks";
pub const HEALTH_CHECKS_MANDATORY: &str = "nginx.com/health-checks-mandatory";
pub const HEALTH_CHECKS_MANDATORY_QUEUE: &str = "nginx.com/health-checks-mandatory-queue";

pub const INTERNAL_ROUTE: &str = "nsm.nginx.com/internal-route";

pub const APP_PROTECT_ENABLE: &str = "appprotect.f5.com/app-protect-enable";
pub const APP_PROTECT_LOG_ENABLE: &str = "appprotect.f5.com/app-protect-security-log-enable";
pub const APP_PROTECT_LOG_DESTINATION: &str =
    "appprotect.f5.com/app-protect-security-log-destination";

/// Location-level annotations. A master has no locations of its own in a merged group.
pub const MASTER_DENIED: [&str; 8] = [
    REWRITES,
    SSL_SERVICES,
    GRPC_SERVICES,
    WEBSOCKET_SERVICES,
    STICKY_COOKIE_SERVICES,
    HEALTH_CHECKS,
    HEALTH_CHECKS_MANDATORY,
    HEALTH_CHECKS_MANDATORY_QUEUE,
];

/// Server-level annotations, which only a master may set.
pub const MINION_DENIED: [&str; 16] = [
    PROXY_HIDE_HEADERS,
    PROXY_PASS_HEADERS,
    REDIRECT_TO_HTTPS,
    SSL_REDIRECT,
    HSTS,
    HSTS_MAX_AGE,
    HSTS_INCLUDE_SUBDOMAINS,
    HSTS_BEHIND_PROXY,
    SERVER_TOKENS,
    LISTEN_PORTS,
    LISTEN_PORTS_SSL,
    SERVER_SNIPPETS,
    INTERNAL_ROUTE,
    APP_PROTECT_ENABLE,
    APP_PROTECT_LOG_ENABLE,
    APP_PROTECT_LOG_DESTINATION,
];

/// Annotations a minion takes from its master unless it sets them itself.
pub const MINION_INHERITED: [&str; 15] = [
    PROXY_CONNECT_TIMEOUT,
    PROXY_READ_TIMEOUT,
    PROXY_SEND_TIMEOUT,
    CLIENT_MAX_BODY_SIZE,
    PROXY_BUFFERING,
    PROXY_BUFFERS,
    PROXY_BUFFER_SIZE,
    PROXY_MAX_TEMP_FILE_SIZE,
    UPSTREAM_ZONE_SIZE,
    LOCATION_SNIPPETS,
    LB_METHOD,
    KEEPALIVE,
    MAX_FAILS,
    MAX_CONNS,
    FAIL_TIMEOUT,
];

/// Load balancing methods that are only available with NGINX Plus.
const PLUS_LB_METHODS: [&str; 6] = [
    "least_time header",
    "least_time last_byte",
    "least_time header inflight",
    "least_time last_byte inflight",
    "random two least_time=header",
    "random two least_time=last_byte",
];

/// Reads annotation values, recording a warning for each value that fails to parse.
struct Reader<'a> {
    annotations: &'a BTreeMap<String, String>,
    warnings: Vec<Warning>,
}

// === impl ConfigParams ===

impl ConfigParams {
    /// Returns a copy of these parameters with the given annotations applied.
    ///
    /// JWT and health-check annotations are only honored for NGINX Plus. The internal-route and
    /// App Protect annotations are only honored when the corresponding static feature is enabled.
    pub fn with_annotations(
        &self,
        annotations: &BTreeMap<String, String>,
        is_plus: bool,
        statics: &StaticConfigParams,
    ) -> (Self, Vec<Warning>) {
        let mut params = self.clone();
        let mut ann = Reader {
            annotations,
            warnings: vec![],
        };

        if let Some(tokens) = ann.read(SERVER_TOKENS, |v| parse_server_tokens(v, is_plus)) {
            params.server_tokens = tokens;
        }
        if let Some(method) = ann.read(LB_METHOD, |v| parse_lb_method(v, is_plus)) {
            params.lb_method = method;
        }

        if let Some(t) = ann.read(PROXY_CONNECT_TIMEOUT, parse_time) {
            params.proxy_connect_timeout = t;
        }
        if let Some(t) = ann.read(PROXY_READ_TIMEOUT, parse_time) {
            params.proxy_read_timeout = t;
        }
        if let Some(t) = ann.read(PROXY_SEND_TIMEOUT, parse_time) {
            params.proxy_send_timeout = t;
        }
        if let Some(headers) = ann.read(PROXY_HIDE_HEADERS, parse_csv) {
            params.proxy_hide_headers = headers;
        }
        if let Some(headers) = ann.read(PROXY_PASS_HEADERS, parse_csv) {
            params.proxy_pass_headers = headers;
        }
        if let Some(size) = ann.read(CLIENT_MAX_BODY_SIZE, parse_size) {
            params.client_max_body_size = size;
        }
        if let Some(redirect) = ann.read(REDIRECT_TO_HTTPS, parse_bool) {
            params.redirect_to_https = redirect;
        }
        if let Some(redirect) = ann.read(SSL_REDIRECT, parse_bool) {
            params.ssl_redirect = redirect;
        }
        if let Some(buffering) = ann.read(PROXY_BUFFERING, parse_bool) {
            params.proxy_buffering = buffering;
        }
        if let Some(buffers) = ann.read(PROXY_BUFFERS, parse_buffers) {
            params.proxy_buffers = Some(buffers);
        }
        if let Some(size) = ann.read(PROXY_BUFFER_SIZE, parse_size) {
            params.proxy_buffer_size = Some(size);
        }
        if let Some(size) = ann.read(PROXY_MAX_TEMP_FILE_SIZE, parse_size) {
            params.proxy_max_temp_file_size = Some(size);
        }
        if let Some(size) = ann.read(UPSTREAM_ZONE_SIZE, parse_size) {
            params.upstream_zone_size = size;
        }

        if let Some(hsts) = ann.read(HSTS, parse_bool) {
            params.hsts = hsts;
        }
        if let Some(max_age) = ann.read(HSTS_MAX_AGE, |v| {
            v.parse::<i64>().context("expected an integer")
        }) {
            params.hsts_max_age = max_age;
        }
        if let Some(include) = ann.read(HSTS_INCLUDE_SUBDOMAINS, parse_bool) {
            params.hsts_include_subdomains = include;
        }
        if let Some(behind_proxy) = ann.read(HSTS_BEHIND_PROXY, parse_bool) {
            params.hsts_behind_proxy = behind_proxy;
        }

        if let Some(ports) = ann.read(LISTEN_PORTS, parse_ports) {
            params.ports = ports;
        }
        if let Some(ports) = ann.read(LISTEN_PORTS_SSL, parse_ports) {
            params.ssl_ports = ports;
        }

        if let Some(keepalive) = ann.read(KEEPALIVE, parse_u32) {
            params.keepalive = keepalive;
        }
        if let Some(max_fails) = ann.read(MAX_FAILS, parse_u32) {
            params.max_fails = max_fails;
        }
        if let Some(max_conns) = ann.read(MAX_CONNS, parse_u32) {
            params.max_conns = max_conns;
        }
        if let Some(timeout) = ann.read(FAIL_TIMEOUT, parse_time) {
            params.fail_timeout = timeout;
        }

        if let Some(snippets) = ann.read(SERVER_SNIPPETS, parse_lines) {
            params.server_snippets = snippets;
        }
        if let Some(snippets) = ann.read(LOCATION_SNIPPETS, parse_lines) {
            params.location_snippets = snippets;
        }
        if let Some(services) = ann.read(SSL_SERVICES, parse_csv) {
            params.ssl_services = services.into_iter().collect();
        }

        if is_plus {
            if let Some(key) = ann.read(JWT_KEY, parse_non_empty) {
                params.jwt_key = Some(key);
            }
            if let Some(realm) = ann.read(JWT_REALM, parse_any) {
                params.jwt_realm = realm;
            }
            if let Some(token) = ann.read(JWT_TOKEN, parse_any) {
                params.jwt_token = token;
            }
            if let Some(url) = ann.read(JWT_LOGIN_URL, parse_non_empty) {
                params.jwt_login_url = Some(url);
            }

            if let Some(enabled) = ann.read(HEALTH_CHECKS, parse_bool) {
                params.health_check_enabled = enabled;
            }
            if let Some(mandatory) = ann.read(HEALTH_CHECKS_MANDATORY, parse_bool) {
                params.health_check_mandatory = mandatory;
            }
            if let Some(queue) = ann.read(HEALTH_CHECKS_MANDATORY_QUEUE, |v| {
                v.parse::<i64>().context("expected an integer")
            }) {
                params.health_check_mandatory_queue = queue;
            }
        }

        if statics.enable_internal_routes {
            if let Some(internal) = ann.read(INTERNAL_ROUTE, parse_bool) {
                params.spiffe_server_certs = internal;
            }
        }

        if statics.app_protect {
            if let Some(enable) = ann.read(APP_PROTECT_ENABLE, parse_bool) {
                params.app_protect_enable = enable;
            }
            if let Some(enable) = ann.read(APP_PROTECT_LOG_ENABLE, parse_bool) {
                params.app_protect_log_enable = enable;
            }
            if let Some(dest) = ann.read(APP_PROTECT_LOG_DESTINATION, parse_non_empty) {
                params.app_protect_log_destination = Some(dest);
            }
        }

        (params, ann.warnings)
    }
}

// === impl Reader ===

impl Reader<'_> {
    fn read<T>(&mut self, annotation: &str, parse: impl FnOnce(&str) -> Result<T>) -> Option<T> {
        let value = self.annotations.get(annotation)?;
        match parse(value) {
            Ok(v) => Some(v),
            Err(error) => {
                self.warnings.push(Warning::InvalidAnnotation {
                    annotation: annotation.to_string(),
                    value: value.clone(),
                    reason: format!("{error:#}"),
                });
                None
            }
        }
    }
}

/// Removes annotations that a master may not set, returning the removed keys.
pub(crate) fn filter_master(annotations: &mut BTreeMap<String, String>) -> Vec<String> {
    remove_all(annotations, &MASTER_DENIED)
}

/// Removes annotations that a minion may not set, returning the removed keys.
pub(crate) fn filter_minion(annotations: &mut BTreeMap<String, String>) -> Vec<String> {
    remove_all(annotations, &MINION_DENIED)
}

pub(crate) fn inherit_from_master(
    minion: &mut BTreeMap<String, String>,
    master: &BTreeMap<String, String>,
) {
    for key in MINION_INHERITED {
        if let Some(value) = master.get(key) {
            minion
                .entry(key.to_string())
                .or_insert_with(|| value.clone());
        }
    }
}

fn remove_all(annotations: &mut BTreeMap<String, String>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter(|key| annotations.remove(**key).is_some())
        .map(|key| key.to_string())
        .collect()
}

fn parse_any(s: &str) -> Result<String> {
    Ok(s.to_string())
}

fn parse_non_empty(s: &str) -> Result<String> {
    ensure!(!s.trim().is_empty(), "value must not be empty");
    Ok(s.trim().to_string())
}

/// Accepts `1`, `t`, `T`, `true`, `TRUE` and `True` (and the matching false spellings).
pub(crate) fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        s => bail!("invalid boolean: {s:?}"),
    }
}

/// Booleans map to `on`/`off`. NGINX Plus also accepts a custom token string.
fn parse_server_tokens(s: &str, is_plus: bool) -> Result<String> {
    match parse_bool(s) {
        Ok(on) => Ok(if on { "on" } else { "off" }.to_string()),
        Err(_) if is_plus && !s.trim().is_empty() => Ok(s.to_string()),
        Err(error) => Err(error),
    }
}

fn parse_u32(s: &str) -> Result<u32> {
    s.parse().context("expected a non-negative integer")
}

/// Splits a comma-separated list, dropping empty items.
fn parse_csv(s: &str) -> Result<Vec<String>> {
    Ok(s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_lines(s: &str) -> Result<Vec<String>> {
    Ok(s.lines().map(str::to_string).collect())
}

/// Validates an NGINX time value such as `60s`, `1m30s`, or `500ms`. A number without a unit is
/// in seconds.
pub(crate) fn parse_time(s: &str) -> Result<String> {
    const UNITS: [&str; 8] = ["ms", "s", "m", "h", "d", "w", "M", "y"];

    ensure!(!s.is_empty(), "empty time");
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            bail!("invalid time {s:?}: expected a number");
        }
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let (unit, tail) = rest.split_at(unit_len);
        if !unit.is_empty() && !UNITS.contains(&unit) {
            bail!("invalid unit {unit:?}: expected one of 'ms', 's', 'm', 'h', 'd', 'w', 'M', or 'y'");
        }
        rest = tail;
    }
    Ok(s.to_string())
}

/// Validates an NGINX size value such as `1m`, `512k`, or `4096`.
pub(crate) fn parse_size(s: &str) -> Result<String> {
    let number = s
        .strip_suffix(|c: char| matches!(c, 'k' | 'K' | 'm' | 'M' | 'g' | 'G'))
        .unwrap_or(s);
    ensure!(
        !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()),
        "invalid size {s:?}: expected a number with an optional 'k', 'm', or 'g' suffix"
    );
    Ok(s.to_string())
}

/// Validates a `proxy_buffers` value, a buffer count followed by a buffer size.
fn parse_buffers(s: &str) -> Result<String> {
    let mut parts = s.split_whitespace();
    let (Some(number), Some(size), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("invalid buffers {s:?}: expected a count and a size");
    };
    number.parse::<NonZeroU16>().context("parsing buffer count")?;
    parse_size(size)?;
    Ok(format!("{number} {size}"))
}

/// Validates a load balancing method. The empty method selects NGINX's default round-robin
/// balancing.
pub(crate) fn parse_lb_method(method: &str, is_plus: bool) -> Result<String> {
    let method = method.trim();
    if method == "round_robin" {
        return Ok(String::new());
    }

    if let Some(key) = method.strip_prefix("hash ") {
        let key = key.strip_suffix(" consistent").unwrap_or(key).trim();
        ensure!(
            !key.is_empty() && !key.contains(char::is_whitespace),
            "invalid hash key in {method:?}"
        );
        return Ok(method.to_string());
    }

    match method {
        "least_conn" | "ip_hash" | "random" | "random two" | "random two least_conn" => {
            Ok(method.to_string())
        }
        m if PLUS_LB_METHODS.contains(&m) => {
            ensure!(is_plus, "load balancing method {m:?} requires NGINX Plus");
            Ok(m.to_string())
        }
        m => bail!("invalid load balancing method: {m:?}"),
    }
}

/// Reads a comma-separated list of ports or port ranges, preserving order.
pub(crate) fn parse_ports(s: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();
    let mut push = |port: u16| {
        if !ports.contains(&port) {
            ports.push(port);
        }
    };

    for spec in s.split(',') {
        match spec.split_once('-') {
            None => {
                if !spec.trim().is_empty() {
                    let port = spec.trim().parse::<NonZeroU16>().context("parsing port")?;
                    push(port.get());
                }
            }
            Some((floor, ceil)) => {
                let floor = floor.trim().parse::<NonZeroU16>().context("parsing port")?;
                let ceil = ceil.trim().parse::<NonZeroU16>().context("parsing port")?;
                if floor > ceil {
                    bail!("Port range must be increasing");
                }
                (floor.get()..=ceil.get()).for_each(&mut push);
            }
        }
    }

    ensure!(!ports.is_empty(), "at least one port is required");
    Ok(ports)
}
