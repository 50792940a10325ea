use crate::{jwt, merge::Owner, params::StaticConfigParams, IngressFiles};
use ingress_controller_core::{AppProtect, Server};

/// App Protect resource keys in [`IngressFiles::app_protect`].
pub const APP_PROTECT_POLICY: &str = "policy";
pub const APP_PROTECT_LOG_CONF: &str = "logconf";

/// Builds the server block for one of the owner's hosts, without locations.
///
/// Host-level settings come exclusively from the owner, which is always the master of a merged
/// group.
pub(crate) fn build(
    host: &str,
    owner: &Owner<'_>,
    files: &IngressFiles,
    statics: &StaticConfigParams,
) -> Server {
    let params = &owner.params;
    let mut server = Server {
        name: host.to_string(),
        server_tokens: params.server_tokens.clone(),
        status_zone: host.to_string(),
        ssl_redirect: params.ssl_redirect,
        redirect_to_https: params.redirect_to_https,
        hsts: params.hsts,
        hsts_max_age: params.hsts_max_age,
        hsts_include_subdomains: params.hsts_include_subdomains,
        hsts_behind_proxy: params.hsts_behind_proxy,
        ports: params.ports.clone(),
        ssl_ports: params.ssl_ports.clone(),
        proxy_hide_headers: params.proxy_hide_headers.clone(),
        proxy_pass_headers: params.proxy_pass_headers.clone(),
        server_snippets: params.server_snippets.clone(),
        spiffe_certs: params.spiffe_server_certs,
        ..Default::default()
    };

    if let Some(pem) = files.pems.get(host) {
        pem.apply(&mut server);
    }

    if let Some((auth, redirect)) = jwt::build(&owner.id, params, owner.jwt_key_file) {
        server.jwt_auth = Some(auth);
        if let Some(redirect) = redirect {
            server.add_jwt_redirect_location(redirect);
        }
    }

    if statics.app_protect {
        server.app_protect = Some(AppProtect {
            enable: params.app_protect_enable,
            policy: files.app_protect.get(APP_PROTECT_POLICY).cloned(),
            log_enable: params.app_protect_log_enable,
            log_conf: files.app_protect.get(APP_PROTECT_LOG_CONF).cloned(),
            log_destination: params.app_protect_log_destination.clone(),
        });
    }

    server
}
