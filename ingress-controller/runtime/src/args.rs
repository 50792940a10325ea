use crate::{
    configs::{
        self, annotations, CompileMetrics, ConfigParams, ExternalNamePolicy, Settings,
        StaticConfigParams,
    },
    core::ProxyConfig,
    manifest::{FileLayout, Manifest},
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use prometheus_client::{encoding::text::encode, registry::Registry};
use std::{collections::BTreeMap, io::Write, path::PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[clap(
    name = "ingress-controller",
    about = "Compiles Ingress resources into NGINX configurations"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "ingress_controller=info,warn",
        env = "INGRESS_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// A YAML manifest of resolved Ingresses.
    #[clap(long)]
    manifest: PathBuf,

    /// Writes the compiled configurations to this file rather than to stdout.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Writes compilation metrics to this file in the Prometheus text format.
    #[clap(long)]
    metrics: Option<PathBuf>,

    /// Enables features that require NGINX Plus.
    #[clap(long)]
    nginx_plus: bool,

    /// Indicates that NGINX holds mesh identity certificates.
    #[clap(long)]
    spiffe_certs: bool,

    #[clap(long)]
    enable_internal_routes: bool,

    /// Indicates that the App Protect module is loaded.
    #[clap(long)]
    app_protect: bool,

    /// Re-resolves ExternalName services through NGINX's resolver.
    #[clap(long)]
    resolve_external_names: bool,

    #[clap(long, default_value = "/etc/nginx/secrets")]
    secrets_dir: PathBuf,

    /// The certificate file for TLS bindings that do not name a secret.
    #[clap(long)]
    wildcard_tls_secret: Option<PathBuf>,

    #[clap(long)]
    lb_method: Option<String>,

    #[clap(long)]
    upstream_zone_size: Option<String>,

    #[clap(long)]
    proxy_connect_timeout: Option<String>,

    #[clap(long)]
    proxy_read_timeout: Option<String>,

    #[clap(long)]
    proxy_send_timeout: Option<String>,

    #[clap(long)]
    client_max_body_size: Option<String>,

    #[clap(long)]
    server_tokens: Option<String>,
}

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let settings = self.settings()?;
        let layout = FileLayout {
            secrets_dir: self.secrets_dir.clone(),
            wildcard: self.wildcard_tls_secret.clone(),
        };
        self.log_format.try_init(self.log_level)?;

        let mut prom = Registry::with_prefix("ingress_controller");
        let metrics = CompileMetrics::register(&mut prom);

        let manifest = Manifest::read(&self.manifest)?;
        let inputs = manifest.into_inputs(&layout);
        info!(inputs = inputs.len(), "Compiling");

        let mut configs = Vec::<ProxyConfig>::new();
        for (id, result) in configs::compile_all(inputs, &settings) {
            metrics.record(&id, &result);
            match result {
                Ok(compiled) => {
                    for (ingress, warning) in &compiled.warnings {
                        warn!(%ingress, %warning);
                    }
                    configs.push(compiled.config);
                }
                Err(error) => error!(ingress = %id, %error, "Skipping Ingress"),
            }
        }

        match self.output.as_ref() {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(file, &configs)?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                serde_json::to_writer_pretty(&mut stdout, &configs)?;
                writeln!(stdout)?;
            }
        }

        if let Some(path) = self.metrics.as_ref() {
            let mut text = String::new();
            encode(&mut text, &prom)?;
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        info!(configs = configs.len(), "Compiled");
        Ok(())
    }

    /// Builds compilation settings from the process flags.
    ///
    /// Default parameter overrides are validated exactly as the corresponding annotations are.
    fn settings(&self) -> Result<Settings> {
        let statics = StaticConfigParams {
            spiffe_certs: self.spiffe_certs,
            enable_internal_routes: self.enable_internal_routes,
            app_protect: self.app_protect,
            external_name_policy: if self.resolve_external_names {
                ExternalNamePolicy::Resolve
            } else {
                ExternalNamePolicy::Static
            },
        };

        let overrides = [
            (annotations::LB_METHOD, &self.lb_method),
            (annotations::UPSTREAM_ZONE_SIZE, &self.upstream_zone_size),
            (annotations::PROXY_CONNECT_TIMEOUT, &self.proxy_connect_timeout),
            (annotations::PROXY_READ_TIMEOUT, &self.proxy_read_timeout),
            (annotations::PROXY_SEND_TIMEOUT, &self.proxy_send_timeout),
            (annotations::CLIENT_MAX_BODY_SIZE, &self.client_max_body_size),
            (annotations::SERVER_TOKENS, &self.server_tokens),
        ]
        .into_iter()
        .filter_map(|(key, value)| Some((key.to_string(), value.clone()?)))
        .collect::<BTreeMap<_, _>>();

        let (defaults, warnings) =
            ConfigParams::default().with_annotations(&overrides, self.nginx_plus, &statics);
        if let Some(warning) = warnings.first() {
            bail!("invalid default: {warning}");
        }

        Ok(Settings {
            defaults,
            statics,
            is_plus: self.nginx_plus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings() {
        let args = Args::try_parse_from(["ingress-controller", "--manifest", "cafe.yaml"]).unwrap();
        assert_eq!(args.settings().unwrap(), Settings::default());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "ingress-controller",
            "--manifest",
            "cafe.yaml",
            "--nginx-plus",
            "--spiffe-certs",
            "--resolve-external-names",
            "--lb-method",
            "least_time header",
            "--proxy-read-timeout",
            "5m",
            "--server-tokens",
            "cafe",
        ])
        .unwrap();

        let settings = args.settings().unwrap();
        assert!(settings.is_plus);
        assert!(settings.statics.spiffe_certs);
        assert_eq!(
            settings.statics.external_name_policy,
            ExternalNamePolicy::Resolve
        );
        assert_eq!(
            settings.defaults,
            ConfigParams {
                lb_method: "least_time header".to_string(),
                proxy_read_timeout: "5m".to_string(),
                server_tokens: "cafe".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn invalid_overrides() {
        let args = Args::try_parse_from([
            "ingress-controller",
            "--manifest",
            "cafe.yaml",
            "--client-max-body-size",
            "huge",
        ])
        .unwrap();
        assert!(args.settings().is_err());
    }
}
