use crate::{Compiled, Error};
use ingress_controller_k8s_api::ResourceId;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counts compilation outcomes and warnings.
#[derive(Clone, Debug, Default)]
pub struct CompileMetrics {
    compiles: Family<CompileLabels, Counter>,
    warnings: Family<WarningLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CompileLabels {
    namespace: String,
    outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct WarningLabels {
    namespace: String,
    kind: String,
}

impl CompileMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let compiles = Family::default();
        reg.register(
            "compiles",
            "Count of Ingress compilations by outcome",
            compiles.clone(),
        );

        let warnings = Family::default();
        reg.register(
            "warnings",
            "Count of warnings reported while compiling Ingresses",
            warnings.clone(),
        );

        Self { compiles, warnings }
    }

    pub fn record(&self, id: &ResourceId, result: &Result<Compiled, Error>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(Error::MissingMetadata(_)) => "missing_metadata",
            Err(Error::DuplicatePath { .. }) => "duplicate_path",
            Err(Error::UpstreamConflict { .. }) => "upstream_conflict",
        };
        self.compiles
            .get_or_create(&CompileLabels {
                namespace: id.namespace.clone(),
                outcome: outcome.to_string(),
            })
            .inc();

        if let Ok(compiled) = result {
            for (owner, warning) in &compiled.warnings {
                self.warnings
                    .get_or_create(&WarningLabels {
                        namespace: owner.namespace.clone(),
                        kind: warning.kind().to_string(),
                    })
                    .inc();
            }
        }
    }
}
