use anyhow::{anyhow, Error, Result};
use std::collections::BTreeMap;

/// The role an Ingress plays when several Ingresses share a host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MergeableType {
    /// Owns the host's server block: TLS, host-level settings, and no paths of its own.
    Master,

    /// Contributes paths to its master's server block.
    Minion,
}

// === impl MergeableType ===

impl MergeableType {
    pub const ANNOTATION: &'static str = "nginx.org/mergeable-ingress-type";

    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Option<Self>> {
        if let Some(v) = annotations.get(Self::ANNOTATION) {
            let ty = v.parse()?;
            return Ok(Some(ty));
        }

        Ok(None)
    }
}

impl std::str::FromStr for MergeableType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "master" => Ok(Self::Master),
            "minion" => Ok(Self::Minion),
            s => Err(anyhow!("invalid mergeable ingress type: {:?}", s)),
        }
    }
}

impl std::fmt::Display for MergeableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Master => "master".fmt(f),
            Self::Minion => "minion".fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn parse_displayed() {
        for ty in [MergeableType::Master, MergeableType::Minion] {
            assert_eq!(
                ty.to_string().parse::<MergeableType>().unwrap(),
                ty,
                "failed to parse displayed {:?}",
                ty
            );
        }
    }

    #[test]
    fn from_annotations() {
        assert_eq!(MergeableType::from_annotations(&BTreeMap::new()).unwrap(), None);
        assert_eq!(
            MergeableType::from_annotations(&btreemap! {
                MergeableType::ANNOTATION.to_string() => "minion".to_string(),
            })
            .unwrap(),
            Some(MergeableType::Minion)
        );
        assert!(MergeableType::from_annotations(&btreemap! {
            MergeableType::ANNOTATION.to_string() => "Master".to_string(),
        })
        .is_err());
    }
}
