use crate::ObjectMeta;
use std::fmt;

/// The namespace and name of a resource.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[error("resource is missing a {0}")]
pub struct MissingMetadata(pub &'static str);

impl ResourceId {
    pub fn new(namespace: String, name: String) -> Self {
        Self { namespace, name }
    }

    pub fn from_meta(meta: &ObjectMeta) -> Result<Self, MissingMetadata> {
        let namespace = meta
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .ok_or(MissingMetadata("namespace"))?;
        let name = meta
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or(MissingMetadata("name"))?;
        Ok(Self { namespace, name })
    }

    /// The `<namespace>-<name>` form used for secret files and generated names.
    pub fn file_name(&self) -> String {
        format!("{}-{}", self.namespace, self.name)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_meta_requires_namespace_and_name() {
        let meta = ObjectMeta {
            namespace: Some("default".to_string()),
            name: Some("cafe-ingress".to_string()),
            ..Default::default()
        };
        let id = ResourceId::from_meta(&meta).unwrap();
        assert_eq!(id.file_name(), "default-cafe-ingress");
        assert_eq!(id.to_string(), "default/cafe-ingress");

        let meta = ObjectMeta {
            name: Some("cafe-ingress".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ResourceId::from_meta(&meta),
            Err(MissingMetadata("namespace"))
        );

        let meta = ObjectMeta {
            namespace: Some("default".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(ResourceId::from_meta(&meta), Err(MissingMetadata("name")));
    }
}
