use crate::{IngressBackend, ServiceBackendPort};
use std::fmt;

/// How an Ingress path is matched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathType {
    Exact,
    Prefix,
    ImplementationSpecific,
}

/// A reference from an Ingress backend to a service port, by number or by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub name: String,
    pub port: String,
}

// === impl PathType ===

impl PathType {
    /// Reads an Ingress path's `pathType`. Empty or unknown values are treated as unspecified.
    pub fn from_spec(path_type: &str) -> Option<Self> {
        match path_type {
            "Exact" => Some(Self::Exact),
            "Prefix" => Some(Self::Prefix),
            "ImplementationSpecific" => Some(Self::ImplementationSpecific),
            _ => None,
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => "Exact".fmt(f),
            Self::Prefix => "Prefix".fmt(f),
            Self::ImplementationSpecific => "ImplementationSpecific".fmt(f),
        }
    }
}

// === impl ServiceRef ===

impl ServiceRef {
    /// Returns `None` for resource backends and for service backends without a port.
    pub fn from_backend(backend: &IngressBackend) -> Option<Self> {
        let service = backend.service.as_ref()?;
        let port = match service.port.as_ref()? {
            ServiceBackendPort {
                number: Some(number),
                ..
            } => number.to_string(),
            ServiceBackendPort {
                name: Some(name), ..
            } if !name.is_empty() => name.clone(),
            _ => return None,
        };
        Some(Self {
            name: service.name.clone(),
            port,
        })
    }

    /// The key under which endpoints and probes for this service port are resolved.
    pub fn endpoints_key(&self) -> String {
        format!("{}{}", self.name, self.port)
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}
