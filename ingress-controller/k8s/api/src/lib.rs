#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod resolved;
mod resource_id;

pub use self::{
    backend::{PathType, ServiceRef},
    resolved::{JwtKey, MergeableIngresses, ResolvedIngress},
    resource_id::{MissingMetadata, ResourceId},
};
pub use k8s_openapi::{
    api::{
        self,
        core::v1::{HTTPGetAction, HTTPHeader, Probe, Secret, TypedLocalObjectReference},
        networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
            IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
        },
    },
    apimachinery::pkg::{apis::meta::v1::ObjectMeta, util::intstr::IntOrString},
};
pub use kube::ResourceExt;
