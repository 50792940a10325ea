#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use ingress_controller_core as core;
pub use ingress_controller_k8s_api as k8s;
pub use ingress_controller_k8s_configs as configs;

mod args;
mod manifest;

pub use self::{
    args::Args,
    manifest::{FileLayout, Manifest},
};
