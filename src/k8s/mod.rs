//! Kubernetes/OpenShift operations

pub mod openshift;
pub mod pods;
pub mod provision;
pub mod render;
pub mod store;
