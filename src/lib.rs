//! snowdrop-dev: scaffold a Spring Boot development environment on OpenShift

pub mod commands;
pub mod config;
pub mod k8s;
pub mod utils;
