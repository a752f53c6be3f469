//! Configuration: project MANIFEST, tool settings and cluster access

pub mod cluster;
pub mod manifest;
pub mod settings;
