//! Command implementations for the sd CLI

pub mod config;
pub mod init;
pub mod pod;
pub mod setup;
