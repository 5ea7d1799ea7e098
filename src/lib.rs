//! Hdsforge - HTTP Dynamic Streaming packager
//!
//! This library crate exposes config and timeline loading for integration testing.

pub mod config;
pub mod timeline;
