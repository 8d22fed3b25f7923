//! Storage infrastructure: the TOML configuration file.
//!
//! `config` reads the pipeline settings from the platform config directory
//! (or an explicit path) and falls back to defaults on first run.

pub mod config;
