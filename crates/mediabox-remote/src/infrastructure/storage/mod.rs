//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform config directory, falls back to defaults on first run, and
//! writes the last host back after a successful connect.

pub mod config;
