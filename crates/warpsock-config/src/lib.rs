// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration for warpsock.
//!
//! Everything the entrypoint needs is resolved once at startup into a
//! [`WarpsockConfig`] and passed down explicitly. This crate provides:
//!
//! - [`env_vars`]: the environment variable names and their defaults
//! - [`WarpsockConfig::from_env`] / [`WarpsockConfig::from_lookup`]: parsing
//!   and validation (the lookup form lets tests supply synthetic environments)
//! - [`ConfigPaths`]: the fixed file layout under the configuration directory
//! - [`EndpointTable`]: optional per-country endpoint defaults
//! - [`Secret`]: a redacting wrapper for the WARP+ license key

pub mod config;
pub mod endpoints;
pub mod env_vars;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::{Binaries, ProxyBackend, RunAs, WarpsockConfig};
pub use endpoints::EndpointTable;
pub use error::ConfigError;
pub use paths::ConfigPaths;
pub use secret::{Secret, SecretString, REDACTED};
