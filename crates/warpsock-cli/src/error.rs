// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
	#[error("configuration error: {0}")]
	Config(#[from] warpsock_config::ConfigError),

	#[error("provisioning failed: {0}")]
	Provision(#[from] warpsock_provision::ProvisionError),

	#[error("profile error: {0}")]
	Profile(#[from] warpsock_profile::ProfileError),

	#[error("launch failed: {0}")]
	Launch(#[from] warpsock_launcher::LaunchError),

	#[error("health check failed: {0}")]
	Health(#[from] warpsock_health::HealthError),
}

impl CliError {
	/// Exit code for the wrapper process.
	pub fn exit_code(&self) -> i32 {
		match self {
			CliError::Provision(e) => e.exit_code(),
			CliError::Launch(e) => e.exit_code(),
			CliError::Config(_) | CliError::Profile(_) | CliError::Health(_) => 1,
		}
	}
}

/// Exit code for any top-level error.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
	err
		.downcast_ref::<CliError>()
		.map(CliError::exit_code)
		.unwrap_or(1)
}

pub type Result<T> = std::result::Result<T, CliError>;
