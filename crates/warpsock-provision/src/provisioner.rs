// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use tracing::{info, instrument};
use warpsock_config::{ConfigPaths, SecretString, WarpsockConfig};

use crate::error::{ProvisionError, Result};
use crate::runner::{CommandRunner, Invocation};

/// Environment variable `wgcf update` reads the WARP+ license key from.
pub const WGCF_LICENSE_ENV: &str = "WGCF_LICENSE_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// The file was already present; no command ran.
	Existing,
	/// The file was created by this run.
	Created,
}

impl Outcome {
	pub fn created(&self) -> bool {
		matches!(self, Outcome::Created)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
	pub account: Outcome,
	/// Whether a license key was applied to a freshly registered account.
	pub license_applied: bool,
	pub profile: Outcome,
}

pub struct Provisioner<R: CommandRunner> {
	runner: R,
	wgcf: PathBuf,
	paths: ConfigPaths,
	license_key: Option<SecretString>,
}

impl<R: CommandRunner> Provisioner<R> {
	pub fn new(runner: R, wgcf: impl Into<PathBuf>, paths: ConfigPaths) -> Self {
		Self {
			runner,
			wgcf: wgcf.into(),
			paths,
			license_key: None,
		}
	}

	pub fn from_config(runner: R, config: &WarpsockConfig) -> Self {
		Self::new(runner, &config.binaries.wgcf, config.paths.clone())
			.with_license_key(config.license_key.clone())
	}

	pub fn with_license_key(mut self, license_key: Option<SecretString>) -> Self {
		self.license_key = license_key;
		self
	}

	fn invocation(&self, description: &'static str) -> Invocation {
		Invocation::new(&self.wgcf, description).current_dir(&self.paths.config_dir)
	}

	/// Register a WARP account unless the account file already exists.
	///
	/// Returns whether a license key was applied alongside the outcome.
	#[instrument(skip(self), fields(account = %self.paths.account_file.display()))]
	pub async fn ensure_account(&self) -> Result<(Outcome, bool)> {
		let account = &self.paths.account_file;
		if exists(account).await? {
			info!("using existing WARP account");
			return Ok((Outcome::Existing, false));
		}

		info!("registering new WARP account");
		let register = self
			.invocation("register WARP account")
			.args(["register", "--accept-tos", "--config"])
			.arg(path_arg(account));
		self.runner.run(&register).await?;
		require_output(account, register.description).await?;

		let Some(key) = &self.license_key else {
			return Ok((Outcome::Created, false));
		};

		info!("applying WARP+ license key");
		let update = self
			.invocation("apply WARP+ license key")
			.args(["update", "--config"])
			.arg(path_arg(account))
			.secret_env(WGCF_LICENSE_ENV, key.clone());
		self.runner.run(&update).await?;

		Ok((Outcome::Created, true))
	}

	/// Generate the WireGuard profile unless it already exists.
	#[instrument(skip(self), fields(profile = %self.paths.profile_file.display()))]
	pub async fn ensure_profile(&self) -> Result<Outcome> {
		let profile = &self.paths.profile_file;
		if exists(profile).await? {
			info!("using existing WireGuard profile");
			return Ok(Outcome::Existing);
		}

		info!("generating WireGuard profile");
		let generate = self
			.invocation("generate WireGuard profile")
			.args(["generate", "--config"])
			.arg(path_arg(&self.paths.account_file))
			.arg("--profile")
			.arg(path_arg(profile));
		self.runner.run(&generate).await?;
		require_output(profile, generate.description).await?;

		Ok(Outcome::Created)
	}

	/// Account first, then profile.
	pub async fn provision(&self) -> Result<ProvisionReport> {
		let (account, license_applied) = self.ensure_account().await?;
		let profile = self.ensure_profile().await?;
		Ok(ProvisionReport {
			account,
			license_applied,
			profile,
		})
	}
}

async fn exists(path: &Path) -> Result<bool> {
	Ok(tokio::fs::try_exists(path).await?)
}

async fn require_output(path: &Path, description: &'static str) -> Result<()> {
	if exists(path).await? {
		Ok(())
	} else {
		Err(ProvisionError::MissingOutput {
			description,
			path: path.to_path_buf(),
		})
	}
}

fn path_arg(path: &Path) -> String {
	path.display().to_string()
}
