// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing::{info, instrument};
use warpsock_config::{ProxyBackend, WarpsockConfig};
use warpsock_profile::{patch_profile_file, PatchOptions, PatchReport};
use warpsock_provision::{CommandRunner, ProvisionReport, Provisioner, TokioCommandRunner};

use crate::error::Result;

/// Patch options derived from the configuration.
///
/// DNS is written into the profile only for wireproxy, which reads it from
/// `[Interface]`.
pub fn patch_options(config: &WarpsockConfig) -> PatchOptions {
	let dns = (config.backend == ProxyBackend::Wireproxy).then(|| config.dns.clone());
	PatchOptions::new(config.bind_address())
		.with_endpoint(config.endpoint.clone())
		.with_dns(dns)
}

/// Ensure account and profile exist, then patch the profile.
///
/// Returns `None` for backends that manage their own identity.
#[instrument(skip_all, fields(backend = %config.backend))]
pub async fn prepare<R: CommandRunner>(
	config: &WarpsockConfig,
	runner: R,
) -> Result<Option<(ProvisionReport, PatchReport)>> {
	if !config.backend.needs_profile() {
		info!("backend manages its own identity; skipping wgcf provisioning");
		return Ok(None);
	}

	let provisioned = Provisioner::from_config(runner, config).provision().await?;
	let patched = patch_profile_file(&config.paths.profile_file, &patch_options(config))?;
	info!(
		account_created = provisioned.account.created(),
		profile_created = provisioned.profile.created(),
		profile_changed = patched.changed(),
		"profile ready"
	);
	Ok(Some((provisioned, patched)))
}

pub async fn handle_provision(config: &WarpsockConfig) -> Result<i32> {
	config.validate_dirs()?;
	prepare(config, TokioCommandRunner::new()).await?;
	Ok(0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use fake::ScriptedRunner;
	use tempfile::TempDir;
	use warpsock_profile::Socks5Change;

	const GENERATED: &str = "[Interface]\nPrivateKey = k\nAddress = 172.16.0.2/32\nDNS = 1.1.1.1\nMTU = 1280\n\n[Peer]\nPublicKey = p\nAllowedIPs = 0.0.0.0/0\nEndpoint = engage.cloudflareclient.com:2408\n";

	mod fake {
		use warpsock_provision::{CommandOutput, CommandRunner, Invocation, Result};

		/// Writes a canned account or profile wherever wgcf was asked to.
		pub struct ScriptedRunner {
			pub profile: &'static str,
		}

		#[async_trait::async_trait]
		impl CommandRunner for ScriptedRunner {
			async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
				let args = &invocation.args;
				let target = |flag: &str| {
					args
						.iter()
						.position(|a| a == flag)
						.and_then(|i| args.get(i + 1))
						.cloned()
				};
				match args[0].as_str() {
					"register" => {
						if let Some(path) = target("--config") {
							std::fs::write(path, "access_token = 'x'\n")?;
						}
					}
					"generate" => {
						if let Some(path) = target("--profile") {
							std::fs::write(path, self.profile)?;
						}
					}
					_ => {}
				}
				Ok(CommandOutput::default())
			}
		}
	}

	#[test]
	fn dns_is_only_patched_for_wireproxy() {
		let mut config = WarpsockConfig::with_defaults("/config");
		assert_eq!(patch_options(&config).dns.as_deref(), Some("1.1.1.1"));

		config.backend = ProxyBackend::WarpPlus;
		assert!(patch_options(&config).dns.is_none());
	}

	#[tokio::test]
	async fn fresh_directory_ends_with_patched_profile() {
		let dir = TempDir::new().unwrap();
		let mut config = WarpsockConfig::with_defaults(dir.path());
		config.socks_port = 1081;
		config.endpoint = Some("162.159.192.1:2408".to_string());

		let (provisioned, patched) = prepare(&config, ScriptedRunner { profile: GENERATED })
			.await
			.unwrap()
			.unwrap();
		assert!(provisioned.account.created());
		assert!(patched.endpoint_changed);
		assert_eq!(patched.socks5, Socks5Change::Appended);

		let profile = std::fs::read_to_string(&config.paths.profile_file).unwrap();
		assert!(profile.contains("Endpoint = 162.159.192.1:2408\n"));
		assert!(!profile.contains("engage.cloudflareclient.com"));
		assert!(profile.ends_with("\n[Socks5]\nBindAddress = 0.0.0.0:1081\n"));
	}

	#[tokio::test]
	async fn second_prepare_is_a_no_op() {
		let dir = TempDir::new().unwrap();
		let config = WarpsockConfig::with_defaults(dir.path());

		prepare(&config, ScriptedRunner { profile: GENERATED })
			.await
			.unwrap();
		let first = std::fs::read(&config.paths.profile_file).unwrap();

		let (provisioned, patched) = prepare(&config, ScriptedRunner { profile: GENERATED })
			.await
			.unwrap()
			.unwrap();
		assert!(!provisioned.account.created());
		assert!(!provisioned.profile.created());
		assert!(!patched.changed());
		assert_eq!(std::fs::read(&config.paths.profile_file).unwrap(), first);
	}

	#[tokio::test]
	async fn warp_plus_skips_provisioning() {
		let dir = TempDir::new().unwrap();
		let mut config = WarpsockConfig::with_defaults(dir.path());
		config.backend = ProxyBackend::WarpPlus;

		let result = prepare(&config, ScriptedRunner { profile: GENERATED })
			.await
			.unwrap();
		assert!(result.is_none());
		assert!(!config.paths.account_file.exists());
	}
}
