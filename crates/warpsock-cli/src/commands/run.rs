// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing::info;
use warpsock_config::WarpsockConfig;
use warpsock_launcher::Launcher;
use warpsock_provision::TokioCommandRunner;

use super::provision::prepare;
use crate::error::Result;

/// Full pipeline: validate, provision, patch, then supervise the proxy.
///
/// Returns the proxy's exit code.
pub async fn handle_run(config: &WarpsockConfig) -> Result<i32> {
	config.validate_dirs()?;
	prepare(config, TokioCommandRunner::new()).await?;

	let launcher = Launcher::from_config(config);
	info!(
		backend = %config.backend,
		bind = %config.bind_address(),
		log_file = %config.paths.log_file.display(),
		"launching proxy"
	);
	Ok(launcher.run().await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::os::unix::fs::PermissionsExt;
	use std::path::{Path, PathBuf};
	use tempfile::TempDir;
	use warpsock_config::env_vars;

	const WGCF_STUB: &str = r#"#!/bin/sh
case "$1" in
register) printf "access_token = 'x'\n" > "$4" ;;
generate) printf '[Interface]\nPrivateKey = k\nDNS = 1.1.1.1\n\n[Peer]\nPublicKey = p\nEndpoint = engage.cloudflareclient.com:2408\n' > "$5" ;;
esac
"#;

	fn stub(dir: &Path, name: &str, script: &str) -> PathBuf {
		let path = dir.join(name);
		std::fs::write(&path, script).unwrap();
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
		path
	}

	#[tokio::test]
	async fn fresh_config_dir_launches_proxy_with_profile() {
		let bin = TempDir::new().unwrap();
		let config_dir = TempDir::new().unwrap();
		let wgcf = stub(bin.path(), "wgcf", WGCF_STUB);
		let wireproxy = stub(bin.path(), "wireproxy", "#!/bin/sh\necho \"$@\"\n");

		let env: HashMap<&str, String> = HashMap::from([
			(env_vars::CONFIG_DIR, config_dir.path().display().to_string()),
			(env_vars::WGCF_BIN, wgcf.display().to_string()),
			(env_vars::WIREPROXY_BIN, wireproxy.display().to_string()),
		]);
		let config = WarpsockConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

		assert_eq!(handle_run(&config).await.unwrap(), 0);

		let profile_file = config_dir.path().join("wgcf-profile.conf");
		let profile = std::fs::read_to_string(&profile_file).unwrap();
		assert!(profile.ends_with("\n[Socks5]\nBindAddress = 0.0.0.0:1080\n"));

		let log = std::fs::read_to_string(config_dir.path().join("warpsock.log")).unwrap();
		assert_eq!(log, format!("-c {}\n", profile_file.display()));
	}
}
