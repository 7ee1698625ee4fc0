// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use warpsock_config::{ProxyBackend, SecretString, WarpsockConfig, REDACTED};

/// A single command-line argument. Secret values are masked when displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
	Plain(String),
	Secret(SecretString),
}

impl Arg {
	pub fn as_os_str(&self) -> &OsStr {
		match self {
			Arg::Plain(value) => OsStr::new(value),
			Arg::Secret(value) => OsStr::new(value.expose()),
		}
	}

	fn display(&self) -> &str {
		match self {
			Arg::Plain(value) => value,
			Arg::Secret(_) => REDACTED,
		}
	}
}

impl From<&str> for Arg {
	fn from(value: &str) -> Self {
		Arg::Plain(value.to_string())
	}
}

impl From<String> for Arg {
	fn from(value: String) -> Self {
		Arg::Plain(value)
	}
}

/// The proxy process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCommand {
	pub program: PathBuf,
	pub args: Vec<Arg>,
}

impl ProxyCommand {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
		}
	}

	pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
		self.args.push(arg.into());
		self
	}

	fn push(&mut self, arg: impl Into<Arg>) {
		self.args.push(arg.into());
	}

	/// Build the command for the configured backend.
	pub fn for_config(config: &WarpsockConfig) -> Self {
		match config.backend {
			ProxyBackend::Wireproxy => {
				Self::wireproxy(&config.binaries.wireproxy, &config.paths.profile_file)
			}
			ProxyBackend::WarpPlus => Self::warp_plus(config),
		}
	}

	/// `wireproxy -c <profile>`
	pub fn wireproxy(program: &Path, profile: &Path) -> Self {
		Self::new(program)
			.arg("-c")
			.arg(profile.display().to_string())
	}

	/// `warp-plus --bind <addr> --dns <dns>` followed by the options that are set.
	pub fn warp_plus(config: &WarpsockConfig) -> Self {
		let mut cmd = Self::new(&config.binaries.warp_plus)
			.arg("--bind")
			.arg(config.bind_address())
			.arg("--dns")
			.arg(config.dns.as_str());

		if let Some(endpoint) = &config.endpoint {
			cmd.push("--endpoint");
			cmd.push(endpoint.as_str());
		}
		if let Some(key) = &config.license_key {
			cmd.push("--key");
			cmd.push(Arg::Secret(key.clone()));
		}
		if config.scan {
			cmd.push("--scan");
		}
		if config.cfon {
			cmd.push("--cfon");
			cmd.push("--country");
			cmd.push(config.country.as_str());
		}
		if let Some(cache_dir) = &config.cache_dir {
			cmd.push("--cache-dir");
			cmd.push(cache_dir.display().to_string());
		}
		if config.verbose {
			cmd.push("--verbose");
		}
		cmd
	}

	pub fn program_name(&self) -> String {
		self.program.display().to_string()
	}

	/// Command line for logs, with secrets masked.
	pub fn display_line(&self) -> String {
		let program = self.program_name();
		std::iter::once(program.as_str())
			.chain(self.args.iter().map(Arg::display))
			.collect::<Vec<_>>()
			.join(" ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn plain_args(cmd: &ProxyCommand) -> Vec<String> {
		cmd
			.args
			.iter()
			.map(|a| a.as_os_str().to_string_lossy().to_string())
			.collect()
	}

	fn warp_plus_config() -> WarpsockConfig {
		let mut config = WarpsockConfig::with_defaults("/config");
		config.backend = ProxyBackend::WarpPlus;
		config
	}

	#[test]
	fn wireproxy_points_at_profile() {
		let config = WarpsockConfig::with_defaults("/config");
		let cmd = ProxyCommand::for_config(&config);

		assert_eq!(cmd.program, PathBuf::from("wireproxy"));
		assert_eq!(plain_args(&cmd), vec!["-c", "/config/wgcf-profile.conf"]);
	}

	#[test]
	fn warp_plus_minimal_omits_unset_options() {
		let cmd = ProxyCommand::for_config(&warp_plus_config());

		assert_eq!(cmd.program, PathBuf::from("warp-plus"));
		assert_eq!(
			plain_args(&cmd),
			vec!["--bind", "0.0.0.0:1080", "--dns", "1.1.1.1"]
		);
	}

	#[test]
	fn warp_plus_full_command_line() {
		let mut config = warp_plus_config();
		config.socks_port = 4000;
		config.dns = "9.9.9.9".to_string();
		config.endpoint = Some("162.159.192.1:2408".to_string());
		config.license_key = Some(SecretString::new("key-123".to_string()));
		config.scan = true;
		config.cfon = true;
		config.country = "DE".to_string();
		config.cache_dir = Some(PathBuf::from("/config/cache"));
		config.verbose = true;

		let cmd = ProxyCommand::for_config(&config);

		assert_eq!(
			plain_args(&cmd),
			vec![
				"--bind",
				"0.0.0.0:4000",
				"--dns",
				"9.9.9.9",
				"--endpoint",
				"162.159.192.1:2408",
				"--key",
				"key-123",
				"--scan",
				"--cfon",
				"--country",
				"DE",
				"--cache-dir",
				"/config/cache",
				"--verbose",
			]
		);
	}

	#[test]
	fn country_is_only_passed_with_cfon() {
		let mut config = warp_plus_config();
		config.country = "DE".to_string();

		let args = plain_args(&ProxyCommand::for_config(&config));
		assert!(!args.contains(&"--country".to_string()));
		assert!(!args.contains(&"DE".to_string()));
	}

	#[test]
	fn display_line_masks_license_key() {
		let mut config = warp_plus_config();
		config.license_key = Some(SecretString::new("key-123".to_string()));

		let cmd = ProxyCommand::for_config(&config);
		let line = cmd.display_line();

		assert!(!line.contains("key-123"));
		assert!(line.contains("--key [REDACTED]"));
		assert!(!format!("{cmd:?}").contains("key-123"));
	}
}
