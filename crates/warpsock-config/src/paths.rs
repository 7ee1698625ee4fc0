// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed file layout under the configuration directory.

use std::path::{Path, PathBuf};

use crate::ConfigError;

pub const ACCOUNT_FILENAME: &str = "wgcf-account.toml";
pub const PROFILE_FILENAME: &str = "wgcf-profile.conf";
pub const LOG_FILENAME: &str = "warpsock.log";
pub const ENDPOINTS_FILENAME: &str = "endpoints.toml";

/// Resolved paths for a single warpsock instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
	/// Base directory: /config
	pub config_dir: PathBuf,
	/// Account credentials written by `wgcf register`
	pub account_file: PathBuf,
	/// WireGuard profile written by `wgcf generate`
	pub profile_file: PathBuf,
	/// Proxy output log
	pub log_file: PathBuf,
	/// Optional country -> endpoint table
	pub endpoints_file: PathBuf,
}

impl ConfigPaths {
	/// Lay out the conventional file names under `config_dir`.
	pub fn new(config_dir: impl Into<PathBuf>) -> Self {
		let config_dir = config_dir.into();
		Self {
			account_file: config_dir.join(ACCOUNT_FILENAME),
			profile_file: config_dir.join(PROFILE_FILENAME),
			log_file: config_dir.join(LOG_FILENAME),
			endpoints_file: config_dir.join(ENDPOINTS_FILENAME),
			config_dir,
		}
	}

	pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
		self.log_file = log_file.into();
		self
	}

	/// Fail fast unless the configuration directory exists and is writable.
	pub fn validate_dirs(&self) -> Result<(), ConfigError> {
		ensure_writable_dir(&self.config_dir)
	}
}

fn ensure_writable_dir(dir: &Path) -> Result<(), ConfigError> {
	let metadata = match std::fs::metadata(dir) {
		Ok(m) => m,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
		}
		Err(e) => return Err(ConfigError::Io(e)),
	};

	if !metadata.is_dir() {
		return Err(ConfigError::NotADirectory(dir.to_path_buf()));
	}

	// Mode bits do not reflect root or read-only mounts, so probe with a real file.
	tempfile::Builder::new()
		.prefix(".warpsock-probe")
		.tempfile_in(dir)
		.map_err(|source| ConfigError::NotWritable {
			path: dir.to_path_buf(),
			source,
		})?;

	tracing::debug!(dir = %dir.display(), "configuration directory is writable");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn layout_uses_conventional_names() {
		let paths = ConfigPaths::new("/config");
		assert_eq!(paths.account_file, PathBuf::from("/config/wgcf-account.toml"));
		assert_eq!(paths.profile_file, PathBuf::from("/config/wgcf-profile.conf"));
		assert_eq!(paths.log_file, PathBuf::from("/config/warpsock.log"));
		assert_eq!(paths.endpoints_file, PathBuf::from("/config/endpoints.toml"));
	}

	#[test]
	fn log_file_can_be_overridden() {
		let paths = ConfigPaths::new("/config").with_log_file("/var/log/warp.log");
		assert_eq!(paths.log_file, PathBuf::from("/var/log/warp.log"));
		assert_eq!(paths.profile_file, PathBuf::from("/config/wgcf-profile.conf"));
	}

	#[test]
	fn validate_dirs_accepts_writable_dir() {
		let dir = TempDir::new().unwrap();
		let paths = ConfigPaths::new(dir.path());
		paths.validate_dirs().unwrap();

		let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
		assert!(leftovers.is_empty(), "probe file must not be left behind");
	}

	#[test]
	fn validate_dirs_rejects_missing_dir() {
		let dir = TempDir::new().unwrap();
		let paths = ConfigPaths::new(dir.path().join("absent"));
		assert!(matches!(
			paths.validate_dirs(),
			Err(ConfigError::MissingDirectory(_))
		));
	}

	#[test]
	fn validate_dirs_rejects_plain_file() {
		let dir = TempDir::new().unwrap();
		let file = dir.path().join("not-a-dir");
		std::fs::write(&file, b"x").unwrap();

		let paths = ConfigPaths::new(&file);
		assert!(matches!(
			paths.validate_dirs(),
			Err(ConfigError::NotADirectory(_))
		));
	}
}
