// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while resolving and validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A variable was set but could not be parsed or failed validation
	#[error("Invalid value for {var}: {message}")]
	InvalidValue { var: String, message: String },

	/// One of a pair of variables that must be set together is missing
	#[error("{present} is set but {missing} is not; set both or neither")]
	IncompletePair {
		present: &'static str,
		missing: &'static str,
	},

	/// The configuration directory does not exist
	#[error("configuration directory {0} does not exist")]
	MissingDirectory(PathBuf),

	/// The configuration path exists but is not a directory
	#[error("{0} is not a directory")]
	NotADirectory(PathBuf),

	/// The configuration directory cannot be written to
	#[error("configuration directory {path} is not writable: {source}")]
	NotWritable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A `*_FILE` secret could not be read
	#[error("failed to read secret file at {path}: {source}")]
	SecretFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The endpoint table could not be parsed
	#[error("TOML parse error in {path}: {source}")]
	EndpointTable {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// I/O error reading a configuration file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(var: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			var: var.into(),
			message: message.into(),
		}
	}
}
