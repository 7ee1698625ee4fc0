// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-country endpoint defaults.
//!
//! An optional `endpoints.toml` in the configuration directory maps ISO
//! country codes to WireGuard endpoints:
//!
//! ```toml
//! default = "engage.cloudflareclient.com:2408"
//!
//! [countries]
//! DE = "162.159.192.1:2408"
//! NL = "162.159.193.10:2408"
//! ```
//!
//! It is consulted only when `ENDPOINT` is not set explicitly.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EndpointTable {
	#[serde(default)]
	pub default: Option<String>,
	#[serde(default)]
	pub countries: HashMap<String, String>,
}

impl EndpointTable {
	pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
		let mut table: EndpointTable =
			toml::from_str(content).map_err(|source| ConfigError::EndpointTable {
				path: path.to_path_buf(),
				source,
			})?;
		table.countries = table
			.countries
			.into_iter()
			.map(|(k, v)| (k.to_ascii_uppercase(), v))
			.collect();
		Ok(table)
	}

	/// Load the table, returning `None` when the file does not exist.
	pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
		match std::fs::read_to_string(path) {
			Ok(content) => Self::parse(&content, path).map(Some),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(ConfigError::Io(e)),
		}
	}

	/// Endpoint for `country`, falling back to `default`.
	pub fn lookup(&self, country: &str) -> Option<&str> {
		self
			.countries
			.get(&country.to_ascii_uppercase())
			.or(self.default.as_ref())
			.map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TABLE: &str = r#"
default = "engage.cloudflareclient.com:2408"

[countries]
de = "162.159.192.1:2408"
NL = "162.159.193.10:2408"
"#;

	#[test]
	fn lookup_prefers_country_entry() {
		let table = EndpointTable::parse(TABLE, Path::new("endpoints.toml")).unwrap();
		assert_eq!(table.lookup("DE"), Some("162.159.192.1:2408"));
		assert_eq!(table.lookup("nl"), Some("162.159.193.10:2408"));
	}

	#[test]
	fn lookup_falls_back_to_default() {
		let table = EndpointTable::parse(TABLE, Path::new("endpoints.toml")).unwrap();
		assert_eq!(table.lookup("JP"), Some("engage.cloudflareclient.com:2408"));
	}

	#[test]
	fn lookup_without_default_is_none() {
		let table =
			EndpointTable::parse("[countries]\nDE = \"a:1\"\n", Path::new("endpoints.toml")).unwrap();
		assert_eq!(table.lookup("FR"), None);
	}

	#[test]
	fn malformed_table_is_an_error() {
		let result = EndpointTable::parse("countries = 3", Path::new("endpoints.toml"));
		assert!(matches!(result, Err(ConfigError::EndpointTable { .. })));
	}

	#[test]
	fn load_missing_file_is_none() {
		let dir = tempfile::TempDir::new().unwrap();
		let loaded = EndpointTable::load(&dir.path().join("endpoints.toml")).unwrap();
		assert!(loaded.is_none());
	}
}
