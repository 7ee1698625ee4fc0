// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use crate::endpoints::EndpointTable;
use crate::env_vars;
use crate::error::ConfigError;
use crate::paths::ConfigPaths;
use crate::secret::{Secret, SecretString};

/// Which proxy binary terminates the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyBackend {
	/// `wgcf` provisions a profile, `wireproxy` serves SOCKS5 from it.
	#[default]
	Wireproxy,
	/// `warp-plus` registers and serves on its own.
	WarpPlus,
}

impl ProxyBackend {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProxyBackend::Wireproxy => "wireproxy",
			ProxyBackend::WarpPlus => "warp-plus",
		}
	}

	/// Whether this backend consumes a wgcf account and profile.
	pub fn needs_profile(&self) -> bool {
		matches!(self, ProxyBackend::Wireproxy)
	}
}

impl fmt::Display for ProxyBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ProxyBackend {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"wireproxy" => Ok(ProxyBackend::Wireproxy),
			"warp-plus" | "warp_plus" | "warpplus" => Ok(ProxyBackend::WarpPlus),
			other => Err(ConfigError::invalid_value(
				env_vars::PROXY_BACKEND,
				format!("unknown backend '{other}', expected wireproxy or warp-plus"),
			)),
		}
	}
}

/// Reduced-privilege identity for the proxy process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunAs {
	pub uid: u32,
	pub gid: u32,
}

/// Paths or names of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binaries {
	pub wgcf: PathBuf,
	pub wireproxy: PathBuf,
	pub warp_plus: PathBuf,
}

impl Default for Binaries {
	fn default() -> Self {
		Self {
			wgcf: PathBuf::from("wgcf"),
			wireproxy: PathBuf::from("wireproxy"),
			warp_plus: PathBuf::from("warp-plus"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct WarpsockConfig {
	pub paths: ConfigPaths,
	pub backend: ProxyBackend,
	pub socks_port: u16,
	pub dns: String,
	/// Explicit `ENDPOINT`, or the endpoint table's pick for `country`.
	pub endpoint: Option<String>,
	pub license_key: Option<SecretString>,
	pub scan: bool,
	pub cfon: bool,
	/// Upper-case ISO 3166 alpha-2 code.
	pub country: String,
	pub cache_dir: Option<PathBuf>,
	pub verbose: bool,
	pub run_as: Option<RunAs>,
	pub binaries: Binaries,
}

impl WarpsockConfig {
	/// Resolve the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Resolve the configuration from an arbitrary key/value lookup.
	///
	/// Empty values are treated as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		let config_dir = get(env_vars::CONFIG_DIR)
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from(env_vars::DEFAULT_CONFIG_DIR));
		let mut paths = ConfigPaths::new(config_dir);
		if let Some(log_file) = get(env_vars::LOG_FILE) {
			paths = paths.with_log_file(log_file);
		}

		let backend = get(env_vars::PROXY_BACKEND)
			.map(|v| v.parse::<ProxyBackend>())
			.transpose()?
			.unwrap_or_default();

		let socks_port = match get(env_vars::SOCKS5_PORT) {
			Some(v) => parse_port(env_vars::SOCKS5_PORT, &v)?,
			None => env_vars::DEFAULT_SOCKS5_PORT,
		};

		let dns = get(env_vars::DNS)
			.map(|v| v.trim().to_string())
			.unwrap_or_else(|| env_vars::DEFAULT_DNS.to_string());

		let country = match get(env_vars::COUNTRY) {
			Some(v) => parse_country(&v)?,
			None => env_vars::DEFAULT_COUNTRY.to_string(),
		};

		let endpoint = match get(env_vars::ENDPOINT) {
			Some(v) => Some(parse_endpoint(env_vars::ENDPOINT, &v)?),
			None => endpoint_from_table(&paths, &country)?,
		};

		let license_key = load_secret(&lookup, env_vars::WARP_LICENSE_KEY)?;

		let scan = parse_flag(env_vars::WARP_SCAN, get(env_vars::WARP_SCAN))?;
		let cfon = parse_flag(env_vars::WARP_CFON, get(env_vars::WARP_CFON))?;
		let verbose = parse_flag(env_vars::VERBOSE, get(env_vars::VERBOSE))?;

		let cache_dir = get(env_vars::CACHE_DIR).map(PathBuf::from);

		let run_as = match (get(env_vars::PUID), get(env_vars::PGID)) {
			(Some(uid), Some(gid)) => Some(RunAs {
				uid: parse_id(env_vars::PUID, &uid)?,
				gid: parse_id(env_vars::PGID, &gid)?,
			}),
			(Some(_), None) => {
				return Err(ConfigError::IncompletePair {
					present: env_vars::PUID,
					missing: env_vars::PGID,
				});
			}
			(None, Some(_)) => {
				return Err(ConfigError::IncompletePair {
					present: env_vars::PGID,
					missing: env_vars::PUID,
				});
			}
			(None, None) => None,
		};

		let defaults = Binaries::default();
		let binaries = Binaries {
			wgcf: get(env_vars::WGCF_BIN)
				.map(PathBuf::from)
				.unwrap_or(defaults.wgcf),
			wireproxy: get(env_vars::WIREPROXY_BIN)
				.map(PathBuf::from)
				.unwrap_or(defaults.wireproxy),
			warp_plus: get(env_vars::WARP_PLUS_BIN)
				.map(PathBuf::from)
				.unwrap_or(defaults.warp_plus),
		};

		let config = Self {
			paths,
			backend,
			socks_port,
			dns,
			endpoint,
			license_key,
			scan,
			cfon,
			country,
			cache_dir,
			verbose,
			run_as,
			binaries,
		};

		info!(
			backend = %config.backend,
			config_dir = %config.paths.config_dir.display(),
			socks_port = config.socks_port,
			endpoint = config.endpoint.as_deref().unwrap_or("<profile>"),
			country = %config.country,
			has_license_key = config.license_key.is_some(),
			"resolved configuration"
		);

		Ok(config)
	}

	/// Configuration with defaults rooted at `config_dir`, for tests and embedders.
	pub fn with_defaults(config_dir: impl Into<PathBuf>) -> Self {
		Self {
			paths: ConfigPaths::new(config_dir),
			backend: ProxyBackend::default(),
			socks_port: env_vars::DEFAULT_SOCKS5_PORT,
			dns: env_vars::DEFAULT_DNS.to_string(),
			endpoint: None,
			license_key: None,
			scan: false,
			cfon: false,
			country: env_vars::DEFAULT_COUNTRY.to_string(),
			cache_dir: None,
			verbose: false,
			run_as: None,
			binaries: Binaries::default(),
		}
	}

	/// Address the SOCKS5 listener binds to.
	pub fn bind_address(&self) -> String {
		format!("0.0.0.0:{}", self.socks_port)
	}

	/// Fail fast on missing or read-only directories.
	pub fn validate_dirs(&self) -> Result<(), ConfigError> {
		self.paths.validate_dirs()
	}
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
	let port: u16 = value
		.trim()
		.parse()
		.map_err(|e| ConfigError::invalid_value(var, format!("'{value}' is not a port: {e}")))?;
	if port == 0 {
		return Err(ConfigError::invalid_value(var, "port must be greater than 0"));
	}
	Ok(port)
}

fn parse_id(var: &str, value: &str) -> Result<u32, ConfigError> {
	value
		.trim()
		.parse()
		.map_err(|e| ConfigError::invalid_value(var, format!("'{value}' is not a numeric id: {e}")))
}

fn parse_country(value: &str) -> Result<String, ConfigError> {
	let value = value.trim();
	if value.len() != 2 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
		return Err(ConfigError::invalid_value(
			env_vars::COUNTRY,
			format!("'{value}' is not a 2-letter ISO code"),
		));
	}
	Ok(value.to_ascii_uppercase())
}

/// Accepts `host:port` and `[v6]:port`.
fn parse_endpoint(var: &str, value: &str) -> Result<String, ConfigError> {
	let value = value.trim();
	let (host, port) = value
		.rsplit_once(':')
		.ok_or_else(|| ConfigError::invalid_value(var, format!("'{value}' is not host:port")))?;
	if host.is_empty() || host == "[]" {
		return Err(ConfigError::invalid_value(var, format!("'{value}' has no host")));
	}
	let bracketed = host.starts_with('[') && host.ends_with(']');
	if host.contains(':') && !bracketed {
		return Err(ConfigError::invalid_value(
			var,
			format!("'{value}' needs brackets around an IPv6 host, as in [::1]:2408"),
		));
	}
	parse_port(var, port)?;
	Ok(value.to_string())
}

fn parse_flag(var: &str, value: Option<String>) -> Result<bool, ConfigError> {
	let Some(value) = value else {
		return Ok(false);
	};
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(ConfigError::invalid_value(
			var,
			format!("'{other}' is not a boolean"),
		)),
	}
}

fn endpoint_from_table(paths: &ConfigPaths, country: &str) -> Result<Option<String>, ConfigError> {
	let Some(table) = EndpointTable::load(&paths.endpoints_file)? else {
		return Ok(None);
	};
	let endpoint = table.lookup(country).map(str::to_string);
	if let Some(endpoint) = &endpoint {
		debug!(%country, %endpoint, "endpoint selected from table");
		parse_endpoint(&paths.endpoints_file.display().to_string(), endpoint)?;
	}
	Ok(endpoint)
}

/// `VAR_FILE` takes precedence over `VAR`; one trailing newline is stripped.
fn load_secret<F>(lookup: &F, var: &str) -> Result<Option<SecretString>, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");
	if let Some(path) = lookup(&file_var).filter(|v| !v.is_empty()) {
		let path = PathBuf::from(path);
		let content = std::fs::read_to_string(&path)
			.map_err(|source| ConfigError::SecretFile { path, source })?;
		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(Secret::new(value)));
	}

	Ok(lookup(var)
		.filter(|v| !v.trim().is_empty())
		.map(|v| Secret::new(v.trim().to_string())))
}
