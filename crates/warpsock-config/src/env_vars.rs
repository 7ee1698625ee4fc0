// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable names read by warpsock, and their defaults.

/// Base directory holding the account file, the profile and the log file.
pub const CONFIG_DIR: &str = "CONFIG_DIR";
/// `wireproxy` or `warp-plus`.
pub const PROXY_BACKEND: &str = "PROXY_BACKEND";

/// SOCKS5 listener
pub const SOCKS5_PORT: &str = "SOCKS5_PORT";
pub const DNS: &str = "DNS";

/// WARP peer selection
pub const ENDPOINT: &str = "ENDPOINT";
pub const COUNTRY: &str = "COUNTRY";

/// WARP+ license key. `WARP_LICENSE_KEY_FILE` is honoured as well.
pub const WARP_LICENSE_KEY: &str = "WARP_LICENSE_KEY";

/// warp-plus switches
pub const WARP_SCAN: &str = "WARP_SCAN";
pub const WARP_CFON: &str = "WARP_CFON";
pub const CACHE_DIR: &str = "CACHE_DIR";

/// Output
pub const VERBOSE: &str = "VERBOSE";
pub const LOG_FILE: &str = "LOG_FILE";

/// Privilege drop for the proxy process
pub const PUID: &str = "PUID";
pub const PGID: &str = "PGID";

/// Binary overrides
pub const WGCF_BIN: &str = "WGCF_BIN";
pub const WIREPROXY_BIN: &str = "WIREPROXY_BIN";
pub const WARP_PLUS_BIN: &str = "WARP_PLUS_BIN";

pub const DEFAULT_CONFIG_DIR: &str = "/config";
pub const DEFAULT_SOCKS5_PORT: u16 = 1080;
pub const DEFAULT_DNS: &str = "1.1.1.1";
pub const DEFAULT_COUNTRY: &str = "US";

/// Get all environment variable names for documentation/validation
pub fn all_env_vars() -> &'static [&'static str] {
	&[
		CONFIG_DIR,
		PROXY_BACKEND,
		SOCKS5_PORT,
		DNS,
		ENDPOINT,
		COUNTRY,
		WARP_LICENSE_KEY,
		WARP_SCAN,
		WARP_CFON,
		CACHE_DIR,
		VERBOSE,
		LOG_FILE,
		PUID,
		PGID,
		WGCF_BIN,
		WIREPROXY_BIN,
		WARP_PLUS_BIN,
	]
}
