// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;

/// The `warp=` field of a trace response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WarpStatus {
	#[default]
	Off,
	On,
	Plus,
	Other(String),
}

impl WarpStatus {
	pub fn parse(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"off" => WarpStatus::Off,
			"on" => WarpStatus::On,
			"plus" => WarpStatus::Plus,
			other => WarpStatus::Other(other.to_string()),
		}
	}

	/// Traffic went through WARP (free or WARP+).
	pub fn is_routed(&self) -> bool {
		matches!(self, WarpStatus::On | WarpStatus::Plus)
	}
}

impl fmt::Display for WarpStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WarpStatus::Off => f.write_str("off"),
			WarpStatus::On => f.write_str("on"),
			WarpStatus::Plus => f.write_str("plus"),
			WarpStatus::Other(value) => f.write_str(value),
		}
	}
}

/// Parsed body of Cloudflare's `/cdn-cgi/trace`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trace {
	pub warp: WarpStatus,
	pub ip: Option<String>,
	pub colo: Option<String>,
	pub loc: Option<String>,
	/// Every `key=value` pair in the body, including the ones above.
	pub fields: BTreeMap<String, String>,
}

impl Trace {
	/// Lines without `=` are ignored. A missing `warp` key reads as `off`.
	pub fn parse(body: &str) -> Self {
		let fields: BTreeMap<String, String> = body
			.lines()
			.filter_map(|line| line.split_once('='))
			.map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
			.filter(|(k, _)| !k.is_empty())
			.collect();

		let field = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();

		Self {
			warp: field("warp")
				.map(|v| WarpStatus::parse(&v))
				.unwrap_or_default(),
			ip: field("ip"),
			colo: field("colo"),
			loc: field("loc"),
			fields,
		}
	}
}
