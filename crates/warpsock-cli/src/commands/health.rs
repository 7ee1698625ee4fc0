// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use clap::Args;
use tracing::instrument;
use warpsock_config::env_vars;
use warpsock_health::{HealthProbe, Trace, DEFAULT_HOST};

use crate::error::Result;

#[derive(Debug, Clone, Args)]
pub struct HealthArgs {
	/// Address of the SOCKS5 listener
	#[arg(long, default_value = DEFAULT_HOST)]
	pub host: String,

	/// SOCKS5 port (defaults to SOCKS5_PORT, then 1080)
	#[arg(long, env = env_vars::SOCKS5_PORT)]
	pub port: Option<u16>,

	/// Request timeout in seconds
	#[arg(long, default_value = "15")]
	pub timeout: u64,

	/// Fail unless traffic is routed through WARP
	#[arg(long)]
	pub require_warp: bool,
}

impl HealthArgs {
	pub fn probe(&self) -> HealthProbe {
		HealthProbe::new(
			self.host.clone(),
			self.port.unwrap_or(env_vars::DEFAULT_SOCKS5_PORT),
		)
		.with_timeout(Duration::from_secs(self.timeout))
		.require_warp(self.require_warp)
	}
}

pub fn summary(trace: &Trace) -> String {
	format!(
		"warp={} ip={} colo={} loc={}",
		trace.warp,
		trace.ip.as_deref().unwrap_or("-"),
		trace.colo.as_deref().unwrap_or("-"),
		trace.loc.as_deref().unwrap_or("-"),
	)
}

#[instrument(skip(args), fields(host = %args.host, port = ?args.port))]
pub async fn handle_health(args: &HealthArgs) -> Result<i32> {
	let trace = args.probe().check().await?;
	println!("{}", summary(&trace));
	Ok(0)
}
