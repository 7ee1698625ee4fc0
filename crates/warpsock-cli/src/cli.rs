// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use warpsock_config::env_vars;

use crate::commands::health::HealthArgs;

/// Provision a Cloudflare WARP profile and run a SOCKS5 proxy on top of it.
///
/// Configuration comes from the environment (CONFIG_DIR, PROXY_BACKEND,
/// SOCKS5_PORT, ENDPOINT, ...).
#[derive(Debug, Parser)]
#[command(name = "warpsock", version, about)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Option<Command>,

	/// Debug logging
	#[arg(
		short,
		long,
		global = true,
		env = env_vars::VERBOSE,
		action = ArgAction::SetTrue,
		value_parser = BoolishValueParser::new()
	)]
	pub verbose: bool,

	/// Emit logs as JSON lines
	#[arg(long, global = true)]
	pub json_logs: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
	/// Provision, patch and launch the proxy (default)
	Run,
	/// Provision and patch the profile without launching
	Provision,
	/// Check that the SOCKS5 listener forwards traffic
	Health(HealthArgs),
}

impl Cli {
	pub fn command(&self) -> Command {
		self.command.clone().unwrap_or(Command::Run)
	}
}
