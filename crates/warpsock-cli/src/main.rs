// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use warpsock_config::WarpsockConfig;

use cli::{Cli, Command};
use error::{exit_code_for, CliError};

async fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
	let code = match cli.command() {
		Command::Health(args) => commands::health::handle_health(&args).await?,
		Command::Provision => {
			let config = WarpsockConfig::from_env().map_err(CliError::from)?;
			commands::provision::handle_provision(&config).await?
		}
		Command::Run => {
			let config = WarpsockConfig::from_env().map_err(CliError::from)?;
			commands::run::handle_run(&config).await?
		}
	};
	Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init(cli.verbose, cli.json_logs);

	let code = match dispatch(&cli).await {
		Ok(code) => code,
		Err(e) => {
			error!("{e}");
			exit_code_for(&e)
		}
	};
	ExitCode::from(u8::try_from(code).unwrap_or(1))
}
