// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
	#[error("{program} not found; is it installed and on PATH?")]
	NotInstalled { program: String },

	#[error("failed to spawn {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to {description}: {program} exited with {}: {stderr}", exit_label(.code))]
	CommandFailed {
		program: String,
		description: &'static str,
		code: Option<i32>,
		stderr: String,
	},

	#[error("{description} succeeded but {path} was not created")]
	MissingOutput {
		description: &'static str,
		path: PathBuf,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl ProvisionError {
	/// Process exit code to report for this failure.
	///
	/// External command failures propagate the command's own code.
	pub fn exit_code(&self) -> i32 {
		match self {
			ProvisionError::CommandFailed { code: Some(code), .. } if *code != 0 => *code,
			ProvisionError::NotInstalled { .. } => 127,
			_ => 1,
		}
	}
}

fn exit_label(code: &Option<i32>) -> String {
	match code {
		Some(code) => format!("code {code}"),
		None => "a signal".to_string(),
	}
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
