// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
	#[error("{program} not found; is it installed and on PATH?")]
	NotInstalled { program: String },

	#[error("failed to spawn {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to open log file {path}: {source}")]
	LogFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to hand {path} to uid {uid} gid {gid}: {source}")]
	Chown {
		path: PathBuf,
		uid: u32,
		gid: u32,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to install {signal} handler: {source}")]
	SignalHandler {
		signal: &'static str,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to wait for {program}: {source}")]
	Wait {
		program: String,
		#[source]
		source: std::io::Error,
	},
}

impl LaunchError {
	pub fn exit_code(&self) -> i32 {
		match self {
			LaunchError::NotInstalled { .. } => 127,
			_ => 1,
		}
	}
}

pub type Result<T> = std::result::Result<T, LaunchError>;
