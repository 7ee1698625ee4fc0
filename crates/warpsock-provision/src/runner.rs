// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};
use warpsock_config::SecretString;

use crate::error::{ProvisionError, Result};

/// One external command to run to completion.
#[derive(Debug, Clone)]
pub struct Invocation {
	pub program: PathBuf,
	pub args: Vec<String>,
	pub current_dir: Option<PathBuf>,
	/// Environment passed to the child only. Values never appear in logs.
	pub secret_env: Vec<(&'static str, SecretString)>,
	/// Short verb phrase used in error messages, e.g. "register WARP account".
	pub description: &'static str,
}

impl Invocation {
	pub fn new(program: impl Into<PathBuf>, description: &'static str) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			current_dir: None,
			secret_env: Vec::new(),
			description,
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.current_dir = Some(dir.into());
		self
	}

	pub fn secret_env(mut self, key: &'static str, value: SecretString) -> Self {
		self.secret_env.push((key, value));
		self
	}

	pub fn program_name(&self) -> String {
		self.program.display().to_string()
	}

	/// Command line for logging. Secret env values are not part of it.
	pub fn display_line(&self) -> String {
		std::iter::once(self.program_name())
			.chain(self.args.iter().cloned())
			.collect::<Vec<_>>()
			.join(" ")
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
	pub stdout: String,
	pub stderr: String,
}

/// Runs external commands and reports their output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
	/// Run `invocation` to completion. A non-zero exit status is an error.
	async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
	async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
		let mut cmd = Command::new(&invocation.program);
		cmd.args(&invocation.args).kill_on_drop(true);
		if let Some(dir) = &invocation.current_dir {
			cmd.current_dir(dir);
		}
		for (key, value) in &invocation.secret_env {
			cmd.env(key, value.expose());
		}

		trace!(
				cmd = %invocation.display_line(),
				secret_env = invocation.secret_env.len(),
				"running command"
		);

		let program = invocation.program_name();
		let output = cmd.output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(program = %program, "command not found in PATH");
				ProvisionError::NotInstalled {
					program: program.clone(),
				}
			} else {
				ProvisionError::Spawn {
					program: program.clone(),
					source: e,
				}
			}
		})?;

		let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
		let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
		if !stdout.is_empty() {
			debug!(program = %program, "{stdout}");
		}
		if !stderr.is_empty() {
			debug!(program = %program, stream = "stderr", "{stderr}");
		}

		if output.status.success() {
			Ok(CommandOutput { stdout, stderr })
		} else {
			Err(ProvisionError::CommandFailed {
				program,
				description: invocation.description,
				code: output.status.code(),
				stderr,
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_line_joins_program_and_args() {
		let inv = Invocation::new("wgcf", "register WARP account")
			.args(["register", "--accept-tos"])
			.secret_env("WGCF_LICENSE_KEY", SecretString::new("abc-123".to_string()));

		assert_eq!(inv.display_line(), "wgcf register --accept-tos");
		assert!(!format!("{inv:?}").contains("abc-123"));
	}

	#[tokio::test]
	async fn missing_program_is_not_installed() {
		let inv = Invocation::new("/nonexistent/warpsock-test-binary", "run test");
		let err = TokioCommandRunner::new().run(&inv).await.unwrap_err();

		assert!(matches!(err, ProvisionError::NotInstalled { .. }));
		assert_eq!(err.exit_code(), 127);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn nonzero_exit_propagates_code_and_stderr() {
		let inv = Invocation::new("sh", "run test").args(["-c", "echo boom >&2; exit 3"]);
		let err = TokioCommandRunner::new().run(&inv).await.unwrap_err();

		match &err {
			ProvisionError::CommandFailed { code, stderr, .. } => {
				assert_eq!(*code, Some(3));
				assert_eq!(stderr, "boom");
			}
			other => panic!("unexpected error: {other:?}"),
		}
		assert_eq!(err.exit_code(), 3);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn captures_stdout_and_honours_env_and_cwd() {
		let dir = tempfile::TempDir::new().unwrap();
		let inv = Invocation::new("sh", "run test")
			.args(["-c", "printf '%s %s' \"$WARPSOCK_TEST_SECRET\" \"$(basename \"$(pwd)\")\""])
			.current_dir(dir.path())
			.secret_env("WARPSOCK_TEST_SECRET", SecretString::new("s3cret".to_string()));

		let output = TokioCommandRunner::new().run(&inv).await.unwrap();
		let dir_name = dir.path().file_name().unwrap().to_string_lossy().to_string();
		assert_eq!(output.stdout, format!("s3cret {dir_name}"));
	}
}
