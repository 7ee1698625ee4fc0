// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info, warn};
use warpsock_config::RunAs;

use crate::error::{LaunchError, Result};

/// Whether a privilege drop was applied to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeDrop {
	NotRequested,
	Applied(RunAs),
	/// Requested, but the wrapper does not run as root.
	Skipped(RunAs),
}

pub fn is_root() -> bool {
	// SAFETY: geteuid has no preconditions and cannot fail.
	unsafe { libc::geteuid() == 0 }
}

/// Arrange for the child to run as `run_as` with no supplementary groups.
pub fn apply(cmd: &mut Command, run_as: Option<RunAs>) -> PrivilegeDrop {
	apply_as(cmd, run_as, is_root())
}

fn apply_as(cmd: &mut Command, run_as: Option<RunAs>, root: bool) -> PrivilegeDrop {
	let Some(run_as) = run_as else {
		return PrivilegeDrop::NotRequested;
	};

	if !root {
		warn!(
			uid = run_as.uid,
			gid = run_as.gid,
			"not running as root; ignoring PUID/PGID"
		);
		return PrivilegeDrop::Skipped(run_as);
	}

	let RunAs { uid, gid } = run_as;
	// Groups must be dropped before the uid changes.
	// SAFETY: only async-signal-safe libc calls run between fork and exec.
	unsafe {
		cmd.pre_exec(move || {
			if libc::setgroups(0, std::ptr::null()) != 0 {
				return Err(std::io::Error::last_os_error());
			}
			if libc::setgid(gid) != 0 {
				return Err(std::io::Error::last_os_error());
			}
			if libc::setuid(uid) != 0 {
				return Err(std::io::Error::last_os_error());
			}
			Ok(())
		});
	}

	info!(uid, gid, "proxy will run with dropped privileges");
	PrivilegeDrop::Applied(run_as)
}

/// Chown every existing path to `run_as` so the dropped child can read its
/// profile and write next to it. Missing paths are skipped.
///
/// Does nothing unless running as root with `run_as` set. Returns how many
/// paths changed hands.
pub fn hand_over(paths: &[PathBuf], run_as: Option<RunAs>) -> Result<usize> {
	hand_over_as(paths, run_as, is_root())
}

fn hand_over_as(paths: &[PathBuf], run_as: Option<RunAs>, root: bool) -> Result<usize> {
	let Some(RunAs { uid, gid }) = run_as else {
		return Ok(0);
	};
	if !root {
		return Ok(0);
	}

	let mut handed = 0;
	for path in paths {
		if !path.exists() {
			debug!(path = %path.display(), "not present; nothing to hand over");
			continue;
		}
		std::os::unix::fs::chown(path, Some(uid), Some(gid)).map_err(|source| LaunchError::Chown {
			path: path.clone(),
			uid,
			gid,
			source,
		})?;
		debug!(path = %path.display(), uid, gid, "handed over");
		handed += 1;
	}
	info!(handed, uid, gid, "proxy files handed to PUID/PGID");
	Ok(handed)
}
