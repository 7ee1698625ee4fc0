// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{ProfileError, Result};
use crate::model::Profile;
use crate::patch::{PatchOptions, PatchReport};

pub fn load_profile(path: &Path) -> Result<(Profile, String)> {
	let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	Ok((Profile::parse(&content), content))
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// Readers never observe a half-written profile. The original file's
/// permissions are carried over when it exists.
pub fn write_profile_atomically(path: &Path, content: &str) -> Result<()> {
	let write_err = |source| ProfileError::Write {
		path: path.to_path_buf(),
		source,
	};

	let dir = path
		.parent()
		.filter(|p| !p.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));

	let mut tmp = tempfile::Builder::new()
		.prefix(".wgcf-profile")
		.tempfile_in(dir)
		.map_err(write_err)?;
	tmp.write_all(content.as_bytes()).map_err(write_err)?;
	tmp.as_file().sync_all().map_err(write_err)?;

	if let Ok(metadata) = std::fs::metadata(path) {
		tmp
			.as_file()
			.set_permissions(metadata.permissions())
			.map_err(write_err)?;
	}

	tmp.persist(path).map_err(|e| write_err(e.error))?;
	Ok(())
}

/// Load, patch and write back the profile at `path`.
///
/// The file is only rewritten when the rendered bytes differ.
#[instrument(skip(options), fields(path = %path.display()))]
pub fn patch_profile_file(path: &Path, options: &PatchOptions) -> Result<PatchReport> {
	let (mut profile, original) = load_profile(path)?;
	let report = profile.apply(options)?;

	let rendered = profile.render();
	if rendered == original {
		debug!("profile already up to date");
		return Ok(report);
	}

	write_profile_atomically(path, &rendered)?;
	debug!(bytes = rendered.len(), "profile rewritten");
	Ok(report)
}
