// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Idempotent profile transforms.

use tracing::{debug, info};

use crate::error::{ProfileError, Result};
use crate::model::{Profile, Section};
use crate::{INTERFACE_SECTION, PEER_SECTION, SOCKS5_SECTION};

const ENDPOINT_KEY: &str = "Endpoint";
const DNS_KEY: &str = "DNS";
const BIND_ADDRESS_KEY: &str = "BindAddress";

/// What to enforce on a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
	/// Replaces the first peer's `Endpoint` when set.
	pub endpoint: Option<String>,
	/// Written to `[Interface] DNS` when set.
	pub dns: Option<String>,
	/// `BindAddress` of the `[Socks5]` section.
	pub bind_address: String,
}

impl PatchOptions {
	pub fn new(bind_address: impl Into<String>) -> Self {
		Self {
			endpoint: None,
			dns: None,
			bind_address: bind_address.into(),
		}
	}

	pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
		self.endpoint = endpoint;
		self
	}

	pub fn with_dns(mut self, dns: Option<String>) -> Self {
		self.dns = dns;
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Socks5Change {
	#[default]
	Unchanged,
	/// No section existed; one was appended.
	Appended,
	/// A section existed with a different (or no) bind address.
	Updated { previous: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchReport {
	pub endpoint_changed: bool,
	pub dns_changed: bool,
	pub socks5: Socks5Change,
	pub duplicate_socks5_removed: usize,
}

impl PatchReport {
	pub fn changed(&self) -> bool {
		self.endpoint_changed
			|| self.dns_changed
			|| self.socks5 != Socks5Change::Unchanged
			|| self.duplicate_socks5_removed > 0
	}
}

impl Profile {
	/// Point the first `[Peer]` at `endpoint`, leaving exactly one `Endpoint` line there.
	pub fn set_endpoint(&mut self, endpoint: &str) -> Result<bool> {
		let peer = self
			.section_mut(PEER_SECTION)
			.ok_or(ProfileError::MissingSection(PEER_SECTION))?;
		let previous = peer.get(ENDPOINT_KEY).map(str::to_string);
		let changed = peer.set(ENDPOINT_KEY, endpoint);
		if changed {
			info!(previous = previous.as_deref().unwrap_or("<none>"), %endpoint, "endpoint overridden");
		}
		Ok(changed)
	}

	/// Drop every `Endpoint` line of the first `[Peer]` but the first.
	///
	/// A profile without a `[Peer]` is left alone.
	pub fn dedupe_endpoint(&mut self) -> bool {
		let Some(peer) = self.section_mut(PEER_SECTION) else {
			return false;
		};
		if peer.count(ENDPOINT_KEY) < 2 {
			return false;
		}
		let Some(first) = peer.get(ENDPOINT_KEY).map(str::to_string) else {
			return false;
		};
		let changed = peer.set(ENDPOINT_KEY, &first);
		if changed {
			info!(endpoint = %first, "duplicate endpoint lines removed");
		}
		changed
	}

	pub fn set_interface_dns(&mut self, dns: &str) -> Result<bool> {
		let interface = self
			.section_mut(INTERFACE_SECTION)
			.ok_or(ProfileError::MissingSection(INTERFACE_SECTION))?;
		let changed = interface.set(DNS_KEY, dns);
		if changed {
			debug!(%dns, "interface DNS updated");
		}
		Ok(changed)
	}

	/// Guarantee exactly one `[Socks5]` section bound to `bind_address`.
	///
	/// Returns the change applied and the number of extra sections dropped.
	pub fn ensure_socks5(&mut self, bind_address: &str) -> (Socks5Change, usize) {
		let removed = self.remove_duplicate_sections(SOCKS5_SECTION);

		let change = match self.section_mut(SOCKS5_SECTION) {
			Some(section) => {
				let previous = section.get(BIND_ADDRESS_KEY).map(str::to_string);
				if section.set(BIND_ADDRESS_KEY, bind_address) {
					info!(
						previous = previous.as_deref().unwrap_or("<none>"),
						%bind_address,
						"socks5 bind address updated"
					);
					Socks5Change::Updated { previous }
				} else {
					Socks5Change::Unchanged
				}
			}
			None => {
				let mut section = Section::new(SOCKS5_SECTION);
				section.set(BIND_ADDRESS_KEY, bind_address);
				self.append_section(section);
				info!(%bind_address, "socks5 section appended");
				Socks5Change::Appended
			}
		};

		(change, removed)
	}

	/// Apply every transform in `options`, in order: endpoint, DNS, socks5.
	pub fn apply(&mut self, options: &PatchOptions) -> Result<PatchReport> {
		let mut report = PatchReport::default();

		report.endpoint_changed = match &options.endpoint {
			Some(endpoint) => self.set_endpoint(endpoint)?,
			None => self.dedupe_endpoint(),
		};
		if let Some(dns) = &options.dns {
			report.dns_changed = self.set_interface_dns(dns)?;
		}

		let (socks5, removed) = self.ensure_socks5(&options.bind_address);
		report.socks5 = socks5;
		report.duplicate_socks5_removed = removed;

		Ok(report)
	}
}
