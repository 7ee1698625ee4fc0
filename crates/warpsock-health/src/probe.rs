// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::{debug, info, instrument};

use crate::error::{HealthError, Result};
use crate::trace::Trace;

pub const TRACE_URL: &str = "https://www.cloudflare.com/cdn-cgi/trace";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Probes the local SOCKS5 listener by fetching the trace endpoint through it.
#[derive(Debug, Clone)]
pub struct HealthProbe {
	host: String,
	port: u16,
	timeout: Duration,
	url: String,
	require_warp: bool,
}

impl HealthProbe {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			timeout: DEFAULT_TIMEOUT,
			url: TRACE_URL.to_string(),
			require_warp: false,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Fail unless the trace reports `warp=on` or `warp=plus`.
	pub fn require_warp(mut self, require: bool) -> Self {
		self.require_warp = require;
		self
	}

	/// `socks5h` so hostname resolution happens on the far side of the tunnel.
	pub fn proxy_url(&self) -> String {
		format!("socks5h://{}:{}", self.host, self.port)
	}

	fn client(&self) -> Result<Client> {
		let proxy_url = self.proxy_url();
		let proxy = Proxy::all(proxy_url.as_str()).map_err(|source| HealthError::Proxy {
			address: proxy_url,
			source,
		})?;
		Client::builder()
			.proxy(proxy)
			.timeout(self.timeout)
			.user_agent(concat!("warpsock/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(HealthError::Client)
	}

	#[instrument(skip(self), fields(proxy = %self.proxy_url(), url = %self.url))]
	pub async fn check(&self) -> Result<Trace> {
		let request_err = |source| HealthError::Request {
			url: self.url.clone(),
			proxy: self.proxy_url(),
			source,
		};

		let response = self
			.client()?
			.get(&self.url)
			.send()
			.await
			.map_err(request_err)?;

		let status = response.status();
		if !status.is_success() {
			return Err(HealthError::Status {
				url: self.url.clone(),
				status: status.as_u16(),
			});
		}

		let body = response.text().await.map_err(request_err)?;
		let trace = Trace::parse(&body);
		debug!(fields = trace.fields.len(), "parsed trace");

		if self.require_warp && !trace.warp.is_routed() {
			return Err(HealthError::NotWarp { warp: trace.warp });
		}

		info!(
			warp = %trace.warp,
			ip = trace.ip.as_deref().unwrap_or("-"),
			colo = trace.colo.as_deref().unwrap_or("-"),
			loc = trace.loc.as_deref().unwrap_or("-"),
			"proxy healthy"
		);
		Ok(trace)
	}
}
