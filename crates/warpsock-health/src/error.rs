// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::trace::WarpStatus;

#[derive(Debug, Error)]
pub enum HealthError {
	#[error("invalid proxy address {address}: {source}")]
	Proxy {
		address: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error("request to {url} through {proxy} failed: {source}")]
	Request {
		url: String,
		proxy: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("{url} returned HTTP {status}")]
	Status { url: String, status: u16 },

	#[error("traffic is not routed through WARP (warp={warp})")]
	NotWarp { warp: WarpStatus },
}

pub type Result<T> = std::result::Result<T, HealthError>;
