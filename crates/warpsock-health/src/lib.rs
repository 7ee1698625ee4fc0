// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Container health check for the SOCKS5 listener.

pub mod error;
pub mod probe;
pub mod trace;

pub use error::{HealthError, Result};
pub use probe::{HealthProbe, DEFAULT_HOST, DEFAULT_TIMEOUT, TRACE_URL};
pub use trace::{Trace, WarpStatus};
