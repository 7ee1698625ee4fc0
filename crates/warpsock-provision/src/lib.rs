// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lazy WARP provisioning through `wgcf`.
//!
//! Two create-if-absent steps, run in order:
//!
//! 1. account: `wgcf register --accept-tos --config <account>`, followed by
//!    `wgcf update` when a WARP+ license key is configured
//! 2. profile: `wgcf generate --config <account> --profile <profile>`
//!
//! Each step is skipped when its file already exists, so running the
//! provisioner on every container start never re-registers. Commands go
//! through the [`CommandRunner`] seam; [`TokioCommandRunner`] is the real one.

pub mod error;
pub mod provisioner;
pub mod runner;

pub use error::{ProvisionError, Result};
pub use provisioner::{Outcome, ProvisionReport, Provisioner};
pub use runner::{CommandOutput, CommandRunner, Invocation, TokioCommandRunner};
