// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Launches the SOCKS5 proxy backend as a supervised child.
//!
//! The wrapper stays alive as the parent: it relays termination signals to
//! the proxy, copies the proxy's output to its own stdout/stderr and the log
//! file, and exits with the proxy's exit code.

pub mod command;
pub mod error;
pub mod privilege;
pub mod supervisor;
pub mod tee;

pub use command::{Arg, ProxyCommand};
pub use error::{LaunchError, Result};
pub use privilege::PrivilegeDrop;
pub use supervisor::{exit_code, forward_signal, Launcher, FORWARDED_SIGNALS};
