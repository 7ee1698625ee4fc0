// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard profile handling for warpsock.
//!
//! The profile written by `wgcf generate` is an INI-like file:
//!
//! ```text
//! [Interface]
//! PrivateKey = ...
//! Address = 172.16.0.2/32
//! DNS = 1.1.1.1
//!
//! [Peer]
//! PublicKey = ...
//! Endpoint = engage.cloudflareclient.com:2408
//! ```
//!
//! `wireproxy` additionally needs a `[Socks5]` section with a `BindAddress`.
//! [`Profile`] is a typed, format-preserving model of that file: lines we do
//! not modify are rendered back byte-for-byte, so patching an already-patched
//! profile is a no-op on disk.

pub mod error;
pub mod file;
pub mod model;
pub mod patch;

pub use error::{ProfileError, Result};
pub use file::{load_profile, patch_profile_file, write_profile_atomically};
pub use model::{Entry, Line, Profile, Section};
pub use patch::{PatchOptions, PatchReport, Socks5Change};

pub const INTERFACE_SECTION: &str = "Interface";
pub const PEER_SECTION: &str = "Peer";
pub const SOCKS5_SECTION: &str = "Socks5";
