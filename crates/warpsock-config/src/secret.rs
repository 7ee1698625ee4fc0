// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the WARP+ license key.
//!
//! `Debug` and `Display` always print [`REDACTED`], the value is zeroized on
//! drop, and callers must call [`Secret::expose`] to read it.
//!
//! ```
//! use warpsock_config::Secret;
//!
//! let key = Secret::new("abcd-1234".to_string());
//! assert_eq!(format!("{key}"), "[REDACTED]");
//! assert_eq!(key.expose(), "abcd-1234");
//! ```
//!
//! # Structured Logging
//!
//! Passing a secret as a tracing field goes through `Display` or `Debug`, so
//! the key never reaches the log:
//!
//! ```
//! use tracing::info;
//! use warpsock_config::Secret;
//!
//! let key = Secret::new("abcd-1234".to_string());
//! info!(license = %key, "license configured");
//! info!(?key, "debug format is redacted too");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value that only [`Secret::expose`] reveals.
///
/// # Example
///
/// ```
/// use warpsock_config::Secret;
///
/// let key = Secret::new("abcd-1234".to_string());
///
/// assert_eq!(format!("{key:?}"), "Secret(\"[REDACTED]\")");
/// assert_eq!(key.to_string(), "[REDACTED]");
/// assert_eq!(key.expose(), "abcd-1234");
/// ```
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// License keys and other secret strings.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	/// Wrap `inner`; it is zeroized when the wrapper drops.
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	///
	/// The only way to read the key.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}
