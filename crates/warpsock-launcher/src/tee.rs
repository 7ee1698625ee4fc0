// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{LaunchError, Result};

const LOG_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
	Stdout,
	Stderr,
}

impl Stream {
	pub fn as_str(&self) -> &'static str {
		match self {
			Stream::Stdout => "stdout",
			Stream::Stderr => "stderr",
		}
	}
}

/// Single writer appending child output lines to the log file.
pub struct LogWriter {
	tx: mpsc::Sender<String>,
	handle: JoinHandle<()>,
}

impl LogWriter {
	pub async fn open(path: &Path) -> Result<Self> {
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path)
			.await
			.map_err(|source| LaunchError::LogFile {
				path: path.to_path_buf(),
				source,
			})?;

		let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
		let handle = tokio::spawn(write_lines(file, path.to_path_buf(), rx));
		Ok(Self { tx, handle })
	}

	pub fn sender(&self) -> mpsc::Sender<String> {
		self.tx.clone()
	}

	/// Flush and stop once every sender has been dropped.
	pub async fn finish(self) {
		drop(self.tx);
		if let Err(e) = self.handle.await {
			warn!(error = %e, "log writer task failed");
		}
	}
}

async fn write_lines(file: File, path: PathBuf, mut rx: mpsc::Receiver<String>) {
	let mut file = BufWriter::new(file);
	let mut failed = false;

	while let Some(line) = rx.recv().await {
		if failed {
			continue;
		}
		if let Err(e) = write_line(&mut file, &line).await {
			warn!(path = %path.display(), error = %e, "log file write failed; continuing without it");
			failed = true;
		}
	}

	if !failed {
		let _ = file.flush().await;
	}
	debug!(path = %path.display(), "log writer finished");
}

async fn write_line(file: &mut BufWriter<File>, line: &str) -> std::io::Result<()> {
	file.write_all(line.as_bytes()).await?;
	file.write_all(b"\n").await?;
	file.flush().await
}

/// Copy `reader` to `out` and the log channel until EOF.
///
/// `out` gets the raw bytes and the log gets each line decoded lossily.
/// Neither invalid UTF-8 nor a closed `out` stops the loop, so the child's
/// pipe stays open while it runs.
pub async fn pump<R, W>(reader: R, mut out: W, stream: Stream, log: mpsc::Sender<String>)
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut reader = BufReader::new(reader);
	let mut buf = Vec::new();
	let mut out_ok = true;
	let mut read_errors = 0u32;

	loop {
		buf.clear();
		match reader.read_until(b'\n', &mut buf).await {
			Ok(0) => break,
			Ok(_) => {
				read_errors = 0;
				if !buf.ends_with(b"\n") {
					buf.push(b'\n');
				}
				if out_ok {
					out_ok = write_raw(&mut out, &buf).await.is_ok();
					if !out_ok {
						debug!(stream = stream.as_str(), "output stream closed; still logging");
					}
				}
				let line = String::from_utf8_lossy(&buf[..buf.len() - 1]);
				let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
				if log.send(line).await.is_err() {
					debug!(stream = stream.as_str(), "log channel closed");
				}
			}
			Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
			Err(e) => {
				read_errors += 1;
				warn!(stream = stream.as_str(), error = %e, "failed to read child output");
				if read_errors >= MAX_READ_ERRORS {
					warn!(stream = stream.as_str(), "child output unreadable; giving up");
					break;
				}
			}
		}
	}
}

/// Consecutive read failures tolerated before the pipe is considered dead.
const MAX_READ_ERRORS: u32 = 8;

async fn write_raw<W: AsyncWrite + Unpin>(out: &mut W, bytes: &[u8]) -> std::io::Result<()> {
	out.write_all(bytes).await?;
	out.flush().await
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn both_streams_end_up_in_log_and_outputs() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("warpsock.log");
		let writer = LogWriter::open(&path).await.unwrap();

		let mut stdout_copy = Vec::new();
		let mut stderr_copy = Vec::new();
		pump(
			&b"one\ntwo\n"[..],
			&mut stdout_copy,
			Stream::Stdout,
			writer.sender(),
		)
		.await;
		pump(&b"oops"[..], &mut stderr_copy, Stream::Stderr, writer.sender()).await;
		writer.finish().await;

		assert_eq!(stdout_copy, b"one\ntwo\n");
		assert_eq!(stderr_copy, b"oops\n");
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\noops\n");
	}

	#[tokio::test]
	async fn invalid_utf8_keeps_streaming() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("warpsock.log");
		let writer = LogWriter::open(&path).await.unwrap();

		let mut copy = Vec::new();
		pump(
			&b"\xff\xfe bad\nafter\r\n"[..],
			&mut copy,
			Stream::Stdout,
			writer.sender(),
		)
		.await;
		writer.finish().await;

		assert_eq!(copy, b"\xff\xfe bad\nafter\r\n");
		assert_eq!(
			std::fs::read_to_string(&path).unwrap(),
			"\u{fffd}\u{fffd} bad\nafter\n"
		);
	}

	#[tokio::test]
	async fn closed_output_still_logs() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("warpsock.log");
		let writer = LogWriter::open(&path).await.unwrap();

		let (closed, reader) = tokio::io::duplex(8);
		drop(reader);
		pump(&b"one\ntwo\n"[..], closed, Stream::Stderr, writer.sender()).await;
		writer.finish().await;

		assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
	}

	#[tokio::test]
	async fn log_file_is_appended() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("warpsock.log");
		std::fs::write(&path, "previous run\n").unwrap();

		let writer = LogWriter::open(&path).await.unwrap();
		pump(&b"next run\n"[..], tokio::io::sink(), Stream::Stdout, writer.sender()).await;
		writer.finish().await;

		assert_eq!(
			std::fs::read_to_string(&path).unwrap(),
			"previous run\nnext run\n"
		);
	}

	#[tokio::test]
	async fn unopenable_log_file_is_an_error() {
		let dir = TempDir::new().unwrap();
		let result = LogWriter::open(&dir.path().join("missing/warpsock.log")).await;
		assert!(matches!(result, Err(LaunchError::LogFile { .. })));
	}
}
