// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, info, instrument, warn};
use warpsock_config::{RunAs, WarpsockConfig};

use crate::command::ProxyCommand;
use crate::error::{LaunchError, Result};
use crate::privilege;
use crate::tee::{pump, LogWriter, Stream};

/// Signals relayed from the wrapper to the proxy.
pub const FORWARDED_SIGNALS: [(&str, libc::c_int); 4] = [
	("SIGTERM", libc::SIGTERM),
	("SIGINT", libc::SIGINT),
	("SIGHUP", libc::SIGHUP),
	("SIGQUIT", libc::SIGQUIT),
];

/// Runs the proxy as a supervised child process.
#[derive(Debug, Clone)]
pub struct Launcher {
	command: ProxyCommand,
	run_as: Option<RunAs>,
	/// Handed to `run_as` before the child starts.
	owned_paths: Vec<PathBuf>,
	log_file: PathBuf,
}

impl Launcher {
	pub fn new(command: ProxyCommand, log_file: impl Into<PathBuf>) -> Self {
		Self {
			command,
			run_as: None,
			owned_paths: Vec::new(),
			log_file: log_file.into(),
		}
	}

	pub fn from_config(config: &WarpsockConfig) -> Self {
		let paths = &config.paths;
		let mut owned_paths = vec![
			paths.config_dir.clone(),
			paths.account_file.clone(),
			paths.profile_file.clone(),
		];
		owned_paths.extend(config.cache_dir.clone());

		Self::new(ProxyCommand::for_config(config), &paths.log_file)
			.with_run_as(config.run_as)
			.with_owned_paths(owned_paths)
	}

	pub fn with_run_as(mut self, run_as: Option<RunAs>) -> Self {
		self.run_as = run_as;
		self
	}

	pub fn with_owned_paths(mut self, paths: Vec<PathBuf>) -> Self {
		self.owned_paths = paths;
		self
	}

	pub fn command(&self) -> &ProxyCommand {
		&self.command
	}

	pub fn owned_paths(&self) -> &[PathBuf] {
		&self.owned_paths
	}

	/// The child runs in its own process group with stdin detached, so a
	/// terminal's Ctrl-C reaches it only through the wrapper.
	fn spawn_command(&self) -> Command {
		let mut cmd = Command::new(&self.command.program);
		cmd
			.args(self.command.args.iter().map(|a| a.as_os_str()))
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		// SAFETY: setpgid is async-signal-safe.
		unsafe {
			cmd.pre_exec(|| {
				if libc::setpgid(0, 0) != 0 {
					return Err(std::io::Error::last_os_error());
				}
				Ok(())
			});
		}
		privilege::apply(&mut cmd, self.run_as);
		cmd
	}

	/// Spawn the proxy and supervise it until it exits.
	///
	/// Returns the exit code the wrapper should exit with: the child's own
	/// code, or `128 + signal` when it was killed by a signal.
	#[instrument(skip(self), fields(program = %self.command.program_name()))]
	pub async fn run(&self) -> Result<i32> {
		let mut signals = SignalSet::install()?;
		let log = LogWriter::open(&self.log_file).await?;
		privilege::hand_over(&self.owned_paths, self.run_as)?;

		let mut cmd = self.spawn_command();

		info!(cmd = %self.command.display_line(), "starting proxy");
		let program = self.command.program_name();
		let mut child = cmd.spawn().map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				LaunchError::NotInstalled {
					program: program.clone(),
				}
			} else {
				LaunchError::Spawn {
					program: program.clone(),
					source: e,
				}
			}
		})?;

		let mut pumps = Vec::with_capacity(2);
		if let Some(stdout) = child.stdout.take() {
			pumps.push(tokio::spawn(pump(
				stdout,
				tokio::io::stdout(),
				Stream::Stdout,
				log.sender(),
			)));
		}
		if let Some(stderr) = child.stderr.take() {
			pumps.push(tokio::spawn(pump(
				stderr,
				tokio::io::stderr(),
				Stream::Stderr,
				log.sender(),
			)));
		}

		let status = supervise(&mut child, &mut signals)
			.await
			.map_err(|source| LaunchError::Wait {
				program: program.clone(),
				source,
			})?;

		for handle in pumps {
			if let Err(e) = handle.await {
				warn!(error = %e, "output pump task failed");
			}
		}
		log.finish().await;

		let code = exit_code(status);
		info!(code, "proxy exited");
		Ok(code)
	}
}

struct Forwarded {
	name: &'static str,
	signo: libc::c_int,
	stream: Signal,
}

impl Forwarded {
	fn install(name: &'static str, signo: libc::c_int) -> Result<Self> {
		let stream = signal(SignalKind::from_raw(signo))
			.map_err(|source| LaunchError::SignalHandler { signal: name, source })?;
		Ok(Self { name, signo, stream })
	}
}

/// Handlers for every signal in [`FORWARDED_SIGNALS`].
struct SignalSet {
	term: Forwarded,
	int: Forwarded,
	hup: Forwarded,
	quit: Forwarded,
}

impl SignalSet {
	fn install() -> Result<Self> {
		let [term, int, hup, quit] = FORWARDED_SIGNALS;
		Ok(Self {
			term: Forwarded::install(term.0, term.1)?,
			int: Forwarded::install(int.0, int.1)?,
			hup: Forwarded::install(hup.0, hup.1)?,
			quit: Forwarded::install(quit.0, quit.1)?,
		})
	}

	/// Wait for the next forwarded signal.
	async fn recv(&mut self) -> (&'static str, libc::c_int) {
		let fired = tokio::select! {
			_ = self.term.stream.recv() => &self.term,
			_ = self.int.stream.recv() => &self.int,
			_ = self.hup.stream.recv() => &self.hup,
			_ = self.quit.stream.recv() => &self.quit,
		};
		(fired.name, fired.signo)
	}
}

async fn supervise(child: &mut Child, signals: &mut SignalSet) -> std::io::Result<ExitStatus> {
	let pid = child.id();
	loop {
		let (name, signo) = tokio::select! {
			status = child.wait() => return status,
			received = signals.recv() => received,
		};
		match pid {
			Some(pid) => {
				info!(signal = name, pid, "forwarding signal to proxy");
				if let Err(e) = forward_signal(pid, signo) {
					warn!(signal = name, pid, error = %e, "failed to forward signal");
				}
			}
			None => debug!(signal = name, "proxy already reaped; not forwarding"),
		}
	}
}

/// Send `signo` to process `pid`.
pub fn forward_signal(pid: u32, signo: libc::c_int) -> std::io::Result<()> {
	let pid = libc::pid_t::try_from(pid)
		.map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;
	// SAFETY: kill has no memory-safety preconditions.
	if unsafe { libc::kill(pid, signo) } == 0 {
		Ok(())
	} else {
		Err(std::io::Error::last_os_error())
	}
}

/// Shell convention: the child's code, or `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> i32 {
	match (status.code(), status.signal()) {
		(Some(code), _) => code,
		(None, Some(signo)) => 128 + signo,
		(None, None) => 1,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::{Mutex, MutexGuard};
	use std::time::Duration;
	use tempfile::TempDir;

	/// Signals raised at this process reach every live supervisor, so tests
	/// that spawn children take turns.
	static CHILDREN: Mutex<()> = Mutex::new(());

	fn exclusive() -> MutexGuard<'static, ()> {
		CHILDREN.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn sh(script: &str) -> ProxyCommand {
		ProxyCommand::new("sh").arg("-c").arg(script)
	}

	#[tokio::test]
	async fn child_exit_code_is_propagated() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let launcher = Launcher::new(sh("exit 7"), dir.path().join("warpsock.log"));

		assert_eq!(launcher.run().await.unwrap(), 7);
	}

	#[tokio::test]
	async fn clean_exit_is_zero() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let launcher = Launcher::new(sh("true"), dir.path().join("warpsock.log"));

		assert_eq!(launcher.run().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn signal_death_maps_to_128_plus_signal() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let launcher = Launcher::new(sh("kill -KILL $$"), dir.path().join("warpsock.log"));

		assert_eq!(launcher.run().await.unwrap(), 128 + libc::SIGKILL);
	}

	#[tokio::test]
	async fn output_is_teed_to_log_file() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let log_file = dir.path().join("warpsock.log");
		let launcher = Launcher::new(sh("echo listening; echo warning >&2"), &log_file);

		launcher.run().await.unwrap();

		let log = std::fs::read_to_string(&log_file).unwrap();
		let mut lines: Vec<_> = log.lines().collect();
		lines.sort();
		assert_eq!(lines, vec!["listening", "warning"]);
	}

	#[tokio::test]
	async fn missing_binary_is_not_installed() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let launcher = Launcher::new(
			ProxyCommand::new("/nonexistent/wireproxy"),
			dir.path().join("warpsock.log"),
		);

		let err = launcher.run().await.unwrap_err();
		assert!(matches!(err, LaunchError::NotInstalled { .. }));
		assert_eq!(err.exit_code(), 127);
	}

	#[tokio::test]
	async fn forwarded_sigterm_reaches_child() {
		let _guard = exclusive();
		let mut child = Command::new("sh")
			.args(["-c", "trap 'exit 5' TERM; while :; do sleep 0.1; done"])
			.spawn()
			.unwrap();
		tokio::time::sleep(Duration::from_millis(200)).await;

		forward_signal(child.id().unwrap(), libc::SIGTERM).unwrap();
		let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(exit_code(status), 5);
	}

	#[tokio::test]
	async fn supervise_relays_signals_sent_to_wrapper() {
		let _guard = exclusive();
		let mut signals = SignalSet::install().unwrap();
		let mut child = Command::new("sh")
			.args(["-c", "trap 'exit 5' TERM; while :; do sleep 0.1; done"])
			.spawn()
			.unwrap();
		tokio::time::sleep(Duration::from_millis(200)).await;

		// SAFETY: the handler for SIGTERM is installed above.
		assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
		let status = tokio::time::timeout(Duration::from_secs(5), supervise(&mut child, &mut signals))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(exit_code(status), 5);
	}

	#[tokio::test]
	async fn invalid_utf8_output_does_not_kill_child() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let log_file = dir.path().join("warpsock.log");
		let launcher = Launcher::new(
			sh("printf '\\377\\n'; i=0; while [ $i -lt 8192 ]; do echo line $i; i=$((i+1)); done; exit 0"),
			&log_file,
		);

		assert_eq!(launcher.run().await.unwrap(), 0);

		let log = std::fs::read_to_string(&log_file).unwrap();
		assert_eq!(log.lines().count(), 8193);
		assert!(log.starts_with("\u{fffd}\n"));
		assert!(log.ends_with("line 8191\n"));
	}

	#[tokio::test]
	async fn child_leads_its_own_process_group() {
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let launcher = Launcher::new(sh("sleep 5"), dir.path().join("warpsock.log"));

		let mut child = launcher.spawn_command().spawn().unwrap();
		let pid = libc::pid_t::try_from(child.id().unwrap()).unwrap();
		tokio::time::sleep(Duration::from_millis(100)).await;

		// SAFETY: getpgid has no memory-safety preconditions.
		assert_eq!(unsafe { libc::getpgid(pid) }, pid);
		child.kill().await.unwrap();
	}

	#[test]
	fn from_config_owns_profile_files() {
		let mut config = WarpsockConfig::with_defaults("/config");
		config.cache_dir = Some(PathBuf::from("/cache"));

		let launcher = Launcher::from_config(&config);
		assert_eq!(
			launcher.owned_paths(),
			[
				PathBuf::from("/config"),
				PathBuf::from("/config/wgcf-account.toml"),
				PathBuf::from("/config/wgcf-profile.conf"),
				PathBuf::from("/cache"),
			]
		);
	}

	#[tokio::test]
	async fn dropped_child_can_write_config_dir() {
		if !privilege::is_root() {
			return;
		}
		let _guard = exclusive();
		let dir = TempDir::new().unwrap();
		let cache = dir.path().join("warp-plus-cache");
		let launcher = Launcher::new(
			sh(&format!("mkdir {}", cache.display())),
			dir.path().join("warpsock.log"),
		)
		.with_run_as(Some(RunAs {
			uid: 65534,
			gid: 65534,
		}))
		.with_owned_paths(vec![dir.path().to_path_buf()]);

		assert_eq!(launcher.run().await.unwrap(), 0);
		assert!(cache.is_dir());
	}

	#[test]
	fn exit_code_conventions() {
		assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
		assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
		assert_eq!(exit_code(ExitStatus::from_raw(libc::SIGTERM)), 128 + libc::SIGTERM);
	}
}
