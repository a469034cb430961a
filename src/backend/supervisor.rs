//! Daemon lifecycle supervision
//!
//! Owns the single handle to the background formatting service: lazy
//! start, liveness checks, readiness wait, explicit stop. A per-port pid
//! file lets consecutive CLI runs adopt a daemon that an earlier run
//! started, so the startup cost is actually amortized.

use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use std::{env, fs, thread};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::cli::{AppContext, DaemonArgs, DaemonSubcommand};
use crate::infra::config::{DaemonSection, load_config};

/// Everything the supervisor needs to start and address the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub command: String,
    pub args: Vec<String>,
    pub host: String,
    pub port: u16,
    pub startup_grace: Duration,
    pub probe_readiness: bool,
}

impl DaemonConfig {
    pub fn from_settings(section: &DaemonSection) -> Self {
        Self {
            command: section.command.clone(),
            args: section.args.clone(),
            host: section.host.clone(),
            port: section.port,
            startup_grace: Duration::from_millis(section.startup_grace_ms),
            probe_readiness: section.probe_readiness,
        }
    }
}

/// Reference to the supervised process: either a child this run spawned,
/// or a live pid adopted from the pid file of an earlier run.
#[derive(Debug)]
enum DaemonHandle {
    Spawned(Child),
    Adopted(u32),
}

/// Result of `ensure_running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyRunning,
    JustStarted,
}

pub struct DaemonSupervisor {
    config: DaemonConfig,
    handle: Option<DaemonHandle>,
}

impl DaemonSupervisor {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    /// `http://<host>:<port>/`
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/", self.config.host, self.config.port)
    }

    fn pidfile(&self) -> PathBuf {
        env::temp_dir().join(format!("pup-daemon-{}.pid", self.config.port))
    }

    /// Make sure a daemon is reachable, spawning one if the held handle
    /// (or a pid-file daemon) is dead or absent.
    pub fn ensure_running(&mut self) -> Result<EnsureOutcome> {
        if self.handle_alive() {
            return Ok(EnsureOutcome::AlreadyRunning);
        }

        if let Some(pid) = self.read_pidfile()
            && pid_alive(pid)
        {
            debug!(pid, "adopted running daemon from pid file");
            self.handle = Some(DaemonHandle::Adopted(pid));
            return Ok(EnsureOutcome::AlreadyRunning);
        }

        let command = shellexpand::full(&self.config.command)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| self.config.command.clone());
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| {
                a.replace("{host}", &self.config.host)
                    .replace("{port}", &self.config.port.to_string())
            })
            .collect();

        let child = Command::new(&command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn formatter daemon {command}"))?;

        debug!(pid = child.id(), command = %command, "spawned formatter daemon");
        if let Err(err) = fs::write(self.pidfile(), child.id().to_string()) {
            warn!(%err, "could not record daemon pid file");
        }
        self.handle = Some(DaemonHandle::Spawned(child));

        Ok(EnsureOutcome::JustStarted)
    }

    /// Wait for the daemon to accept connections.
    ///
    /// Polls a TCP connect until the startup grace deadline; with
    /// `probe_readiness` off this degrades to a fixed grace sleep for
    /// daemons whose startup cannot be probed.
    pub fn await_ready(&self) {
        let grace = self.config.startup_grace;
        if !self.config.probe_readiness {
            thread::sleep(grace);
            return;
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let Ok(mut resolved) = addr.to_socket_addrs() else {
            thread::sleep(grace);
            return;
        };
        let Some(addr) = resolved.next() else {
            thread::sleep(grace);
            return;
        };

        let deadline = Instant::now() + grace;
        let step = Duration::from_millis(50);
        loop {
            if TcpStream::connect_timeout(&addr, step).is_ok() {
                return;
            }
            if Instant::now() >= deadline {
                // Never connected within the grace period; proceed anyway
                // and let the request itself report failure.
                return;
            }
            thread::sleep(step);
        }
    }

    /// Terminate the supervised daemon, if any. Idempotent.
    pub fn stop(&mut self) {
        if self.handle.is_none()
            && let Some(pid) = self.read_pidfile()
            && pid_alive(pid)
        {
            self.handle = Some(DaemonHandle::Adopted(pid));
        }

        match self.handle.take() {
            Some(DaemonHandle::Spawned(mut child)) => {
                let _ = child.kill();
                let _ = child.wait();
            }
            Some(DaemonHandle::Adopted(pid)) => terminate_pid(pid),
            None => {}
        }
        let _ = fs::remove_file(self.pidfile());
    }

    /// Pid of the live daemon, if one is reachable.
    pub fn status(&mut self) -> Option<u32> {
        if self.handle_alive() {
            return match &self.handle {
                Some(DaemonHandle::Spawned(child)) => Some(child.id()),
                Some(DaemonHandle::Adopted(pid)) => Some(*pid),
                None => None,
            };
        }
        self.read_pidfile().filter(|pid| pid_alive(*pid))
    }

    fn handle_alive(&mut self) -> bool {
        let alive = match &mut self.handle {
            None => false,
            Some(DaemonHandle::Spawned(child)) => matches!(child.try_wait(), Ok(None)),
            Some(DaemonHandle::Adopted(pid)) => pid_alive(*pid),
        };
        if !alive {
            self.handle = None;
        }
        alive
    }

    fn read_pidfile(&self) -> Option<u32> {
        fs::read_to_string(self.pidfile())
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    // Signal 0 probes existence without touching the process.
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn terminate_pid(pid: u32) {
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate_pid(_pid: u32) {}

/// `pup daemon <start|stop|status>` driver.
pub fn run(args: DaemonArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let mut supervisor = DaemonSupervisor::new(DaemonConfig::from_settings(&config.daemon));

    match args.command {
        DaemonSubcommand::Start => {
            if ctx.dry_run {
                println!("would start daemon at {}", supervisor.endpoint());
                return Ok(());
            }
            match supervisor.ensure_running()? {
                EnsureOutcome::AlreadyRunning => {
                    if !ctx.quiet {
                        println!("daemon already running at {}", supervisor.endpoint());
                    }
                }
                EnsureOutcome::JustStarted => {
                    supervisor.await_ready();
                    if !ctx.quiet {
                        println!("daemon started at {}", supervisor.endpoint());
                    }
                }
            }
        }
        DaemonSubcommand::Stop => {
            if ctx.dry_run {
                println!("would stop daemon at {}", supervisor.endpoint());
                return Ok(());
            }
            supervisor.stop();
            if !ctx.quiet {
                println!("daemon stopped");
            }
        }
        DaemonSubcommand::Status => match supervisor.status() {
            Some(pid) => println!("daemon running at {} (pid {pid})", supervisor.endpoint()),
            None => {
                println!("daemon not running");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleeper_config(port: u16) -> DaemonConfig {
        // A crashed earlier test run may have leaked a pid file.
        let _ = fs::remove_file(env::temp_dir().join(format!("pup-daemon-{port}.pid")));
        DaemonConfig {
            command: "sleep".to_string(),
            args: vec!["30".to_string()],
            host: "127.0.0.1".to_string(),
            port,
            startup_grace: Duration::ZERO,
            probe_readiness: false,
        }
    }

    #[test]
    #[cfg(unix)]
    fn ensure_running_reuses_live_daemon() {
        let mut sup = DaemonSupervisor::new(sleeper_config(49377));
        assert_eq!(sup.ensure_running().unwrap(), EnsureOutcome::JustStarted);
        assert_eq!(sup.ensure_running().unwrap(), EnsureOutcome::AlreadyRunning);
        assert!(sup.status().is_some());

        sup.stop();
        assert!(sup.status().is_none());
        // Idempotent with nothing running.
        sup.stop();
    }

    #[test]
    #[cfg(unix)]
    fn pid_file_adoption_across_supervisors() {
        let config = sleeper_config(49378);
        let mut first = DaemonSupervisor::new(config.clone());
        assert_eq!(first.ensure_running().unwrap(), EnsureOutcome::JustStarted);

        let mut second = DaemonSupervisor::new(config);
        assert_eq!(
            second.ensure_running().unwrap(),
            EnsureOutcome::AlreadyRunning
        );

        first.stop();
        assert!(second.status().is_none());
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let _ = fs::remove_file(env::temp_dir().join("pup-daemon-49379.pid"));
        let mut sup = DaemonSupervisor::new(DaemonConfig {
            command: "/nonexistent/patchup-daemon".to_string(),
            args: vec![],
            host: "127.0.0.1".to_string(),
            port: 49379,
            startup_grace: Duration::ZERO,
            probe_readiness: false,
        });
        assert!(sup.ensure_running().is_err());
    }

    #[test]
    fn endpoint_formatting() {
        let sup = DaemonSupervisor::new(sleeper_config(49380));
        assert_eq!(sup.endpoint(), "http://127.0.0.1:49380/");
    }
}
