//! Host-side collaborator implementations.
//!
//! The decision core only knows the traits in `ponto_core::traits`.
//! Here they are bound to the host environment: external commands for
//! the timesheet interactions (the browser automation lives behind
//! those commands) and `systemd-run` for one-shot triggers.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use ponto_core::config::ExternalConfig;
use ponto_core::error::{PontoError, Result};
use ponto_core::traits::{ActionExecutor, DownstreamSync, EntryObserver, OsScheduler};
use ponto_core::types::{ActionKind, DailySchedule};

/// Run a shell command with a timeout, returning trimmed stdout.
async fn run_command(cmd: &str, stdin: Option<&str>, timeout: Duration) -> Result<String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PontoError::Action(format!("spawn '{cmd}': {e}")))?;

    if let (Some(input), Some(mut handle)) = (stdin, child.stdin.take()) {
        handle
            .write_all(input.as_bytes())
            .await
            .map_err(|e| PontoError::Action(format!("write stdin: {e}")))?;
        drop(handle);
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| PontoError::Action(format!("'{cmd}' timed out")))?
        .map_err(|e| PontoError::Action(format!("wait '{cmd}': {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(PontoError::Action(format!(
            "'{cmd}' exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

/// Clock signals via configured external commands.
pub struct CommandExecutor {
    begin_cmd: Option<String>,
    end_cmd: Option<String>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(config: &ExternalConfig) -> Self {
        Self {
            begin_cmd: config.begin_cmd.clone(),
            end_cmd: config.end_cmd.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl ActionExecutor for CommandExecutor {
    async fn perform(&self, kind: ActionKind) -> Result<()> {
        let cmd = match kind {
            ActionKind::Begin => self.begin_cmd.as_deref(),
            ActionKind::End => self.end_cmd.as_deref(),
        };
        let Some(cmd) = cmd else {
            return Err(PontoError::Action(format!(
                "no command configured for '{kind}' (external.{}_cmd)",
                kind.as_str()
            )));
        };
        run_command(cmd, None, self.timeout).await.map(|_| ())
    }
}

/// Reads the real entry time from a command's stdout. Empty output
/// means no entry registered yet.
pub struct CommandObserver {
    cmd: Option<String>,
    timeout: Duration,
}

impl CommandObserver {
    pub fn new(config: &ExternalConfig) -> Self {
        Self {
            cmd: config.observe_cmd.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl EntryObserver for CommandObserver {
    async fn fetch_real_entry(&self, _date: NaiveDate) -> Result<Option<NaiveTime>> {
        let Some(cmd) = self.cmd.as_deref() else {
            return Err(PontoError::Observer(
                "external.observe_cmd not configured".into(),
            ));
        };
        let out = run_command(cmd, None, self.timeout)
            .await
            .map_err(|e| PontoError::Observer(e.to_string()))?;
        let Some(line) = out.lines().next().map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(None);
        };
        let parsed = NaiveTime::parse_from_str(line, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(line, "%H:%M:%S"))
            .map_err(|e| PontoError::Observer(format!("unparseable entry time '{line}': {e}")))?;
        Ok(Some(parsed))
    }
}

/// Pushes the day's schedule to a command, JSON on stdin.
pub struct CommandSync {
    cmd: Option<String>,
    timeout: Duration,
}

impl CommandSync {
    pub fn new(config: &ExternalConfig) -> Self {
        Self {
            cmd: config.sync_cmd.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl DownstreamSync for CommandSync {
    async fn push(&self, _date: NaiveDate, schedule: &DailySchedule) -> Result<()> {
        let Some(cmd) = self.cmd.as_deref() else {
            return Err(PontoError::Sync("external.sync_cmd not configured".into()));
        };
        let json = serde_json::to_string(schedule)
            .map_err(|e| PontoError::Sync(format!("serialize schedule: {e}")))?;
        run_command(cmd, Some(&json), self.timeout)
            .await
            .map_err(|e| PontoError::Sync(e.to_string()))?;
        Ok(())
    }
}

/// One-shot triggers via transient systemd timer units.
///
/// Elevated mode registers a system-level unit (fires with the session
/// locked); the unprivileged fallback uses `systemd-run --user`.
pub struct SystemdRunScheduler {
    /// Binary to re-invoke when the timer fires.
    exe: PathBuf,
}

impl SystemdRunScheduler {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }
}

#[async_trait]
impl OsScheduler for SystemdRunScheduler {
    async fn register_once(&self, task: &str, when_today: NaiveTime, elevated: bool) -> Result<()> {
        let today = Local::now().date_naive();
        let calendar = format!(
            "{today} {:02}:{:02}:00",
            when_today.hour(),
            when_today.minute()
        );

        let mut cmd = Command::new("systemd-run");
        if !elevated {
            cmd.arg("--user");
        }
        cmd.arg(format!("--unit={task}"))
            .arg("--collect")
            .arg(format!("--on-calendar={calendar}"))
            .arg(&self.exe)
            .arg("run");

        let output = tokio::time::timeout(Duration::from_secs(30), cmd.output())
            .await
            .map_err(|_| PontoError::Scheduling("systemd-run timed out".into()))?
            .map_err(|e| PontoError::Scheduling(format!("systemd-run: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PontoError::Scheduling(format!(
                "systemd-run exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    async fn cancel(&self, task: &str) -> Result<()> {
        // Stop both variants; a missing unit is not an error.
        for user in [false, true] {
            let mut cmd = Command::new("systemctl");
            if user {
                cmd.arg("--user");
            }
            cmd.arg("stop").arg(format!("{task}.timer"));
            let _ = tokio::time::timeout(Duration::from_secs(10), cmd.output()).await;
        }
        Ok(())
    }
}
