//! Ponto configuration system.
//!
//! TOML file at `~/.ponto/config.toml`. Every field has a default so a
//! missing file yields a working config; `validate` is called by the
//! orchestrator before anything external is attempted.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::clock::hm;
use crate::error::{PontoError, Result};
use crate::types::ActionWindow;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PontoConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub windows: WindowsConfig,
    #[serde(default)]
    pub randomization: RandomizationConfig,
    #[serde(default)]
    pub work_hours: WorkHoursConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub external: ExternalConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl PontoConfig {
    /// Load config from the default path (~/.ponto/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PontoError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PontoError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PontoError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Ponto home directory (~/.ponto).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ponto")
    }

    /// Reject configs the orchestrator cannot act on safely. Called
    /// before any external call.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("entry", &self.windows.entry),
            ("exit_verification", &self.windows.exit_verification),
        ] {
            if w.earliest > w.latest {
                return Err(PontoError::Config(format!(
                    "{name} window is inverted ({w})"
                )));
            }
        }
        if self.randomization.entry_earliest > self.randomization.entry_latest {
            return Err(PontoError::Config("entry randomization range is inverted".into()));
        }
        if self.randomization.lunch_earliest > self.randomization.lunch_latest {
            return Err(PontoError::Config("lunch randomization range is inverted".into()));
        }
        if self.work_hours.work_minutes == 0 || self.work_hours.lunch_minutes == 0 {
            return Err(PontoError::Config("work/lunch minutes must be non-zero".into()));
        }
        Ok(())
    }
}

/// Global switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Master switch. When off, invocations report and do nothing.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// One-day override: skip all actions today (vacation day, manual
    /// clock-in, ...). Remember to flip it back.
    #[serde(default)]
    pub skip_today: bool,
}

fn bool_true() -> bool {
    true
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_today: false,
        }
    }
}

/// Permitted clock ranges for attempting each gated action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowsConfig {
    #[serde(default = "default_entry_window")]
    pub entry: ActionWindow,
    #[serde(default = "default_exit_window")]
    pub exit_verification: ActionWindow,
}

fn default_entry_window() -> ActionWindow {
    ActionWindow::new(hm(8, 50), hm(9, 5))
}
fn default_exit_window() -> ActionWindow {
    ActionWindow::new(hm(17, 0), hm(19, 0))
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            entry: default_entry_window(),
            exit_verification: default_exit_window(),
        }
    }
}

/// Uniform draw ranges for the daily plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomizationConfig {
    #[serde(default = "default_entry_earliest")]
    pub entry_earliest: NaiveTime,
    #[serde(default = "default_entry_latest")]
    pub entry_latest: NaiveTime,
    #[serde(default = "default_lunch_earliest")]
    pub lunch_earliest: NaiveTime,
    #[serde(default = "default_lunch_latest")]
    pub lunch_latest: NaiveTime,
}

fn default_entry_earliest() -> NaiveTime {
    hm(8, 50)
}
fn default_entry_latest() -> NaiveTime {
    hm(9, 5)
}
fn default_lunch_earliest() -> NaiveTime {
    hm(12, 20)
}
fn default_lunch_latest() -> NaiveTime {
    hm(12, 30)
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        Self {
            entry_earliest: default_entry_earliest(),
            entry_latest: default_entry_latest(),
            lunch_earliest: default_lunch_earliest(),
            lunch_latest: default_lunch_latest(),
        }
    }
}

/// Mandated durations. 480 + 60 = the 9-hour total span between the
/// begin-work and end-work events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkHoursConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Exact lunch length. No jitter.
    #[serde(default = "default_lunch_minutes")]
    pub lunch_minutes: u32,
    /// Tolerance band around the exit deadline, in minutes.
    #[serde(default = "default_tolerance")]
    pub tolerance_minutes: u32,
}

fn default_work_minutes() -> u32 {
    480
}
fn default_lunch_minutes() -> u32 {
    60
}
fn default_tolerance() -> u32 {
    5
}

impl WorkHoursConfig {
    /// Work plus lunch: the span between real entry and the exit
    /// deadline.
    pub fn total_minutes(&self) -> i64 {
        i64::from(self.work_minutes) + i64::from(self.lunch_minutes)
    }
}

impl Default for WorkHoursConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            lunch_minutes: default_lunch_minutes(),
            tolerance_minutes: default_tolerance(),
        }
    }
}

/// Deferred one-shot trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Logical task name; re-arming cancels and replaces this task.
    #[serde(default = "default_task_name")]
    pub task_name: String,
    /// Hard ceiling for the scheduled time. A computed target past this
    /// is clamped down to it.
    #[serde(default = "default_ceiling")]
    pub ceiling: NaiveTime,
    /// Try the elevated registration mode first.
    #[serde(default = "bool_true")]
    pub elevated: bool,
}

fn default_task_name() -> String {
    "ponto-exit-today".into()
}
fn default_ceiling() -> NaiveTime {
    hm(18, 5)
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            task_name: default_task_name(),
            ceiling: default_ceiling(),
            elevated: true,
        }
    }
}

/// Where durable state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. `~` is expanded by the binary.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "~/.ponto".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Commands the binary shells out to for the external-system
/// collaborators. The browser automation lives behind these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Command for the "begin work" signal.
    #[serde(default)]
    pub begin_cmd: Option<String>,
    /// Command for the "end work" signal.
    #[serde(default)]
    pub end_cmd: Option<String>,
    /// Command printing the observed real entry time (`HH:MM`) on
    /// stdout, or nothing when no entry is registered yet.
    #[serde(default)]
    pub observe_cmd: Option<String>,
    /// Command pushing the day's four timestamps downstream. Receives
    /// the schedule as JSON on stdin.
    #[serde(default)]
    pub sync_cmd: Option<String>,
    /// Timeout for each external command, in seconds.
    #[serde(default = "default_external_timeout")]
    pub timeout_secs: u64,
}

fn default_external_timeout() -> u64 {
    180
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            begin_cmd: None,
            end_cmd: None,
            observe_cmd: None,
            sync_cmd: None,
            timeout_secs: default_external_timeout(),
        }
    }
}

/// Human-facing notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook URL receiving the invocation report as JSON. Disabled
    /// when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}
