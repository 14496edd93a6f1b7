//! Time-window gating.
//!
//! "May I act now" is a pure function of the configured windows and the
//! clock. It never consults execution state; "have I acted" lives in
//! [`crate::state`] and the orchestrator is the only place the two
//! predicates are combined (with a plain logical AND).

use std::fmt;

use chrono::NaiveTime;

use ponto_core::clock;
use ponto_core::config::WindowsConfig;
use ponto_core::types::ActionWindow;

/// The actions guarded by a clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Entry,
    /// The window in which exit verification (and the exit itself) may
    /// run. Wider than the actual exit tolerance on purpose: the
    /// reconciler decides the exact moment inside it.
    ExitVerification,
}

impl fmt::Display for GatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatedAction::Entry => f.write_str("entry"),
            GatedAction::ExitVerification => f.write_str("exit verification"),
        }
    }
}

/// Result of a gate check, with the reason spelled out for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowCheck {
    pub within: bool,
    pub reason: String,
}

/// Pure clock gate over the configured action windows.
#[derive(Debug, Clone)]
pub struct TimeWindowGate {
    entry: ActionWindow,
    exit_verification: ActionWindow,
}

impl TimeWindowGate {
    pub fn new(windows: &WindowsConfig) -> Self {
        Self {
            entry: windows.entry,
            exit_verification: windows.exit_verification,
        }
    }

    pub fn window(&self, action: GatedAction) -> ActionWindow {
        match action {
            GatedAction::Entry => self.entry,
            GatedAction::ExitVerification => self.exit_verification,
        }
    }

    /// Is `now` inside the permitted range for this action?
    pub fn is_within(&self, action: GatedAction, now: NaiveTime) -> bool {
        self.window(action).contains(now)
    }

    /// Same check with a human-readable verdict.
    pub fn check(&self, action: GatedAction, now: NaiveTime) -> WindowCheck {
        let window = self.window(action);
        let now_s = clock::fmt_hm(now);
        if now < window.earliest {
            WindowCheck {
                within: false,
                reason: format!("too early for {action}: window opens {window} (now {now_s})"),
            }
        } else if now > window.latest {
            WindowCheck {
                within: false,
                reason: format!("too late for {action}: window closed {window} (now {now_s})"),
            }
        } else {
            WindowCheck {
                within: true,
                reason: format!("inside {action} window {window} (now {now_s})"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponto_core::clock::hm;

    fn gate() -> TimeWindowGate {
        TimeWindowGate::new(&WindowsConfig::default())
    }

    #[test]
    fn test_entry_window_bounds() {
        let gate = gate();
        assert!(!gate.is_within(GatedAction::Entry, hm(8, 49)));
        assert!(gate.is_within(GatedAction::Entry, hm(8, 50)));
        assert!(gate.is_within(GatedAction::Entry, hm(8, 55)));
        assert!(gate.is_within(GatedAction::Entry, hm(9, 5)));
        assert!(!gate.is_within(GatedAction::Entry, hm(9, 6)));
    }

    #[test]
    fn test_exit_verification_window_bounds() {
        let gate = gate();
        assert!(!gate.is_within(GatedAction::ExitVerification, hm(16, 59)));
        assert!(gate.is_within(GatedAction::ExitVerification, hm(17, 0)));
        assert!(gate.is_within(GatedAction::ExitVerification, hm(19, 0)));
        assert!(!gate.is_within(GatedAction::ExitVerification, hm(19, 1)));
    }

    #[test]
    fn test_check_reasons() {
        let gate = gate();
        let early = gate.check(GatedAction::Entry, hm(7, 0));
        assert!(!early.within);
        assert!(early.reason.contains("too early"));

        let late = gate.check(GatedAction::Entry, hm(10, 0));
        assert!(!late.within);
        assert!(late.reason.contains("too late"));

        let ok = gate.check(GatedAction::Entry, hm(8, 55));
        assert!(ok.within);
    }
}
