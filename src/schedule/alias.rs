// src/schedule/alias.rs

//! Reserved schedule aliases.
//!
//! Aliases map to canonical five-field expressions through a fixed table,
//! resolved in one place (here) both at validation time and per due-ness
//! evaluation, never re-derived ad hoc. `@reboot` is special: it marks a
//! task that runs once per scheduler process lifetime instead of on a cron
//! schedule.

use crate::errors::Result;
use crate::schedule::cron::CronExpr;

/// The one-shot on-startup alias.
pub const STARTUP_ALIAS: &str = "@reboot";

/// Alias → canonical cron expression.
pub const RESERVED_ALIASES: &[(&str, &str)] = &[
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@midnight", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
];

/// A task schedule after alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// Run once at scheduler startup (`@reboot`).
    OnStartup,
    /// Run on a cron schedule.
    Cron(CronExpr),
}

impl ScheduleSpec {
    /// Resolve a raw schedule string (alias or cron expression).
    pub fn resolve(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec == STARTUP_ALIAS {
            return Ok(ScheduleSpec::OnStartup);
        }
        let expression = RESERVED_ALIASES
            .iter()
            .find(|(alias, _)| *alias == spec)
            .map(|(_, expr)| *expr)
            .unwrap_or(spec);
        Ok(ScheduleSpec::Cron(CronExpr::parse(expression)?))
    }

    /// Whether a raw schedule string is the on-startup alias.
    pub fn is_startup(spec: &str) -> bool {
        spec.trim() == STARTUP_ALIAS
    }
}
