// src/schedule/mod.rs

//! Schedule parsing: cron expressions and reserved aliases.

pub mod alias;
pub mod cron;

pub use alias::{ScheduleSpec, RESERVED_ALIASES, STARTUP_ALIAS};
pub use cron::CronExpr;
