// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! Cron schedule parsing and catch-up policy resolution (component I).
//!
//! Surface documents write ordinary five-field cron expressions
//! (`minute hour day-of-month month day-of-week`). The [`cron`] crate parses
//! the seven-field form (seconds and year included), so [`normalize`] pads
//! the expression before handing it to the parser, and the parser's
//! canonical re-rendering is kept as [`dagc_core::Schedule::parsed`] so a
//! cosmetic rewrite (`*/1` -> `*`) is visible to callers without needing to
//! re-parse.

use std::str::FromStr;
use std::time::Duration;

use dagc_core::{Catchup, ErrorCode, Schedule, ValidationError};

/// Default catch-up replay window when `catchup` is on but no window was given.
pub const DEFAULT_CATCHUP_WINDOW: Duration = Duration::from_secs(24 * 3600);

/// Pad a five-field cron expression to the seven-field form `cron` parses:
/// a leading `0` seconds field and a trailing `*` year field.
#[must_use]
pub fn normalize(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => format!("0 {} *", fields.join(" ")),
        6 => format!("{} *", fields.join(" ")),
        _ => expression.to_string(),
    }
}

/// Parse a five-field cron expression and resolve its catch-up policy into a
/// [`Schedule`].
///
/// # Errors
/// `InvalidSchedule` wrapping the parser's own message verbatim, so a user
/// debugging a cron typo sees the same text the underlying parser produced.
pub fn build_schedule(
    field: &str,
    expression: &str,
    catchup: Catchup,
    catchup_window: Option<Duration>,
) -> Result<Schedule, ValidationError> {
    let normalized = normalize(expression);
    let parsed = cron::Schedule::from_str(&normalized).map_err(|e| {
        ValidationError::new(field, ErrorCode::InvalidSchedule, e.to_string())
    })?;

    let catchup_window = match catchup {
        Catchup::Off => Duration::ZERO,
        _ => catchup_window.unwrap_or(DEFAULT_CATCHUP_WINDOW),
    };

    Ok(Schedule {
        expression: expression.to_string(),
        parsed: parsed.to_string(),
        catchup,
        catchup_window,
    })
}
