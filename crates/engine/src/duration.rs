//! Human-readable duration parsing.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::EngineError;

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(minute|min|hour|hr|day|week|month|year)s?\s*$")
        .expect("valid duration regex")
});

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
const MONTH_MS: i64 = 30 * DAY_MS;
const YEAR_MS: i64 = 365 * DAY_MS;

/// Parse a duration like "3 Days" or "12 hours" into milliseconds.
///
/// Fails on non-positive quantities and on anything that does not match
/// the `<quantity> <unit>` shape.
pub fn parse_duration_ms(text: &str) -> Result<i64, EngineError> {
    let captures = DURATION
        .captures(text)
        .ok_or_else(|| EngineError::InvalidDuration {
            text: text.to_string(),
            reason: "expected '<quantity> <unit>'".to_string(),
        })?;

    let quantity: i64 =
        captures[1]
            .parse()
            .map_err(|_| EngineError::InvalidDuration {
                text: text.to_string(),
                reason: "quantity out of range".to_string(),
            })?;
    if quantity <= 0 {
        return Err(EngineError::InvalidDuration {
            text: text.to_string(),
            reason: "quantity must be positive".to_string(),
        });
    }

    let unit_ms = match captures[2].to_lowercase().as_str() {
        "minute" | "min" => MINUTE_MS,
        "hour" | "hr" => HOUR_MS,
        "day" => DAY_MS,
        "week" => WEEK_MS,
        "month" => MONTH_MS,
        "year" => YEAR_MS,
        _ => unreachable!("unit restricted by regex"),
    };

    quantity
        .checked_mul(unit_ms)
        .ok_or_else(|| EngineError::InvalidDuration {
            text: text.to_string(),
            reason: "duration overflows".to_string(),
        })
}
