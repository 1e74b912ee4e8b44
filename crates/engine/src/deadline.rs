//! Deadline and staleness computation.

use chrono::{DateTime, Duration, Utc};
use tracker::Label;
use tracing::debug;

use crate::duration::parse_duration_ms;
use crate::error::EngineError;

const PRICE_PREFIX: &str = "price:";

/// Locate the price-bearing label, if any. The first match wins when a
/// work item carries more than one.
#[must_use]
pub fn price_label(labels: &[Label]) -> Option<&Label> {
    let found = labels
        .iter()
        .find(|l| l.name.to_lowercase().starts_with(PRICE_PREFIX));
    if let Some(label) = found {
        debug!(label = %label.name, "Using price label");
    }
    found
}

/// Deadline for a work item: its price duration added to `created_at`.
///
/// Fails when no price label is present or its duration does not parse.
pub fn compute_deadline(
    labels: &[Label],
    created_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, EngineError> {
    let label = price_label(labels).ok_or(EngineError::MissingPriceLabel)?;
    let duration_text = label.name[PRICE_PREFIX.len()..].trim();
    let ms = parse_duration_ms(duration_text)?;
    Ok(created_at + Duration::milliseconds(ms))
}

/// Whether an assignment is stale: `now - created_at >= timeout`. A zero
/// timeout disables the flag.
#[must_use]
pub fn is_stale(timeout_ms: i64, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    timeout_ms > 0 && (now - created_at).num_milliseconds() >= timeout_ms
}
