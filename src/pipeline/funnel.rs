//! First-attempt and second-attempt recovery metrics.

use serde::Serialize;
use std::collections::HashSet;

use super::normalize::{DialerRecord, LeadId};

/// Connect percentage rounded to two decimals; 0 when there is no base.
pub fn connectivity_rate(connect: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = connect as f64 / total as f64 * 100.0;
    // Decimal formatting rounds on the exact binary value, ties to even
    format!("{:.2}", raw).parse().unwrap_or(raw)
}

/// Render a rate for display, keeping one decimal for whole numbers (`50.0`).
///
/// An empty base renders as a bare `0`.
pub fn format_rate(rate: f64, total: usize) -> String {
    if total == 0 {
        "0".to_string()
    } else if rate.fract() == 0.0 {
        format!("{:.1}", rate)
    } else {
        format!("{}", rate)
    }
}

/// Distinct non-blank identifiers among the given rows.
pub fn distinct_leads<'a, I>(rows: I) -> usize
where
    I: IntoIterator<Item = &'a DialerRecord>,
{
    rows.into_iter()
        .filter_map(|r| r.lead.as_ref())
        .collect::<HashSet<&LeadId>>()
        .len()
}

/// Metrics over attempt-1 rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FirstAttemptMetrics {
    pub total: usize,
    pub connect: usize,
    pub non_connect: usize,
    pub rate: f64,
}

/// Metrics over attempt-2 rows of leads that did not connect on attempt 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryMetrics {
    pub total: usize,
    pub connect: usize,
    pub rate: f64,
}

/// Both funnel blocks, computed independently over the same rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FunnelMetrics {
    pub first_attempt: FirstAttemptMetrics,
    pub second_attempt: RecoveryMetrics,
}

impl FunnelMetrics {
    /// Compute both blocks from campaign-filtered rows.
    pub fn compute(rows: &[&DialerRecord]) -> Self {
        Self {
            first_attempt: first_attempt(rows),
            second_attempt: second_attempt(rows),
        }
    }
}

/// First-attempt block: distinct leads at attempt 1 and how many connected.
pub fn first_attempt(rows: &[&DialerRecord]) -> FirstAttemptMetrics {
    let base: Vec<&DialerRecord> = rows.iter().copied().filter(|r| r.attempt == 1).collect();
    let total = distinct_leads(base.iter().copied());
    let connect = distinct_leads(base.iter().copied().filter(|r| r.first_outcome.is_connect()));

    FirstAttemptMetrics {
        total,
        connect,
        non_connect: total - connect,
        rate: connectivity_rate(connect, total),
    }
}

/// Recovery block: attempt-2 rows whose first outcome was "Non Connect".
pub fn second_attempt(rows: &[&DialerRecord]) -> RecoveryMetrics {
    let base: Vec<&DialerRecord> = rows
        .iter()
        .copied()
        .filter(|r| r.attempt == 2 && r.first_outcome.is_non_connect())
        .collect();
    let total = distinct_leads(base.iter().copied());
    let connect = distinct_leads(base.iter().copied().filter(|r| r.second_outcome.is_connect()));

    RecoveryMetrics {
        total,
        connect,
        rate: connectivity_rate(connect, total),
    }
}
