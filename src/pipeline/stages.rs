//! The connectivity metrics pipeline.
//!
//! Every interaction (new upload or new campaign selection) runs the full
//! sequence again; nothing is cached between runs:
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌────────────┐
//! │ Validate │──▶│ Normalize │──▶│ Campaign │──▶│ Funnel +   │
//! │ columns  │   │  fields   │   │  filter  │   │ buckets    │
//! └──────────┘   └───────────┘   └──────────┘   └────────────┘
//! ```
//!
//! Validation and normalization happen once per upload (`Dataset::ingest`);
//! filtering and aggregation happen per campaign (`Dataset::report`).

use serde::Serialize;

use super::buckets::{bucket_distribution, BucketCount};
use super::filter::{campaigns, filter_campaign};
use super::funnel::{format_rate, FirstAttemptMetrics, FunnelMetrics, RecoveryMetrics};
use super::normalize::{normalize, DialerRecord};
use crate::error::FunnelError;
use crate::io::RawTable;
use crate::schema::SchemaMapping;

/// Validated, normalized snapshot of one upload.
#[derive(Debug, Clone)]
pub struct Dataset {
    mapping: SchemaMapping,
    records: Vec<DialerRecord>,
}

impl Dataset {
    /// Validate required columns and normalize every row.
    pub fn ingest(table: &RawTable, mapping: SchemaMapping) -> Result<Self, FunnelError> {
        let records = normalize(table, &mapping)?;
        tracing::info!(
            "Ingested {} rows ({} layout, {} campaigns)",
            records.len(),
            mapping.name,
            campaigns(&records).len()
        );
        Ok(Self { mapping, records })
    }

    /// The mapping this dataset was ingested with.
    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Sorted distinct campaign values.
    pub fn campaigns(&self) -> Vec<String> {
        campaigns(&self.records)
    }

    /// Selector default: the first campaign in sorted order.
    pub fn default_campaign(&self) -> Option<String> {
        self.campaigns().into_iter().next()
    }

    /// Rows of one campaign.
    pub fn filter(&self, campaign: &str) -> Vec<&DialerRecord> {
        filter_campaign(&self.records, campaign)
    }

    /// Run filter and aggregation for one campaign.
    ///
    /// `None` selects nothing (an upload with no rows has no campaigns) and
    /// yields an all-zero report.
    pub fn report(&self, campaign: Option<&str>) -> ConnectivityReport {
        let rows = match campaign {
            Some(c) => self.filter(c),
            None => Vec::new(),
        };
        let funnel = FunnelMetrics::compute(&rows);
        let buckets = bucket_distribution(&rows);

        tracing::debug!(
            "Campaign {:?}: first attempt {}/{}, recovery {}/{}, {} buckets",
            campaign,
            funnel.first_attempt.connect,
            funnel.first_attempt.total,
            funnel.second_attempt.connect,
            funnel.second_attempt.total,
            buckets.len()
        );

        ConnectivityReport {
            layout: self.mapping.name.clone(),
            campaign: campaign.map(str::to_string),
            rows: rows.len(),
            first_attempt: funnel.first_attempt,
            second_attempt: funnel.second_attempt,
            buckets,
        }
    }
}

/// Result record handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityReport {
    /// Layout name the upload was read with
    pub layout: String,

    /// Selected campaign
    pub campaign: Option<String>,

    /// Rows in the selected campaign
    pub rows: usize,

    /// First-attempt block
    pub first_attempt: FirstAttemptMetrics,

    /// Second-attempt recovery block
    pub second_attempt: RecoveryMetrics,

    /// Bucket distribution, ascending by label
    pub buckets: Vec<BucketCount>,
}

impl std::fmt::Display for ConnectivityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Campaign {:?}: 1st attempt {}/{} ({}%), 2nd on NC {}/{} ({}%), {} buckets",
            self.campaign.as_deref().unwrap_or(""),
            self.first_attempt.connect,
            self.first_attempt.total,
            format_rate(self.first_attempt.rate, self.first_attempt.total),
            self.second_attempt.connect,
            self.second_attempt.total,
            format_rate(self.second_attempt.rate, self.second_attempt.total),
            self.buckets.len()
        )
    }
}

/// Ingest a table and report on one campaign in a single call.
///
/// When `campaign` is `None` the selector default is used.
pub fn run_pipeline(
    table: &RawTable,
    mapping: SchemaMapping,
    campaign: Option<&str>,
) -> Result<ConnectivityReport, FunnelError> {
    let dataset = Dataset::ingest(table, mapping)?;
    let selected = match campaign {
        Some(c) => Some(c.to_string()),
        None => dataset.default_campaign(),
    };
    Ok(dataset.report(selected.as_deref()))
}
