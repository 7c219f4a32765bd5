//! Column mappings for the supported dialer export layouts, and the schema validator.
//!
//! Two layouts exist in the field:
//!
//! - **lead/status**: leads keyed by `Leadid`; the bucket is derived from the
//!   attempt number and only rows whose `Status` is "pending" feed the bucket table.
//! - **number/bucket**: leads keyed by phone number `Numb`; the bucket comes from
//!   a `Bucket` column and every row feeds the bucket table. Identifiers are
//!   coerced to text and outcome labels are trimmed and title-cased.

use serde::{Deserialize, Serialize};

use crate::error::FunnelError;
use crate::io::RawTable;

/// Where the resolution bucket of a row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketSource {
    /// Derived from the attempt number (`">=3"` for attempt >= 3, otherwise the
    /// attempt as text). Only rows whose status equals `pending_value`
    /// (case-insensitive) join the bucket table.
    Derived {
        status_column: String,
        #[serde(default = "default_pending_value")]
        pending_value: String,
    },

    /// Read directly from a column; every row joins the bucket table.
    Column { column: String },
}

fn default_pending_value() -> String {
    "pending".to_string()
}

/// Column names and normalization rules for one export layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    /// Human-readable layout name used in logs and reports
    pub name: String,

    /// Lead identifier column
    pub identifier: String,

    /// Attempt number column
    pub attempt: String,

    /// Campaign column
    pub campaign: String,

    /// First-attempt outcome column ("Connect" / "Non Connect")
    pub first_outcome: String,

    /// Second-attempt outcome column
    pub second_outcome: String,

    /// Bucket source strategy
    pub bucket: BucketSource,

    /// Trim and title-case outcome labels before comparison
    #[serde(default)]
    pub normalize_outcomes: bool,

    /// Coerce identifiers to text before distinct counting
    #[serde(default)]
    pub coerce_identifier: bool,
}

impl SchemaMapping {
    /// Layout keyed by `Leadid` with a `Status` column.
    pub fn lead_status() -> Self {
        Self {
            name: "lead_status".to_string(),
            identifier: "Leadid".to_string(),
            attempt: "Attempt".to_string(),
            campaign: "Campaign".to_string(),
            first_outcome: "1-Con/Non Con".to_string(),
            second_outcome: "2-Con/Non Con".to_string(),
            bucket: BucketSource::Derived {
                status_column: "Status".to_string(),
                pending_value: default_pending_value(),
            },
            normalize_outcomes: false,
            coerce_identifier: false,
        }
    }

    /// Layout keyed by `Numb` with a supplied `Bucket` column.
    pub fn number_bucket() -> Self {
        Self {
            name: "number_bucket".to_string(),
            identifier: "Numb".to_string(),
            attempt: "Attempt".to_string(),
            campaign: "Campaign".to_string(),
            first_outcome: "1-Con/Non Con".to_string(),
            second_outcome: "2-Con/Non Con".to_string(),
            bucket: BucketSource::Column {
                column: "Bucket".to_string(),
            },
            normalize_outcomes: true,
            coerce_identifier: true,
        }
    }

    /// Required columns, in the order they are reported when missing.
    pub fn required_columns(&self) -> Vec<&str> {
        let bucket_column = match &self.bucket {
            BucketSource::Derived { status_column, .. } => status_column.as_str(),
            BucketSource::Column { column } => column.as_str(),
        };
        vec![
            self.identifier.as_str(),
            self.attempt.as_str(),
            self.campaign.as_str(),
            self.first_outcome.as_str(),
            self.second_outcome.as_str(),
            bucket_column,
        ]
    }

    /// Check the table against this mapping's required columns.
    pub fn validate<'a>(&self, table: &'a RawTable) -> Result<&'a RawTable, FunnelError> {
        validate_columns(table, &self.required_columns())
    }
}

/// Required columns absent from the table, in required order.
pub fn missing_columns(table: &RawTable, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect()
}

/// Return the table unchanged if every required column is present.
///
/// Extra columns are ignored. Column names match exactly.
pub fn validate_columns<'a>(
    table: &'a RawTable,
    required: &[&str],
) -> Result<&'a RawTable, FunnelError> {
    let missing = missing_columns(table, required);
    if missing.is_empty() {
        Ok(table)
    } else {
        Err(FunnelError::Schema { missing })
    }
}

/// Named layout selection, resolved once per upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPreset {
    /// Pick the layout whose columns are present
    #[default]
    Auto,
    /// `Leadid` + `Status` layout
    LeadStatus,
    /// `Numb` + `Bucket` layout
    NumberBucket,
}

impl SchemaPreset {
    /// Resolve to a concrete mapping for this table.
    ///
    /// `Auto` picks the first layout with no missing columns. When none match,
    /// the layout with the fewest missing columns is chosen so that validation
    /// reports the most useful error; ties go to the lead/status layout.
    pub fn resolve(self, table: &RawTable) -> SchemaMapping {
        match self {
            SchemaPreset::LeadStatus => SchemaMapping::lead_status(),
            SchemaPreset::NumberBucket => SchemaMapping::number_bucket(),
            SchemaPreset::Auto => {
                let candidates = [SchemaMapping::lead_status(), SchemaMapping::number_bucket()];
                let mut best: Option<(usize, SchemaMapping)> = None;
                for mapping in candidates {
                    let missing = missing_columns(table, &mapping.required_columns()).len();
                    if best.as_ref().map_or(true, |(m, _)| missing < *m) {
                        best = Some((missing, mapping));
                    }
                }
                let mapping = best
                    .map(|(_, mapping)| mapping)
                    .unwrap_or_else(SchemaMapping::lead_status);
                tracing::debug!("Detected schema layout: {}", mapping.name);
                mapping
            }
        }
    }
}
