//! Field normalizer: validated table rows into typed dialer records.

use serde::Serialize;

use crate::error::FunnelError;
use crate::io::{Cell, RawTable};
use crate::schema::{BucketSource, SchemaMapping};

/// Outcome label meaning the lead was reached.
pub const CONNECT: &str = "Connect";

/// Outcome label meaning the lead was not reached.
pub const NON_CONNECT: &str = "Non Connect";

/// Bucket label for attempts three and beyond.
pub const THIRD_PLUS_BUCKET: &str = ">=3";

/// Distinct-countable lead identifier.
///
/// Numbers and text stay distinct unless the layout coerces identifiers to
/// text, so `1` and `"1"` are two leads in an uncoerced layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum LeadId {
    Number(i64),
    Text(String),
}

impl LeadId {
    /// Identifier for a cell, or `None` for an empty cell.
    fn from_cell(cell: &Cell, coerce: bool) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        if coerce {
            return Some(LeadId::Text(cell.to_text()));
        }
        match cell {
            Cell::Int(i) => Some(LeadId::Number(*i)),
            Cell::Float(f) => Some(match crate::io::integral_float(*f) {
                Some(i) => LeadId::Number(i),
                None => LeadId::Text(f.to_string()),
            }),
            other => Some(LeadId::Text(other.to_text())),
        }
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadId::Number(n) => write!(f, "{}", n),
            LeadId::Text(s) => f.write_str(s),
        }
    }
}

/// Classified outcome of one dialing attempt.
///
/// Classification is an exact match on the (possibly normalized) label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Connect,
    NonConnect,
    Other(String),
    Missing,
}

impl Outcome {
    fn classify(label: String) -> Self {
        match label.as_str() {
            CONNECT => Outcome::Connect,
            NON_CONNECT => Outcome::NonConnect,
            _ => Outcome::Other(label),
        }
    }

    fn from_cell(cell: &Cell, normalize: bool) -> Self {
        if cell.is_empty() {
            return Outcome::Missing;
        }
        let raw = cell.to_text();
        if normalize {
            Self::classify(title_case(raw.trim()))
        } else {
            Self::classify(raw)
        }
    }

    /// Check for a connected outcome.
    pub fn is_connect(&self) -> bool {
        matches!(self, Outcome::Connect)
    }

    /// Check for a non-connected outcome.
    pub fn is_non_connect(&self) -> bool {
        matches!(self, Outcome::NonConnect)
    }
}

/// One normalized attempt row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialerRecord {
    /// Zero-based data row index in the source table
    pub row: usize,

    /// Lead identifier; `None` for blank cells, which are never counted
    pub lead: Option<LeadId>,

    /// Attempt number, 0 when blank
    pub attempt: i64,

    /// Trimmed campaign name
    pub campaign: String,

    /// First-attempt outcome
    pub first_outcome: Outcome,

    /// Second-attempt outcome
    pub second_outcome: Outcome,

    /// Resolution bucket label; `None` when the source column is blank
    pub bucket: Option<String>,

    /// Whether the row joins the bucket distribution
    pub unresolved: bool,
}

/// Bucket label derived from an attempt number.
pub fn attempt_bucket(attempt: i64) -> String {
    if attempt >= 3 {
        THIRD_PLUS_BUCKET.to_string()
    } else {
        attempt.to_string()
    }
}

/// Title-case every word: first cased character upper, the rest lower.
///
/// Any uncased character (space, digit, punctuation) starts a new word, so
/// `"non-connect"` becomes `"Non-Connect"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for c in value.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
        } else {
            out.push(c);
        }
        in_word = cased;
    }
    out
}

struct ColumnIndices {
    identifier: usize,
    attempt: usize,
    campaign: usize,
    first_outcome: usize,
    second_outcome: usize,
    bucket: usize,
}

impl ColumnIndices {
    fn resolve(table: &RawTable, mapping: &SchemaMapping) -> Result<Self, FunnelError> {
        mapping.validate(table)?;
        let col = |name: &str| {
            table.column_index(name).ok_or_else(|| FunnelError::Schema {
                missing: vec![name.to_string()],
            })
        };
        let bucket_column = match &mapping.bucket {
            BucketSource::Derived { status_column, .. } => status_column,
            BucketSource::Column { column } => column,
        };
        Ok(Self {
            identifier: col(mapping.identifier.as_str())?,
            attempt: col(mapping.attempt.as_str())?,
            campaign: col(mapping.campaign.as_str())?,
            first_outcome: col(mapping.first_outcome.as_str())?,
            second_outcome: col(mapping.second_outcome.as_str())?,
            bucket: col(bucket_column.as_str())?,
        })
    }
}

/// Validate the table and convert every row into a `DialerRecord`.
///
/// No rows are dropped. Blank attempts become 0; text attempts that are not
/// numbers also become 0 and are reported once as a warning.
pub fn normalize(table: &RawTable, mapping: &SchemaMapping) -> Result<Vec<DialerRecord>, FunnelError> {
    let cols = ColumnIndices::resolve(table, mapping)?;
    let mut unparseable_attempts = 0usize;

    let records: Vec<DialerRecord> = (0..table.len())
        .map(|row| {
            let attempt_cell = table.cell(row, cols.attempt);
            let attempt = match attempt_cell.as_integer() {
                Some(n) => n,
                None => {
                    if !attempt_cell.is_empty() {
                        unparseable_attempts += 1;
                    }
                    0
                }
            };

            let bucket_cell = table.cell(row, cols.bucket);
            let (bucket, unresolved) = match &mapping.bucket {
                BucketSource::Derived { pending_value, .. } => {
                    let pending = !bucket_cell.is_empty()
                        && bucket_cell.to_text().to_lowercase() == pending_value.to_lowercase();
                    (Some(attempt_bucket(attempt)), pending)
                }
                BucketSource::Column { .. } => {
                    let label = (!bucket_cell.is_empty()).then(|| bucket_cell.to_text());
                    (label, true)
                }
            };

            DialerRecord {
                row,
                lead: LeadId::from_cell(table.cell(row, cols.identifier), mapping.coerce_identifier),
                attempt,
                campaign: table.cell(row, cols.campaign).to_text().trim().to_string(),
                first_outcome: Outcome::from_cell(
                    table.cell(row, cols.first_outcome),
                    mapping.normalize_outcomes,
                ),
                second_outcome: Outcome::from_cell(
                    table.cell(row, cols.second_outcome),
                    mapping.normalize_outcomes,
                ),
                bucket,
                unresolved,
            }
        })
        .collect();

    if unparseable_attempts > 0 {
        tracing::warn!(
            "{} rows have a non-numeric '{}' value; treated as attempt 0",
            unparseable_attempts,
            mapping.attempt
        );
    }
    tracing::debug!("Normalized {} rows using layout {}", records.len(), mapping.name);

    Ok(records)
}
