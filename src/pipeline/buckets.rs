//! Distribution of unresolved leads across attempt buckets.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::normalize::{DialerRecord, LeadId};

/// One bar of the bucket chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub bucket: String,
    pub leads: usize,
}

/// Group unresolved rows by bucket label and count distinct leads per bucket.
///
/// Rows with a blank bucket are left out. Labels sort as strings, so `"10"`
/// lands between `"1"` and `"2"` and `">=3"` after every digit label.
pub fn bucket_distribution(rows: &[&DialerRecord]) -> Vec<BucketCount> {
    let mut groups: BTreeMap<&str, HashSet<&LeadId>> = BTreeMap::new();
    for record in rows.iter().filter(|r| r.unresolved) {
        if let Some(bucket) = record.bucket.as_deref() {
            let leads = groups.entry(bucket).or_default();
            if let Some(lead) = record.lead.as_ref() {
                leads.insert(lead);
            }
        }
    }

    groups
        .into_iter()
        .map(|(bucket, leads)| BucketCount {
            bucket: bucket.to_string(),
            leads: leads.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::Outcome;

    fn row(lead: i64, bucket: Option<&str>, unresolved: bool) -> DialerRecord {
        DialerRecord {
            row: 0,
            lead: Some(LeadId::Number(lead)),
            attempt: 1,
            campaign: "X".to_string(),
            first_outcome: Outcome::Missing,
            second_outcome: Outcome::Missing,
            bucket: bucket.map(str::to_string),
            unresolved,
        }
    }

    #[test]
    fn test_string_sort_order() {
        let records = vec![
            row(1, Some("2"), true),
            row(2, Some(">=3"), true),
            row(3, Some("1"), true),
            row(4, Some("10"), true),
            row(5, Some("0"), true),
        ];
        let rows: Vec<&DialerRecord> = records.iter().collect();
        let labels: Vec<String> = bucket_distribution(&rows).into_iter().map(|b| b.bucket).collect();
        assert_eq!(labels, vec!["0", "1", "10", "2", ">=3"]);
    }

    #[test]
    fn test_only_unresolved_rows_counted() {
        let records = vec![
            row(1, Some("1"), true),
            row(1, Some("1"), true),
            row(2, Some("1"), true),
            row(3, Some("1"), false),
            row(4, Some("2"), false),
            row(5, None, true),
        ];
        let rows: Vec<&DialerRecord> = records.iter().collect();
        let buckets = bucket_distribution(&rows);
        assert_eq!(
            buckets,
            vec![BucketCount { bucket: "1".to_string(), leads: 2 }]
        );
    }

    #[test]
    fn test_bucket_with_only_blank_leads_reports_zero() {
        let mut blank = row(0, Some("2"), true);
        blank.lead = None;
        let records = vec![blank];
        let rows: Vec<&DialerRecord> = records.iter().collect();
        assert_eq!(
            bucket_distribution(&rows),
            vec![BucketCount { bucket: "2".to_string(), leads: 0 }]
        );
    }

    #[test]
    fn test_counts_sum_to_population() {
        let records = vec![
            row(1, Some("1"), true),
            row(2, Some("2"), true),
            row(3, Some(">=3"), true),
            row(3, Some(">=3"), true),
        ];
        let rows: Vec<&DialerRecord> = records.iter().collect();
        let total: usize = bucket_distribution(&rows).iter().map(|b| b.leads).sum();
        assert_eq!(total, 3);
    }
}
