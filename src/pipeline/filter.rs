//! Campaign selector values and the campaign filter.

use super::normalize::DialerRecord;

/// Distinct campaign values, sorted ascending. These populate the selector.
pub fn campaigns(records: &[DialerRecord]) -> Vec<String> {
    let mut values: Vec<String> = records.iter().map(|r| r.campaign.clone()).collect();
    values.sort();
    values.dedup();
    values
}

/// Rows whose campaign equals `campaign` exactly (case-sensitive, post-trim).
pub fn filter_campaign<'a>(records: &'a [DialerRecord], campaign: &str) -> Vec<&'a DialerRecord> {
    let filtered: Vec<&DialerRecord> = records.iter().filter(|r| r.campaign == campaign).collect();
    tracing::debug!(
        "Filtered {} -> {} rows (campaign: {:?})",
        records.len(),
        filtered.len(),
        campaign
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::Outcome;

    fn record(row: usize, campaign: &str) -> DialerRecord {
        DialerRecord {
            row,
            lead: None,
            attempt: 1,
            campaign: campaign.to_string(),
            first_outcome: Outcome::Missing,
            second_outcome: Outcome::Missing,
            bucket: None,
            unresolved: false,
        }
    }

    fn create_test_records() -> Vec<DialerRecord> {
        vec![
            record(0, "Beta"),
            record(1, "Alpha"),
            record(2, "beta"),
            record(3, "Beta"),
            record(4, ""),
        ]
    }

    #[test]
    fn test_campaigns_sorted_distinct() {
        let records = create_test_records();
        assert_eq!(campaigns(&records), vec!["", "Alpha", "Beta", "beta"]);
    }

    #[test]
    fn test_filter_is_exact_match() {
        let records = create_test_records();
        let rows: Vec<usize> = filter_campaign(&records, "Beta").iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 3]);
        assert!(filter_campaign(&records, "Gamma").is_empty());
    }

    #[test]
    fn test_filter_partitions_dataset() {
        let records = create_test_records();
        let mut seen: Vec<usize> = campaigns(&records)
            .iter()
            .flat_map(|c| filter_campaign(&records, c))
            .map(|r| r.row)
            .collect();
        seen.sort();
        // Disjoint and covering: every row exactly once
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
