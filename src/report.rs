//! Presentation of the result record: terminal dashboard and JSON.

use std::fmt::Write as _;

use crate::io::RawTable;
use crate::pipeline::{format_rate, BucketCount, ConnectivityReport, DialerRecord};
use crate::schema::{BucketSource, SchemaMapping};

/// Dashboard heading.
pub const TITLE: &str = "DM Flow - Connectivity Dashboard";

/// Header of the derived bucket column in the raw view.
pub const ATTEMPT_BUCKET_COLUMN: &str = "Attempt Bucket";

const BAR: char = '█';

/// Render the report as the metric tiles and bucket chart.
pub fn render_dashboard(report: &ConnectivityReport, chart_width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "{}", "=".repeat(TITLE.chars().count()));
    let _ = writeln!(out, "Campaign: {}", report.campaign.as_deref().unwrap_or("-"));
    out.push('\n');

    let first = &report.first_attempt;
    section(&mut out, "1st Attempt Status");
    tiles(
        &mut out,
        &[
            ("Total", first.total.to_string()),
            ("Connect", first.connect.to_string()),
            ("Non-Connect", first.non_connect.to_string()),
            ("Connectivity", format!("{}%", format_rate(first.rate, first.total))),
        ],
    );
    out.push('\n');

    let second = &report.second_attempt;
    section(&mut out, "2nd Attempt on Non-Connect");
    tiles(
        &mut out,
        &[
            ("Total NC Base", second.total.to_string()),
            ("Connect", second.connect.to_string()),
            ("Connectivity", format!("{}%", format_rate(second.rate, second.total))),
        ],
    );
    out.push('\n');

    section(&mut out, "Attempt Bucket – Final Non Connect");
    out.push_str(&bar_chart(&report.buckets, chart_width));
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

fn tiles(out: &mut String, items: &[(&str, String)]) {
    let width = items
        .iter()
        .map(|(label, value)| label.chars().count().max(value.chars().count()))
        .max()
        .unwrap_or(0);
    let labels: Vec<String> = items.iter().map(|(l, _)| format!("{:<width$}", l)).collect();
    let values: Vec<String> = items.iter().map(|(_, v)| format!("{:<width$}", v)).collect();
    let _ = writeln!(out, "{}", labels.join("  ").trim_end());
    let _ = writeln!(out, "{}", values.join("  ").trim_end());
}

/// Horizontal bar chart, one line per bucket in report order.
///
/// The longest bar is `width` characters; any non-zero count gets at least one.
pub fn bar_chart(buckets: &[BucketCount], width: usize) -> String {
    if buckets.is_empty() {
        return "(no unresolved leads)\n".to_string();
    }

    let max = buckets.iter().map(|b| b.leads).max().unwrap_or(0);
    let label_width = buckets.iter().map(|b| b.bucket.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for bucket in buckets {
        let len = if max == 0 || bucket.leads == 0 {
            0
        } else {
            ((bucket.leads * width) as f64 / max as f64).round().max(1.0) as usize
        };
        let bar: String = std::iter::repeat(BAR).take(len).collect();
        let _ = writeln!(
            out,
            "{:>label_width$} | {}{}{}",
            bucket.bucket,
            bar,
            if len > 0 { " " } else { "" },
            bucket.leads
        );
    }
    out
}

/// Filtered rows as a plain-text table under the raw-view heading.
///
/// Shows the upload's own columns, plus the derived bucket column when the
/// layout derives buckets from attempt numbers.
pub fn render_raw(table: &RawTable, mapping: &SchemaMapping, rows: &[&DialerRecord]) -> String {
    let derived = matches!(mapping.bucket, BucketSource::Derived { .. });

    let mut headers: Vec<String> = table.headers().to_vec();
    if derived {
        headers.push(ATTEMPT_BUCKET_COLUMN.to_string());
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|record| {
            let mut line: Vec<String> = (0..table.headers().len())
                .map(|col| table.cell(record.row, col).to_text())
                .collect();
            if derived {
                line.push(record.bucket.clone().unwrap_or_default());
            }
            line
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (w, value) in widths.iter_mut().zip(line) {
            *w = (*w).max(value.chars().count());
        }
    }

    let mut out = String::new();
    section(&mut out, "View Filtered Raw Data");
    push_row(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for line in &body {
        push_row(&mut out, line, &widths);
    }
    let _ = writeln!(out, "({} rows)", body.len());
    out
}

fn push_row(out: &mut String, values: &[String], widths: &[usize]) {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<w$}", v, w = *w))
        .collect();
    let _ = writeln!(out, "{}", cells.join(" | ").trim_end());
}

/// The result record as pretty-printed JSON.
pub fn render_json(report: &ConnectivityReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Cell;
    use crate::pipeline::{run_pipeline, Dataset};

    fn create_test_table() -> RawTable {
        RawTable::new(
            ["Leadid", "Attempt", "Campaign", "1-Con/Non Con", "2-Con/Non Con", "Status"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![
                vec![Cell::Int(1), Cell::Int(1), Cell::text("X"), Cell::text("Connect"), Cell::Empty, Cell::text("Closed")],
                vec![Cell::Int(2), Cell::Int(1), Cell::text("X"), Cell::text("Non Connect"), Cell::Empty, Cell::text("Pending")],
                vec![Cell::Int(2), Cell::Int(2), Cell::text("X"), Cell::text("Non Connect"), Cell::text("Connect"), Cell::text("Closed")],
                vec![Cell::Int(3), Cell::Int(1), Cell::text("Y"), Cell::text("Connect"), Cell::Empty, Cell::text("Closed")],
            ],
        )
    }

    #[test]
    fn test_dashboard_labels() {
        let report = run_pipeline(&create_test_table(), SchemaMapping::lead_status(), Some("X")).unwrap();
        let text = render_dashboard(&report, 20);

        assert!(text.starts_with(TITLE));
        assert!(text.contains("Campaign: X"));
        assert!(text.contains("1st Attempt Status"));
        assert!(text.contains("Non-Connect"));
        assert!(text.contains("50.0%"));
        assert!(text.contains("Total NC Base"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("Attempt Bucket – Final Non Connect"));
        assert!(text.contains(&format!("1 | {} 1", "█".repeat(20))));
    }

    #[test]
    fn test_dashboard_empty_base_shows_bare_zero() {
        let report = run_pipeline(&create_test_table(), SchemaMapping::lead_status(), Some("Z")).unwrap();
        let text = render_dashboard(&report, 20);
        assert!(text.contains("0%"));
        assert!(!text.contains("0.0%"));
        assert!(text.contains("(no unresolved leads)"));
    }

    #[test]
    fn test_bar_chart_scaling() {
        let buckets = vec![
            BucketCount { bucket: "1".to_string(), leads: 10 },
            BucketCount { bucket: "2".to_string(), leads: 5 },
            BucketCount { bucket: ">=3".to_string(), leads: 0 },
            BucketCount { bucket: "x".to_string(), leads: 1 },
        ];
        let chart = bar_chart(&buckets, 10);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "  1 | ██████████ 10");
        assert_eq!(lines[1], "  2 | █████ 5");
        assert_eq!(lines[2], ">=3 | 0");
        // Small counts keep a visible bar
        assert_eq!(lines[3], "  x | █ 1");
    }

    #[test]
    fn test_empty_chart() {
        assert_eq!(bar_chart(&[], 10), "(no unresolved leads)\n");
    }

    #[test]
    fn test_raw_view_adds_derived_bucket() {
        let table = create_test_table();
        let dataset = Dataset::ingest(&table, SchemaMapping::lead_status()).unwrap();
        let rows = dataset.filter("X");
        let raw = render_raw(&table, dataset.mapping(), &rows);

        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines[0], "View Filtered Raw Data");
        assert!(lines[2].ends_with("Attempt Bucket"));
        assert!(raw.contains("(3 rows)"));
        assert!(!raw.contains(" Y "));
    }

    #[test]
    fn test_render_json() {
        let report = run_pipeline(&create_test_table(), SchemaMapping::lead_status(), Some("X")).unwrap();
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["campaign"], "X");
        assert_eq!(value["first_attempt"]["total"], 2);
        assert_eq!(value["second_attempt"]["rate"], 100.0);
        assert_eq!(value["buckets"][0]["bucket"], "1");
        assert_eq!(value["buckets"][0]["leads"], 1);
    }
}
