//! Demo report helpers
//!
//! Gantree: L2_Backend → Reporter
//!
//! Every demo turns counts into a report struct with a `Display` body.
//! The `DemoReport` trait lets a driver print them uniformly and keep a
//! pass/fail summary; the free functions cover the formatting the demos
//! share (percentages, bar charts, top-k tables).

use crate::execution::ExecutionResult;
use std::fmt::{self, Write};

/// Width of a full bar in `bar`
pub const BAR_WIDTH: usize = 40;

/// Common surface of all demo reports
/// Gantree: DemoReport // 데모 결과
pub trait DemoReport: fmt::Display {
    /// Short title for summaries
    fn title(&self) -> String;

    /// Whether the run reproduced the textbook answer
    fn succeeded(&self) -> bool;
}

/// One line of a sweep summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    /// Demo title
    pub title: String,
    /// Pass/fail
    pub succeeded: bool,
}

impl SummaryRow {
    /// Capture a report
    pub fn from_report(report: &dyn DemoReport) -> Self {
        Self {
            title: report.title(),
            succeeded: report.succeeded(),
        }
    }
}

/// Text summary of a sweep
pub fn summary_table(rows: &[SummaryRow]) -> String {
    let mut output = String::new();
    let passed = rows.iter().filter(|r| r.succeeded).count();
    let width = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0);

    // writing to a String cannot fail
    let _ = writeln!(output, "Summary: {}/{} demos succeeded", passed, rows.len());
    for row in rows {
        let _ = writeln!(
            output,
            "  {} {:<width$}",
            check(row.succeeded),
            row.title,
            width = width
        );
    }
    output
}

/// ✓ or ✗
pub fn check(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

/// `count` of `total` as a percentage
pub fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Horizontal bar for a fraction in [0, 1]
pub fn bar(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    "█".repeat(filled)
}

/// Write the `k` most frequent outcomes, one per line, with an optional
/// annotation after each
pub fn write_top_counts(
    f: &mut fmt::Formatter<'_>,
    result: &ExecutionResult,
    k: usize,
    annotate: impl Fn(&str) -> String,
) -> fmt::Result {
    let sorted = result.sorted_counts();
    for (key, count) in sorted.iter().take(k) {
        writeln!(
            f,
            "  {}: {:>5} ({:5.1}%){}",
            key,
            count,
            percent(*count, result.shots),
            annotate(key)
        )?;
    }
    if sorted.len() > k {
        writeln!(f, "  ... and {} more outcomes", sorted.len() - k)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(bool);

    impl fmt::Display for Fixed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fixed")
        }
    }

    impl DemoReport for Fixed {
        fn title(&self) -> String {
            format!("Fixed {}", self.0)
        }

        fn succeeded(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_percent_and_bar() {
        assert!((percent(1, 4) - 25.0).abs() < 1e-12);
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(bar(0.5, 10).chars().count(), 5);
        assert_eq!(bar(2.0, 4).chars().count(), 4);
        assert_eq!(bar(-1.0, 4), "");
    }

    #[test]
    fn test_summary_table() {
        let rows = vec![
            SummaryRow::from_report(&Fixed(true)),
            SummaryRow::from_report(&Fixed(false)),
        ];
        let table = summary_table(&rows);
        assert!(table.starts_with("Summary: 1/2 demos succeeded"));
        assert!(table.contains("✓ Fixed true"));
        assert!(table.contains("✗ Fixed false"));
    }

    #[test]
    fn test_top_counts_overflow_line() {
        struct Top(ExecutionResult);
        impl fmt::Display for Top {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_top_counts(f, &self.0, 1, |k| format!(" <{}>", k))
            }
        }

        let mut counts = HashMap::new();
        counts.insert("01".to_string(), 3);
        counts.insert("10".to_string(), 1);
        let text = Top(ExecutionResult::from_counts(counts, "t")).to_string();
        assert!(text.contains("01:     3 ( 75.0%) <01>"));
        assert!(text.contains("... and 1 more outcomes"));
    }
}
