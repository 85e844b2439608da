//! Statistics for a finished bulk job
//!
//! This module summarizes the rows of a job and prints the summary.

use crate::batch::ResultRow;
use std::collections::HashMap;

/// Bulk job statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatistics {
    /// Number of rows recorded
    pub total: u64,

    /// Rows with extracted values
    pub succeeded: u64,

    /// Rows holding a failure message
    pub failed: u64,

    /// Distinct failure messages and their counts, most frequent first
    pub errors: Vec<(String, u64)>,
}

impl JobStatistics {
    /// Computes statistics from the rows of a job
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        let mut succeeded = 0;

        for row in rows {
            match &row.error {
                None => succeeded += 1,
                Some(message) => *counts.entry(message.as_str()).or_insert(0) += 1,
            }
        }

        let mut errors: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(message, count)| (message.to_string(), count))
            .collect();
        // Ties broken by message so the output is stable
        errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total = rows.len() as u64;
        Self {
            total,
            succeeded,
            failed: total - succeeded,
            errors,
        }
    }

    /// Percentage of rows that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            (self.succeeded as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &JobStatistics) {
    println!("=== Extraction Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs: {}", stats.total);
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed);
    println!();

    if !stats.errors.is_empty() {
        println!("Error Summary:");
        for (message, count) in &stats.errors {
            println!("  {}: {}", message, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs successfully extracted)",
        stats.success_rate(),
        stats.succeeded,
        stats.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedFields;

    #[test]
    fn test_statistics_from_rows() {
        let names = ["title"];
        let rows = vec![
            ResultRow::success("https://a.example/", ExtractedFields::new()),
            ResultRow::failure("https://b.example/", &names, "HTTP 404"),
            ResultRow::failure("https://c.example/", &names, "Extraction timed out after 60s"),
            ResultRow::failure("https://d.example/", &names, "HTTP 404"),
        ];

        let stats = JobStatistics::from_rows(&rows);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 3);
        assert_eq!(
            stats.errors,
            vec![
                ("HTTP 404".to_string(), 2),
                ("Extraction timed out after 60s".to_string(), 1),
            ]
        );
        assert_eq!(stats.success_rate(), 25.0);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = JobStatistics::from_rows(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.errors.is_empty());
        assert_eq!(stats.success_rate(), 0.0);
    }
}
