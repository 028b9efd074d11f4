//! Metrics collection for Curator operations

use std::collections::HashMap;
use trellis_domain::{DiscoveryMethod, UpsertOutcome};

/// Metrics collected during Curator operations
///
/// Tracks upsert outcomes per discovery method, per-item failures, and run
/// counts.
#[derive(Debug, Clone, Default)]
pub struct CuratorMetrics {
    /// Edges inserted per discovery method
    pub inserted: HashMap<DiscoveryMethod, usize>,

    /// Edges strengthened per discovery method
    pub merged: HashMap<DiscoveryMethod, usize>,

    /// Candidates that left the graph unchanged
    pub unchanged: usize,

    /// Candidates computed but not written (dry run)
    pub skipped: usize,

    /// Items that failed without aborting their batch
    pub failures: usize,

    /// Link runs completed
    pub link_runs: usize,

    /// Discovery runs completed
    pub discovery_runs: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl CuratorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one upsert
    pub fn record_outcome(&mut self, method: DiscoveryMethod, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => *self.inserted.entry(method).or_insert(0) += 1,
            UpsertOutcome::Merged => *self.merged.entry(method).or_insert(0) += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Record a candidate held back by dry run
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a failed item
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Record a link run completion
    pub fn record_link_run(&mut self) {
        self.link_runs += 1;
    }

    /// Record a discovery run completion
    pub fn record_discovery_run(&mut self) {
        self.discovery_runs += 1;
    }

    /// Get total edges inserted across all methods
    pub fn total_inserted(&self) -> usize {
        self.inserted.values().sum()
    }

    /// Get total edges merged across all methods
    pub fn total_merged(&self) -> usize {
        self.merged.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Curator Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Link runs: {}", self.link_runs),
            format!("Discovery runs: {}", self.discovery_runs),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        for (title, counts, total) in [
            ("Inserted by method:", &self.inserted, self.total_inserted()),
            ("Merged by method:", &self.merged, self.total_merged()),
        ] {
            if counts.is_empty() {
                continue;
            }
            lines.push(title.to_string());
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort_by_key(|(method, _)| method.as_str());
            for (method, count) in sorted {
                lines.push(format!("  {}: {}", method, count));
            }
            lines.push(format!("  Total: {}", total));
            lines.push(String::new());
        }

        lines.push(format!("Unchanged: {}", self.unchanged));
        if self.skipped > 0 {
            lines.push(format!("Skipped (dry run): {}", self.skipped));
        }
        lines.push(format!("Failures: {}", self.failures));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CuratorMetrics::new();
        assert_eq!(metrics.total_inserted(), 0);
        assert_eq!(metrics.total_merged(), 0);
        assert_eq!(metrics.link_runs, 0);
    }

    #[test]
    fn test_record_outcomes() {
        let mut metrics = CuratorMetrics::new();
        metrics.record_outcome(DiscoveryMethod::Pattern, UpsertOutcome::Inserted);
        metrics.record_outcome(DiscoveryMethod::Pattern, UpsertOutcome::Inserted);
        metrics.record_outcome(DiscoveryMethod::Similarity, UpsertOutcome::Inserted);
        metrics.record_outcome(DiscoveryMethod::Transitive, UpsertOutcome::Merged);
        metrics.record_outcome(DiscoveryMethod::Transitive, UpsertOutcome::Unchanged);

        assert_eq!(metrics.inserted[&DiscoveryMethod::Pattern], 2);
        assert_eq!(metrics.total_inserted(), 3);
        assert_eq!(metrics.total_merged(), 1);
        assert_eq!(metrics.unchanged, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = CuratorMetrics::new();
        metrics.record_outcome(DiscoveryMethod::Pattern, UpsertOutcome::Inserted);
        metrics.record_failure();
        metrics.record_link_run();

        metrics.reset();

        assert_eq!(metrics.total_inserted(), 0);
        assert_eq!(metrics.failures, 0);
        assert_eq!(metrics.link_runs, 0);
    }

    #[test]
    fn test_summary() {
        let mut metrics = CuratorMetrics::new();
        metrics.record_outcome(DiscoveryMethod::Pattern, UpsertOutcome::Inserted);
        metrics.record_outcome(DiscoveryMethod::Transitive, UpsertOutcome::Merged);
        metrics.record_failure();
        metrics.record_discovery_run();
        metrics.total_runtime_ms = 120;

        let summary = metrics.summary();
        assert!(summary.contains("Discovery runs: 1"));
        assert!(summary.contains("Total runtime: 120ms"));
        assert!(summary.contains("pattern: 1"));
        assert!(summary.contains("transitive: 1"));
        assert!(summary.contains("Failures: 1"));
        assert!(!summary.contains("dry run"));
    }
}
