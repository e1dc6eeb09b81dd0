//! Walk report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters for one recursive walk (`clear`, `chmod`, `copy_to`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSync {
    /// Total visited directory/file/symlink entries.
    pub cnt_scanned: u64,
    /// Files written at destination.
    pub cnt_copied: u64,
    /// Directories created at destination.
    pub cnt_created: u64,
    /// Entries left untouched by policy (existing destination, symlink, special).
    pub cnt_skipped: u64,
    /// Entries removed.
    pub cnt_removed: u64,
    /// Entries whose mode was changed.
    pub cnt_chmod: u64,
}

impl ReportSync {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_created".to_string(), self.cnt_created);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_removed".to_string(), self.cnt_removed);
        dict_counts.insert("cnt_chmod".to_string(), self.cnt_chmod);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} copied={} created={} skipped={} removed={} chmod={}",
            self.cnt_scanned,
            self.cnt_copied,
            self.cnt_created,
            self.cnt_skipped,
            self.cnt_removed,
            self.cnt_chmod
        )
    }
}

impl fmt::Display for ReportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SYNC]"))
    }
}

/// Mutable accumulator for walk statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSyncBuilder {
    report: ReportSync,
}

impl ReportSyncBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    /// Increment created count by one.
    pub fn add_created(&mut self) {
        self.report.cnt_created += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Increment removed count by one.
    pub fn add_removed(&mut self) {
        self.report.cnt_removed += 1;
    }

    /// Increment chmod count by one.
    pub fn add_chmod(&mut self) {
        self.report.cnt_chmod += 1;
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSync {
        self.report
    }
}
