use crate::images::RewriteOutcome;
use std::fmt::{Display, Formatter};

/// Per-run counters. Every skipped unit of work lands in one of these, so a
/// run's outcome is always accounted for instead of silently dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub articles_stored: u64,
    /// Titles already present in the store (normal skips).
    pub duplicates: u64,
    /// Units abandoned after network retries were exhausted.
    pub skipped_network: u64,
    /// Units whose source markup or embedded JSON was not in the expected
    /// shape.
    pub skipped_malformed: u64,
    /// Store-level failures on individual records.
    pub store_errors: u64,
    pub images_stored: u64,
    pub images_skipped: u64,
    pub profiles_stored: u64,
}

impl RunReport {
    pub fn merge(&mut self, other: &RunReport) {
        self.articles_stored += other.articles_stored;
        self.duplicates += other.duplicates;
        self.skipped_network += other.skipped_network;
        self.skipped_malformed += other.skipped_malformed;
        self.store_errors += other.store_errors;
        self.images_stored += other.images_stored;
        self.images_skipped += other.images_skipped;
        self.profiles_stored += other.profiles_stored;
    }

    pub fn absorb_rewrite(&mut self, outcome: RewriteOutcome) {
        self.images_stored += outcome.stored as u64;
        self.images_skipped += outcome.skipped as u64;
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "articles stored: {}, duplicates: {}, skipped (network): {}, \
             skipped (malformed): {}, store errors: {}, images stored: {}, \
             images skipped: {}, profiles stored: {}",
            self.articles_stored,
            self.duplicates,
            self.skipped_network,
            self.skipped_malformed,
            self.store_errors,
            self.images_stored,
            self.images_skipped,
            self.profiles_stored
        )
    }
}
