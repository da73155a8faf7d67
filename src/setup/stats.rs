//! Load statistics tracking.

use std::fmt;

/// Outcome of loading one CSV file into its table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Target table name.
    pub table: &'static str,
    /// Data rows read from the file (header excluded).
    pub rows_read: usize,
    /// Number of insert statements executed.
    pub batches: usize,
    /// Rows actually written; primary-key conflicts are not counted.
    pub rows_inserted: usize,
    /// Rows in which at least one numeric field was replaced by `NULL`.
    pub rows_with_coerced_fields: usize,
}

impl LoadSummary {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    /// Rows dropped by `ON CONFLICT DO NOTHING`.
    pub fn rows_skipped(&self) -> usize {
        self.rows_read.saturating_sub(self.rows_inserted)
    }

    /// Fold the result of one executed batch into the totals.
    pub fn record_batch(&mut self, inserted: u64) {
        self.batches += 1;
        self.rows_inserted += inserted as usize;
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rows read, {} inserted, {} skipped in {} batches",
            self.table,
            self.rows_read,
            self.rows_inserted,
            self.rows_skipped(),
            self.batches
        )?;
        if self.rows_with_coerced_fields > 0 {
            write!(
                f,
                " ({} rows had unparseable numbers stored as NULL)",
                self.rows_with_coerced_fields
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_rows_are_the_difference() {
        let mut summary = LoadSummary::new("users");
        summary.rows_read = 2500;
        summary.record_batch(1000);
        summary.record_batch(900);
        summary.record_batch(500);

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.rows_inserted, 2400);
        assert_eq!(summary.rows_skipped(), 100);
    }

    #[test]
    fn display_mentions_coercions_only_when_present() {
        let mut summary = LoadSummary::new("orders");
        summary.rows_read = 3;
        summary.record_batch(3);
        assert_eq!(
            summary.to_string(),
            "orders: 3 rows read, 3 inserted, 0 skipped in 1 batches"
        );

        summary.rows_with_coerced_fields = 1;
        assert!(summary.to_string().ends_with("(1 rows had unparseable numbers stored as NULL)"));
    }
}
