// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Write-path resource budgets
//!
//! The writer buffers documents in memory before committing a segment, so
//! both the writer heap and the cumulative payload of a single ingestion
//! batch are bounded. Exceeding the batch budget rejects the batch before
//! anything is added.

use crate::errors::{Error, Result};

/// Default budget for the writer heap and for one ingestion batch
pub const DEFAULT_BUDGET_BYTES: u64 = 50_000_000;

/// Resource limits for one index context
#[derive(Debug, Clone, Copy)]
pub struct IndexLimits {
    /// Heap budget handed to the underlying index writer, in bytes
    pub writer_heap_bytes: u64,
    /// Maximum cumulative document payload per ingestion batch, in bytes
    pub batch_budget_bytes: u64,
}

impl Default for IndexLimits {
    fn default() -> Self {
        Self {
            writer_heap_bytes: DEFAULT_BUDGET_BYTES,
            batch_budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }
}

impl IndexLimits {
    /// Create limits with a custom batch budget
    pub fn with_batch_budget(batch_budget_bytes: u64) -> Self {
        Self {
            batch_budget_bytes,
            ..Default::default()
        }
    }

    /// Check a batch payload against the budget
    pub fn check_batch(&self, payload_bytes: u64) -> Result<()> {
        if payload_bytes > self.batch_budget_bytes {
            return Err(Error::BudgetExceeded {
                got: payload_bytes,
                budget: self.batch_budget_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let limits = IndexLimits::default();
        assert_eq!(limits.writer_heap_bytes, 50_000_000);
        assert_eq!(limits.batch_budget_bytes, 50_000_000);
    }

    #[test]
    fn test_check_batch_within_budget() {
        let limits = IndexLimits::default();
        assert!(limits.check_batch(49_999_999).is_ok());
        assert!(limits.check_batch(50_000_000).is_ok());
    }

    #[test]
    fn test_check_batch_exceeds_budget() {
        let limits = IndexLimits::with_batch_budget(1_000);
        let err = limits.check_batch(1_001).unwrap_err();
        assert!(err.to_string().contains("budget"));
    }
}
