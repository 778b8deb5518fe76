//! Shared primitive types used across the entire pipeline.

/// A customer key. Generated as a contiguous range starting at 10000.
pub type CustomerId = i64;

/// A transaction key. 1-based and sequential at generation time,
/// unique again after the wrangle stage deduplicates.
pub type TransactionId = i64;
