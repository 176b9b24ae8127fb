//! In-memory particle ledger cache and its index/staging helpers.

/// Spin index secondary index.
pub mod indices;
/// Per-draft staging overlays.
pub mod staging;
/// Observation ledger, conflict resolver, and store orchestration.
pub mod store;
