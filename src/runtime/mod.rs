//! Single-writer runtime wrapper around [`crate::core::store::AtomStore`].

/// Runtime handle, spawn function, and configuration.
pub mod handle;
