//! Atom observation model and notification flags.

use serde::{Deserialize, Serialize};

use crate::{atom::Atom, types::AtomId};

/// A peer-reported fact about an atom's ledger status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomObservation {
    /// The atom is part of the ledger.
    Stored {
        /// The observed atom.
        atom: Atom,
        /// True when the observation is speculative, false when confirmed.
        soft: bool,
        /// Arrival timestamp in milliseconds since epoch.
        received_at: u64,
    },
    /// The atom is no longer part of the ledger.
    Deleted {
        /// The observed atom.
        atom: Atom,
        /// True when the observation is speculative, false when confirmed.
        soft: bool,
        /// Arrival timestamp in milliseconds since epoch.
        received_at: u64,
    },
    /// The feed for an address has reached the live tip. Carries no atom
    /// and never enters the observation ledger.
    Head {
        /// Arrival timestamp in milliseconds since epoch.
        received_at: u64,
    },
}

/// Observation kind crossed with softness, as compared by the acceptance
/// rule ("by type, not value").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationType {
    /// Speculative store.
    StoredSoft,
    /// Confirmed store.
    StoredHard,
    /// Speculative deletion.
    DeletedSoft,
    /// Confirmed deletion.
    DeletedHard,
}

impl AtomObservation {
    /// Confirmed-store constructor.
    pub fn stored(atom: Atom, received_at: u64) -> Self {
        Self::Stored {
            atom,
            soft: false,
            received_at,
        }
    }

    /// Speculative-store constructor.
    pub fn soft_stored(atom: Atom, received_at: u64) -> Self {
        Self::Stored {
            atom,
            soft: true,
            received_at,
        }
    }

    /// Confirmed-deletion constructor.
    pub fn deleted(atom: Atom, received_at: u64) -> Self {
        Self::Deleted {
            atom,
            soft: false,
            received_at,
        }
    }

    /// Speculative-deletion constructor.
    pub fn soft_deleted(atom: Atom, received_at: u64) -> Self {
        Self::Deleted {
            atom,
            soft: true,
            received_at,
        }
    }

    /// Live-tip marker constructor.
    pub fn head(received_at: u64) -> Self {
        Self::Head { received_at }
    }

    /// The atom this observation reports on, when it carries one.
    pub fn atom(&self) -> Option<&Atom> {
        match self {
            Self::Stored { atom, .. } | Self::Deleted { atom, .. } => Some(atom),
            Self::Head { .. } => None,
        }
    }

    /// Identity of the reported atom, when present.
    pub fn atom_id(&self) -> Option<AtomId> {
        self.atom().map(|a| a.id)
    }

    /// True for [`AtomObservation::Stored`].
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    /// True when the observation is speculative.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::Stored { soft: true, .. } | Self::Deleted { soft: true, .. }
        )
    }

    /// Arrival timestamp.
    pub fn received_at(&self) -> u64 {
        match self {
            Self::Stored { received_at, .. }
            | Self::Deleted { received_at, .. }
            | Self::Head { received_at } => *received_at,
        }
    }

    /// Kind-with-softness tag, `None` for [`AtomObservation::Head`].
    pub fn observation_type(&self) -> Option<ObservationType> {
        match self {
            Self::Stored { soft: true, .. } => Some(ObservationType::StoredSoft),
            Self::Stored { soft: false, .. } => Some(ObservationType::StoredHard),
            Self::Deleted { soft: true, .. } => Some(ObservationType::DeletedSoft),
            Self::Deleted { soft: false, .. } => Some(ObservationType::DeletedHard),
            Self::Head { .. } => None,
        }
    }

    /// Value equality ignoring `received_at`, used by the idempotence check.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Stored {
                    atom: a,
                    soft: sa,
                    ..
                },
                Self::Stored {
                    atom: b,
                    soft: sb,
                    ..
                },
            )
            | (
                Self::Deleted {
                    atom: a,
                    soft: sa,
                    ..
                },
                Self::Deleted {
                    atom: b,
                    soft: sb,
                    ..
                },
            ) => sa == sb && a.id == b.id,
            (Self::Head { .. }, Self::Head { .. }) => true,
            _ => false,
        }
    }
}

/// Per-call fan-out flags for [`crate::core::store::AtomStore::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyMode {
    /// Forward atom observations to observation subscribers.
    pub observation: bool,
    /// Forward head markers to sync subscribers.
    pub sync: bool,
}

impl NotifyMode {
    /// Notify both channels.
    pub const fn all() -> Self {
        Self {
            observation: true,
            sync: true,
        }
    }

    /// Notify observation subscribers only.
    pub const fn observation_only() -> Self {
        Self {
            observation: true,
            sync: false,
        }
    }

    /// Notify sync subscribers only.
    pub const fn sync_only() -> Self {
        Self {
            observation: false,
            sync: true,
        }
    }

    /// Suppress all fan-out.
    pub const fn none() -> Self {
        Self {
            observation: false,
            sync: false,
        }
    }
}

impl Default for NotifyMode {
    fn default() -> Self {
        Self::all()
    }
}
