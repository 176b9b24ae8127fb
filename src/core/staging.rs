//! Per-draft staging overlays for uncommitted transaction building.

use hashbrown::HashMap;

use crate::{
    atom::{Particle, ParticleGroup},
    types::{DraftId, ParticleId, Spin},
};

/// One draft's accumulated groups and its particle-claim overlay.
#[derive(Debug, Default)]
struct Draft {
    groups: Vec<ParticleGroup>,
    overlay: HashMap<ParticleId, (Spin, Particle)>,
}

/// Isolated staging overlays, keyed by caller-chosen draft id.
///
/// Claims staged under one draft id are invisible to every other draft id
/// and to the committed view.
#[derive(Debug, Default)]
pub struct StagingArea {
    drafts: HashMap<DraftId, Draft>,
}

impl StagingArea {
    /// Creates an empty staging area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `group` to the draft and folds its claims into the overlay.
    /// A later claim on the same particle identity overrides an earlier one
    /// within the same draft.
    pub fn stage(&mut self, draft: DraftId, group: ParticleGroup) {
        let entry = self.drafts.entry(draft).or_default();
        for sp in group.particles() {
            entry
                .overlay
                .insert(sp.particle.id, (sp.spin, sp.particle.clone()));
        }
        entry.groups.push(group);
    }

    /// Atomically removes and returns the draft's accumulated groups.
    ///
    /// `None` when nothing was staged under `draft` — a normal outcome,
    /// callers may query before staging anything.
    pub fn clear(&mut self, draft: DraftId) -> Option<Vec<ParticleGroup>> {
        self.drafts.remove(&draft).map(|d| d.groups)
    }

    /// The spin the draft currently claims for `particle`, if any.
    pub fn staged_spin(&self, draft: DraftId, particle: ParticleId) -> Option<Spin> {
        self.drafts
            .get(&draft)
            .and_then(|d| d.overlay.get(&particle))
            .map(|(spin, _)| *spin)
    }

    /// Particles the draft claims at `spin`.
    pub fn staged_particles(&self, draft: DraftId, spin: Spin) -> impl Iterator<Item = &Particle> {
        self.drafts
            .get(&draft)
            .into_iter()
            .flat_map(move |d| {
                d.overlay
                    .values()
                    .filter(move |(s, _)| *s == spin)
                    .map(|(_, p)| p)
            })
    }
}
