//! Spin index: secondary index from (particle, spin) to claiming atoms.

use hashbrown::{HashMap, HashSet};

use crate::{
    atom::Particle,
    types::{AtomId, ParticleId, Spin},
};

/// Append-mostly index of which atoms claim which particles at which spin,
/// plus the particle table backing availability queries.
///
/// The index never removes entries on its own: atoms whose observation was
/// superseded are filtered against the ledger at query time, so stale ids
/// here are expected and harmless.
#[derive(Debug, Default)]
pub struct SpinIndex {
    claims: HashMap<(ParticleId, Spin), HashSet<AtomId>>,
    particles: HashMap<ParticleId, Particle>,
}

impl SpinIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `atom` claims `particle` at `spin`.
    pub fn record(&mut self, particle: &Particle, spin: Spin, atom: AtomId) {
        self.claims
            .entry((particle.id, spin))
            .or_default()
            .insert(atom);
        self.particles
            .entry(particle.id)
            .or_insert_with(|| particle.clone());
    }

    /// Atoms currently recorded as claiming (`particle`, `spin`).
    ///
    /// May contain atoms whose observation has since been superseded;
    /// callers filter against the observation ledger.
    pub fn atoms_claiming(&self, particle: ParticleId, spin: Spin) -> impl Iterator<Item = AtomId> {
        self.claims
            .get(&(particle, spin))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All recorded claims on `particle`, keyed by spin.
    pub fn spins_claimed(&self, particle: ParticleId) -> HashMap<Spin, HashSet<AtomId>> {
        let mut out = HashMap::new();
        for spin in [Spin::Up, Spin::Down] {
            if let Some(set) = self.claims.get(&(particle, spin)) {
                out.insert(spin, set.clone());
            }
        }
        out
    }

    /// Looks up a particle by identity.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(&id)
    }

    /// Iterates every particle that has at least one recorded Up claim.
    pub fn particles_claimed_up(&self) -> impl Iterator<Item = &Particle> {
        self.claims
            .keys()
            .filter(|(_, spin)| *spin == Spin::Up)
            .filter_map(|(pid, _)| self.particles.get(pid))
    }
}
