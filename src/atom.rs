//! Particle, spun-particle, particle-group, and atom data model.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::types::{Address, AtomId, ParticleId, Spin};

/// Opaque content-addressed resource-claim unit.
///
/// Equality and hashing are by [`ParticleId`] only: identity follows the
/// content hash, never the referencing atom or the Rust allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    /// Content hash of the particle.
    pub id: ParticleId,
    /// Addresses this particle is shardable to.
    pub addresses: Vec<Address>,
    /// Opaque serialized particle content.
    pub payload: Vec<u8>,
}

impl PartialEq for Particle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Particle {}

impl Hash for Particle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Particle {
    /// Returns true when the particle is routable to `address`.
    pub fn is_affiliated_with(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }
}

/// A particle paired with the direction it is claimed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpunParticle {
    /// The claimed particle.
    pub particle: Particle,
    /// Claim direction.
    pub spin: Spin,
}

impl SpunParticle {
    /// Claims `particle` at [`Spin::Up`].
    pub fn up(particle: Particle) -> Self {
        Self {
            particle,
            spin: Spin::Up,
        }
    }

    /// Claims `particle` at [`Spin::Down`].
    pub fn down(particle: Particle) -> Self {
        Self {
            particle,
            spin: Spin::Down,
        }
    }
}

/// Ordered, non-empty batch of spun particles applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleGroup {
    particles: Vec<SpunParticle>,
}

impl ParticleGroup {
    /// Constructs a group from its spun particles.
    ///
    /// # Panics
    ///
    /// Panics when `particles` is empty: an empty group is an upstream
    /// contract violation, not a recoverable condition.
    pub fn new(particles: Vec<SpunParticle>) -> Self {
        assert!(!particles.is_empty(), "particle group must be non-empty");
        Self { particles }
    }

    /// Spun particles in application order.
    pub fn particles(&self) -> &[SpunParticle] {
        &self.particles
    }
}

/// Content-addressed ledger entry: an ordered sequence of particle groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    /// Content hash of the atom.
    pub id: AtomId,
    /// Particle groups in application order.
    pub groups: Vec<ParticleGroup>,
}

impl Atom {
    /// Constructs an atom from its content hash and groups.
    pub fn new(id: AtomId, groups: Vec<ParticleGroup>) -> Self {
        Self { id, groups }
    }

    /// Iterates every spun particle across all groups, in order.
    pub fn spun_particles(&self) -> impl Iterator<Item = &SpunParticle> {
        self.groups.iter().flat_map(|g| g.particles().iter())
    }

    /// Particle identities this atom claims at `spin`.
    pub fn particles_with_spin(&self, spin: Spin) -> impl Iterator<Item = &Particle> {
        self.spun_particles()
            .filter(move |sp| sp.spin == spin)
            .map(|sp| &sp.particle)
    }

    /// De-duplicated set of addresses affiliated with this atom's particles.
    pub fn addresses(&self) -> Vec<Address> {
        let mut out = Vec::new();
        for sp in self.spun_particles() {
            for addr in &sp.particle.addresses {
                if !out.contains(addr) {
                    out.push(addr.clone());
                }
            }
        }
        out
    }

    /// Returns true when any particle in the atom is routable to `address`.
    pub fn is_affiliated_with(&self, address: &Address) -> bool {
        self.spun_particles()
            .any(|sp| sp.particle.is_affiliated_with(address))
    }
}
