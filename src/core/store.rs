use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::{HashMap, HashSet};

use crate::{
    atom::{Atom, Particle, ParticleGroup},
    observation::{AtomObservation, NotifyMode},
    subs::{Multicast, Subscription},
    types::{Address, AtomId, DraftId, ParticleId, Spin},
};

use super::{indices::SpinIndex, staging::StagingArea};

/// Default live-event buffer size per address channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Client-side particle ledger cache.
///
/// Reconciles a stream of possibly duplicated, conflicting, or speculative
/// atom observations into a consistent view of which particles are
/// currently unspent, and carries isolated per-draft staging overlays for
/// transaction building. Single logical writer: every mutating call
/// updates the observation ledger, spin index, and staging overlays as one
/// unit.
#[derive(Debug)]
pub struct AtomStore {
    ledger: HashMap<AtomId, AtomObservation>,
    index: SpinIndex,
    staging: StagingArea,
    synced: HashMap<Address, u64>,
    observation_channels: HashMap<Address, Multicast<AtomObservation>>,
    sync_channels: HashMap<Address, Multicast<u64>>,
    event_capacity: usize,
}

impl Default for AtomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            ledger: HashMap::new(),
            index: SpinIndex::new(),
            staging: StagingArea::new(),
            synced: HashMap::new(),
            observation_channels: HashMap::new(),
            sync_channels: HashMap::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Creates a store seeded with genesis observations, applied through
    /// the normal ingestion path.
    pub fn with_genesis(genesis: impl IntoIterator<Item = (AtomObservation, Address)>) -> Self {
        let mut store = Self::new();
        for (observation, address) in genesis {
            store.ingest(observation, &address, NotifyMode::all());
        }
        store
    }

    /// Overrides the live-event buffer size used for channels created after
    /// this call.
    pub fn set_event_capacity(&mut self, capacity: usize) {
        self.event_capacity = capacity;
    }

    /// Ingests one observation for `address`, returning whether it was
    /// included (duplicates and rejected downgrades return `false`).
    ///
    /// Runs the idempotence check, acceptance classification, spin-index
    /// update, conflict resolution, ledger write, and fan-out per `notify`,
    /// in that order.
    pub fn ingest(
        &mut self,
        observation: AtomObservation,
        address: &Address,
        notify: NotifyMode,
    ) -> bool {
        if let AtomObservation::Head { received_at } = observation {
            self.synced.insert(address.clone(), received_at);
            if notify.sync {
                if let Some(channel) = self.sync_channels.get(address) {
                    channel.publish(received_at);
                }
            }
            return false;
        }

        let Some(atom) = observation.atom().cloned() else {
            return false; // Head handled above
        };

        let prior = self.ledger.get(&atom.id);
        if prior.is_some_and(|p| p.same_value(&observation)) {
            return false;
        }

        let include = match prior {
            None => observation.is_stored(),
            Some(prior) => {
                (!observation.is_soft() || prior.is_soft())
                    && prior.observation_type() != observation.observation_type()
            }
        };
        if !include {
            return false;
        }

        let prior_was_stored = prior.is_some_and(AtomObservation::is_stored);

        if observation.is_stored() {
            for sp in atom.spun_particles() {
                self.index.record(&sp.particle, sp.spin, atom.id);
            }
            if !observation.is_soft() {
                self.resolve_conflicts(&atom);
            }
        } else if prior_was_stored {
            // explicit deletion: everything that consumed this atom's
            // outputs goes down with it
            self.cascade_from(&atom);
        }

        self.ledger.insert(atom.id, observation.clone());

        if notify.observation {
            self.publish_observation(address, &observation);
        }
        true
    }

    /// Current observation ledger entry for `atom`.
    pub fn observation(&self, atom: AtomId) -> Option<&AtomObservation> {
        self.ledger.get(&atom)
    }

    /// True when a Head marker has been ingested for `address`.
    pub fn is_synced(&self, address: &Address) -> bool {
        self.synced.contains_key(address)
    }

    /// Particles currently spendable at `address`.
    ///
    /// A particle is available iff some Stored atom claims it Up and no
    /// Stored atom claims it Down. When `draft` is supplied, that draft's
    /// overlay subtracts its Down claims and adds its Up claims; other
    /// drafts never leak in. The result is de-duplicated by particle
    /// identity, in unspecified order.
    pub fn up_particles(&self, address: &Address, draft: Option<DraftId>) -> Vec<Particle> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for particle in self.index.particles_claimed_up() {
            if !particle.is_affiliated_with(address) {
                continue;
            }
            if !self.is_available(particle.id) {
                continue;
            }
            if let Some(d) = draft {
                if self.staging.staged_spin(d, particle.id) == Some(Spin::Down) {
                    continue;
                }
            }
            if seen.insert(particle.id) {
                out.push(particle.clone());
            }
        }

        if let Some(d) = draft {
            for particle in self.staging.staged_particles(d, Spin::Up) {
                if particle.is_affiliated_with(address) && seen.insert(particle.id) {
                    out.push(particle.clone());
                }
            }
        }

        out
    }

    /// Appends `group` to the draft identified by `draft`.
    pub fn stage(&mut self, draft: DraftId, group: ParticleGroup) {
        self.staging.stage(draft, group);
    }

    /// Removes and returns the draft's accumulated groups; `None` when
    /// nothing was staged for that id.
    pub fn clear_draft(&mut self, draft: DraftId) -> Option<Vec<ParticleGroup>> {
        self.staging.clear(draft)
    }

    /// Opens a replay-capable observation channel for `address`.
    ///
    /// Replays every currently Stored observation (soft or hard) whose atom
    /// is affiliated with the address, then delivers live events. Multiple
    /// subscribers are independent; dropping one does not affect others.
    pub fn atom_observations(&mut self, address: &Address) -> Subscription<AtomObservation> {
        let replay: Vec<AtomObservation> = self
            .ledger
            .values()
            .filter(|obs| obs.is_stored())
            .filter(|obs| obs.atom().is_some_and(|a| a.is_affiliated_with(address)))
            .cloned()
            .collect();
        let capacity = self.event_capacity;
        self.observation_channels
            .entry(address.clone())
            .or_insert_with(|| Multicast::new(capacity))
            .subscribe_with(replay)
    }

    /// Opens a replay-capable sync channel for `address`.
    ///
    /// Emits the Head timestamp each time one is ingested for the address;
    /// if the address is already synchronized, the last timestamp is
    /// delivered immediately.
    pub fn on_sync(&mut self, address: &Address) -> Subscription<u64> {
        let replay: Vec<u64> = self.synced.get(address).copied().into_iter().collect();
        let capacity = self.event_capacity;
        self.sync_channels
            .entry(address.clone())
            .or_insert_with(|| Multicast::new(capacity))
            .subscribe_with(replay)
    }

    fn is_currently_stored(&self, atom: AtomId) -> bool {
        self.ledger.get(&atom).is_some_and(AtomObservation::is_stored)
    }

    fn is_available(&self, particle: ParticleId) -> bool {
        let created = self
            .index
            .atoms_claiming(particle, Spin::Up)
            .any(|id| self.is_currently_stored(id));
        if !created {
            return false;
        }
        !self
            .index
            .atoms_claiming(particle, Spin::Down)
            .any(|id| self.is_currently_stored(id))
    }

    /// Last-hard-writer-wins: every other Stored atom claiming any of the
    /// winner's (particle, spin) pairs is soft-deleted, together with all
    /// transitive dependents.
    fn resolve_conflicts(&mut self, winner: &Atom) {
        let now = now_ms();
        let mut visited = HashSet::new();
        visited.insert(winner.id);
        for sp in winner.spun_particles() {
            let competitors: Vec<AtomId> = self
                .index
                .atoms_claiming(sp.particle.id, sp.spin)
                .filter(|id| *id != winner.id)
                .collect();
            for competitor in competitors {
                if self.is_currently_stored(competitor) {
                    self.soft_delete_with_dependents(competitor, now, &mut visited);
                }
            }
        }
    }

    /// Cascade triggered by an explicit deletion of `atom`: its dependents
    /// are soft-deleted; the atom's own entry is replaced by the incoming
    /// Deleted observation afterwards.
    fn cascade_from(&mut self, atom: &Atom) {
        let now = now_ms();
        let mut visited = HashSet::new();
        visited.insert(atom.id);
        self.soft_delete_dependents_of(atom.clone(), now, &mut visited);
    }

    /// Leaves before ancestors: dependents are fully resolved before the
    /// atom itself is marked, so the cascade never re-reads a half-mutated
    /// graph. The visited set guarantees termination.
    fn soft_delete_with_dependents(
        &mut self,
        id: AtomId,
        now: u64,
        visited: &mut HashSet<AtomId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(atom) = self.ledger.get(&id).and_then(AtomObservation::atom).cloned() else {
            return;
        };
        self.soft_delete_dependents_of(atom.clone(), now, visited);
        self.mark_soft_deleted(atom, now);
    }

    fn soft_delete_dependents_of(
        &mut self,
        atom: Atom,
        now: u64,
        visited: &mut HashSet<AtomId>,
    ) {
        for particle in atom.particles_with_spin(Spin::Up) {
            let dependents: Vec<AtomId> =
                self.index.atoms_claiming(particle.id, Spin::Down).collect();
            for dependent in dependents {
                if self.is_currently_stored(dependent) {
                    self.soft_delete_with_dependents(dependent, now, visited);
                }
            }
        }
    }

    fn mark_soft_deleted(&mut self, atom: Atom, now: u64) {
        let id = atom.id;
        let addresses = atom.addresses();
        let deleted = AtomObservation::soft_deleted(atom, now);
        self.ledger.insert(id, deleted.clone());
        for address in addresses {
            self.publish_observation(&address, &deleted);
        }
    }

    fn publish_observation(&self, address: &Address, observation: &AtomObservation) {
        if let Some(channel) = self.observation_channels.get(address) {
            channel.publish(observation.clone());
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
