use atomstore::{
    atom::{Atom, Particle, ParticleGroup, SpunParticle},
    core::store::AtomStore,
    observation::{AtomObservation, NotifyMode, ObservationType},
    types::{Address, AtomId, ParticleId},
};

fn addr(s: &str) -> Address {
    Address::new(s)
}

fn particle(id: u8, address: &str) -> Particle {
    Particle {
        id: ParticleId([id; 32]),
        addresses: vec![addr(address)],
        payload: vec![id],
    }
}

fn atom(id: u8, claims: Vec<SpunParticle>) -> Atom {
    Atom::new(AtomId([id; 32]), vec![ParticleGroup::new(claims)])
}

fn obs_type(store: &AtomStore, id: u8) -> Option<ObservationType> {
    store
        .observation(AtomId([id; 32]))
        .and_then(AtomObservation::observation_type)
}

#[test]
fn hard_store_soft_deletes_competing_soft_store() {
    let mut store = AtomStore::new();
    let address = addr("alice");
    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(2, vec![SpunParticle::up(particle(10, "alice"))]);

    assert!(store.ingest(AtomObservation::soft_stored(a, 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));

    assert_eq!(obs_type(&store, 1), Some(ObservationType::DeletedSoft));
    assert_eq!(obs_type(&store, 2), Some(ObservationType::StoredHard));

    let up = store.up_particles(&address, None);
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].id, ParticleId([10; 32]));
}

#[test]
fn last_hard_writer_wins_between_two_hard_stores() {
    let mut store = AtomStore::new();
    let address = addr("alice");
    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(2, vec![SpunParticle::up(particle(10, "alice"))]);

    assert!(store.ingest(AtomObservation::stored(a, 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));

    assert_eq!(obs_type(&store, 1), Some(ObservationType::DeletedSoft));
    assert_eq!(obs_type(&store, 2), Some(ObservationType::StoredHard));
}

#[test]
fn cascading_invalidation_reaches_dependents_of_the_loser() {
    let mut store = AtomStore::new();
    let address = addr("alice");

    // A produces p; B consumes p and produces q; A' double-claims p.
    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(
        2,
        vec![
            SpunParticle::down(particle(10, "alice")),
            SpunParticle::up(particle(11, "alice")),
        ],
    );
    let a_prime = atom(3, vec![SpunParticle::up(particle(10, "alice"))]);

    assert!(store.ingest(AtomObservation::stored(a, 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));
    assert!(store.up_particles(&address, None).iter().any(|p| p.id == ParticleId([11; 32])));

    assert!(store.ingest(AtomObservation::stored(a_prime, 3), &address, NotifyMode::all()));

    assert_eq!(obs_type(&store, 1), Some(ObservationType::DeletedSoft));
    assert_eq!(obs_type(&store, 2), Some(ObservationType::DeletedSoft));
    assert_eq!(obs_type(&store, 3), Some(ObservationType::StoredHard));

    // q vanished with B; A''s p is the only survivor
    let up = store.up_particles(&address, None);
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].id, ParticleId([10; 32]));
}

#[test]
fn explicit_deletion_cascades_to_dependents() {
    let mut store = AtomStore::new();
    let address = addr("alice");

    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(
        2,
        vec![
            SpunParticle::down(particle(10, "alice")),
            SpunParticle::up(particle(11, "alice")),
        ],
    );

    assert!(store.ingest(AtomObservation::stored(a.clone(), 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::deleted(a, 3), &address, NotifyMode::all()));

    // the explicitly deleted atom keeps the incoming hard deletion, its
    // dependent is soft-deleted by the cascade
    assert_eq!(obs_type(&store, 1), Some(ObservationType::DeletedHard));
    assert_eq!(obs_type(&store, 2), Some(ObservationType::DeletedSoft));
    assert!(store.up_particles(&address, None).is_empty());
}

#[test]
fn cascade_runs_leaves_before_ancestors_through_a_chain() {
    let mut store = AtomStore::new();
    let address = addr("alice");

    // chain: A creates p10, B spends p10 and creates p11, C spends p11
    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(
        2,
        vec![
            SpunParticle::down(particle(10, "alice")),
            SpunParticle::up(particle(11, "alice")),
        ],
    );
    let c = atom(
        3,
        vec![
            SpunParticle::down(particle(11, "alice")),
            SpunParticle::up(particle(12, "alice")),
        ],
    );
    let a_prime = atom(4, vec![SpunParticle::up(particle(10, "alice"))]);

    for (id, obs) in [(1u8, a), (2, b), (3, c)] {
        assert!(store.ingest(AtomObservation::stored(obs, u64::from(id)), &address, NotifyMode::all()));
    }
    assert!(store.ingest(AtomObservation::stored(a_prime, 4), &address, NotifyMode::all()));

    for id in 1u8..=3 {
        assert_eq!(obs_type(&store, id), Some(ObservationType::DeletedSoft), "atom {id}");
    }
    let up = store.up_particles(&address, None);
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].id, ParticleId([10; 32]));
}

#[test]
fn cascade_deletions_are_delivered_to_affiliated_subscribers() {
    let mut store = AtomStore::new();
    let address = addr("alice");
    let mut sub = store.atom_observations(&address);

    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(2, vec![SpunParticle::up(particle(10, "alice"))]);

    assert!(store.ingest(AtomObservation::soft_stored(a, 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));

    let mut seen = Vec::new();
    while let Some(obs) = sub.try_recv() {
        seen.push((obs.atom_id(), obs.observation_type()));
    }
    assert!(seen.contains(&(Some(AtomId([1; 32])), Some(ObservationType::StoredSoft))));
    assert!(seen.contains(&(Some(AtomId([1; 32])), Some(ObservationType::DeletedSoft))));
    assert!(seen.contains(&(Some(AtomId([2; 32])), Some(ObservationType::StoredHard))));
}

#[test]
fn unrelated_spins_do_not_conflict() {
    let mut store = AtomStore::new();
    let address = addr("alice");

    // consuming a particle is not a double-claim against its creator
    let a = atom(1, vec![SpunParticle::up(particle(10, "alice"))]);
    let b = atom(2, vec![SpunParticle::down(particle(10, "alice"))]);

    assert!(store.ingest(AtomObservation::stored(a, 1), &address, NotifyMode::all()));
    assert!(store.ingest(AtomObservation::stored(b, 2), &address, NotifyMode::all()));

    assert_eq!(obs_type(&store, 1), Some(ObservationType::StoredHard));
    assert_eq!(obs_type(&store, 2), Some(ObservationType::StoredHard));
    assert!(store.up_particles(&address, None).is_empty());
}
