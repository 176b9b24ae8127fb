//! Client-side particle ledger cache for a UTXO-like distributed ledger.
//!
//! Ingests a stream of possibly duplicated, conflicting, or speculative
//! atom observations from untrusted peers and reconciles them into a
//! consistent view of which particles are currently unspent, with
//! isolated per-draft staging overlays and replay-capable per-address
//! subscription channels.
//!
//! # Examples
//!
//! Synchronous usage with [`core::store::AtomStore`]:
//! ```
//! use atomstore::{
//!     atom::{Atom, Particle, ParticleGroup, SpunParticle},
//!     core::store::AtomStore,
//!     observation::{AtomObservation, NotifyMode},
//!     types::{Address, AtomId, ParticleId},
//! };
//!
//! let addr = Address::new("addr-1");
//! let particle = Particle {
//!     id: ParticleId([1; 32]),
//!     addresses: vec![addr.clone()],
//!     payload: vec![],
//! };
//! let atom = Atom::new(
//!     AtomId([2; 32]),
//!     vec![ParticleGroup::new(vec![SpunParticle::up(particle.clone())])],
//! );
//!
//! let mut store = AtomStore::new();
//! let included = store.ingest(AtomObservation::stored(atom, 1), &addr, NotifyMode::all());
//! assert!(included);
//! assert_eq!(store.up_particles(&addr, None), vec![particle]);
//! ```
//!
//! Runtime usage with the single-writer handle:
//! ```
//! use atomstore::{
//!     atom::{Atom, Particle, ParticleGroup, SpunParticle},
//!     core::store::AtomStore,
//!     observation::{AtomObservation, NotifyMode},
//!     runtime::handle::{spawn_atomstore, RuntimeConfig},
//!     types::{Address, AtomId, ParticleId},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let addr = Address::new("addr-1");
//! let particle = Particle {
//!     id: ParticleId([1; 32]),
//!     addresses: vec![addr.clone()],
//!     payload: vec![],
//! };
//! let atom = Atom::new(
//!     AtomId([2; 32]),
//!     vec![ParticleGroup::new(vec![SpunParticle::up(particle)])],
//! );
//!
//! let handle = spawn_atomstore(AtomStore::new(), vec![], RuntimeConfig::default());
//! let included = handle
//!     .ingest(AtomObservation::stored(atom, 1), addr.clone(), NotifyMode::all())
//!     .await
//!     .expect("ingest");
//! assert!(included);
//! assert_eq!(handle.up_particles(addr, None).await.expect("query").len(), 1);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Particle, group, and atom data model.
pub mod atom;
/// Ledger cache, spin index, and staging helpers.
pub mod core;
/// Observation variants and notification flags.
pub mod observation;
/// Single-writer runtime handle.
pub mod runtime;
/// Replay-capable subscription channels.
pub mod subs;
/// Shared primitive identifiers and the spin tag.
pub mod types;
