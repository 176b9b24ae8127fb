use tokio::sync::{mpsc, oneshot};

use crate::{
    atom::{Particle, ParticleGroup},
    core::store::AtomStore,
    observation::{AtomObservation, NotifyMode},
    subs::Subscription,
    types::{Address, DraftId},
};

/// Errors surfaced by the runtime wrapper.
///
/// The store itself has no recoverable errors; the only failure mode here
/// is the runtime task having gone away.
#[derive(Debug)]
pub enum RuntimeError {
    /// The runtime task has shut down or panicked.
    ChannelClosed,
}

/// Queue sizing for the single-writer runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command queue feeding the writer task.
    pub command_queue_bound: usize,
    /// Live-event buffer size per address channel.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable async handle to a spawned [`AtomStore`] writer task.
pub struct AtomStoreHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl Clone for AtomStoreHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

enum Command {
    Ingest {
        observation: AtomObservation,
        address: Address,
        notify: NotifyMode,
        resp: oneshot::Sender<bool>,
    },
    UpParticles {
        address: Address,
        draft: Option<DraftId>,
        resp: oneshot::Sender<Vec<Particle>>,
    },
    Stage {
        draft: DraftId,
        group: ParticleGroup,
        resp: oneshot::Sender<()>,
    },
    ClearDraft {
        draft: DraftId,
        resp: oneshot::Sender<Option<Vec<ParticleGroup>>>,
    },
    AtomObservations {
        address: Address,
        resp: oneshot::Sender<Subscription<AtomObservation>>,
    },
    OnSync {
        address: Address,
        resp: oneshot::Sender<Subscription<u64>>,
    },
    IsSynced {
        address: Address,
        resp: oneshot::Sender<bool>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer task owning `store`.
///
/// `genesis` observations are applied through the normal ingestion path
/// before the first command is served.
pub fn spawn_atomstore(
    mut store: AtomStore,
    genesis: Vec<(AtomObservation, Address)>,
    config: RuntimeConfig,
) -> AtomStoreHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);

    store.set_event_capacity(config.event_capacity);
    for (observation, address) in genesis {
        store.ingest(observation, &address, NotifyMode::all());
    }

    tokio::spawn(async move {
        let mut store = store;
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut store) {
                break;
            }
        }
    });

    AtomStoreHandle { cmd_tx }
}

impl AtomStoreHandle {
    /// Ingests one observation; resolves to whether it was included.
    pub async fn ingest(
        &self,
        observation: AtomObservation,
        address: Address,
        notify: NotifyMode,
    ) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Ingest {
                observation,
                address,
                notify,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Queries currently spendable particles at `address`, optionally
    /// merged with the overlay of one draft.
    pub async fn up_particles(
        &self,
        address: Address,
        draft: Option<DraftId>,
    ) -> Result<Vec<Particle>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::UpParticles {
                address,
                draft,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stages a particle group under `draft`.
    pub async fn stage(&self, draft: DraftId, group: ParticleGroup) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Stage {
                draft,
                group,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Removes and returns the draft's accumulated groups, `None` when
    /// nothing was staged for that id.
    pub async fn clear_draft(
        &self,
        draft: DraftId,
    ) -> Result<Option<Vec<ParticleGroup>>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ClearDraft { draft, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Opens a replay-capable observation channel for `address`.
    pub async fn atom_observations(
        &self,
        address: Address,
    ) -> Result<Subscription<AtomObservation>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AtomObservations { address, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Opens a replay-capable sync channel for `address`.
    pub async fn on_sync(&self, address: Address) -> Result<Subscription<u64>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::OnSync { address, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// True when a Head marker has been ingested for `address`.
    pub async fn is_synced(&self, address: Address) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::IsSynced { address, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the writer task after draining in-flight commands ahead of
    /// this one.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(cmd: Command, store: &mut AtomStore) -> bool {
    match cmd {
        Command::Ingest {
            observation,
            address,
            notify,
            resp,
        } => {
            let _ = resp.send(store.ingest(observation, &address, notify));
        }
        Command::UpParticles {
            address,
            draft,
            resp,
        } => {
            let _ = resp.send(store.up_particles(&address, draft));
        }
        Command::Stage { draft, group, resp } => {
            store.stage(draft, group);
            let _ = resp.send(());
        }
        Command::ClearDraft { draft, resp } => {
            let _ = resp.send(store.clear_draft(draft));
        }
        Command::AtomObservations { address, resp } => {
            let _ = resp.send(store.atom_observations(&address));
        }
        Command::OnSync { address, resp } => {
            let _ = resp.send(store.on_sync(&address));
        }
        Command::IsSynced { address, resp } => {
            let _ = resp.send(store.is_synced(&address));
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}
