//! Debounced persistence of the draft to the local storage.
//!
//! Every new revision of a dirty draft (re-)arms the timer, a clean revision cancels it.
//! When the timer fires the draft is written once. A failed write is not retried until the
//! next change arms the timer again.
use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::Utc;
use slog::{debug, error, Logger};
use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    storage::StorageError,
    store::{DraftStore, Revision},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    Armed { deadline: Instant },
    Saving,
}

#[derive(Debug)]
pub struct Autosave {
    state: AutosaveState,
    debounce: Duration,
    /// The last revision version seen, revisions without a new version never arm the timer
    seen_version: u64,
}

impl Autosave {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: AutosaveState::Idle,
            debounce,
            seen_version: 0,
        }
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            AutosaveState::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn on_revision(&mut self, revision: Revision, now: Instant) {
        let changed = revision.version != self.seen_version;
        self.seen_version = revision.version;

        if !revision.dirty {
            if let AutosaveState::Armed { .. } = self.state {
                self.state = AutosaveState::Idle;
            }
        } else if changed && self.state != AutosaveState::Saving {
            self.state = AutosaveState::Armed {
                deadline: now + self.debounce,
            };
        }
    }

    /// Moves to `Saving` if the timer is due.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.state {
            AutosaveState::Armed { deadline } if deadline <= now => {
                self.state = AutosaveState::Saving;
                true
            }
            _ => false,
        }
    }

    /// Back to `Idle` after a write, or re-armed when the draft changed meanwhile.
    pub fn on_saved(&mut self, revision: Revision, now: Instant) {
        self.state = AutosaveState::Idle;

        if revision.dirty && revision.version != self.seen_version {
            self.on_revision(revision, now);
        } else {
            self.seen_version = revision.version;
        }
    }
}

/// Writes the draft once: snapshot under the lock, write off the async runtime.
pub async fn save(store: &RwLock<DraftStore>, logger: &Logger) -> Result<(), StorageError> {
    let job = store.write().await.begin_save(Utc::now());

    let write_logger = logger.clone();
    let (job, result) = tokio::task::spawn_blocking(move || {
        let result = job.run(&write_logger);
        (job, result)
    })
    .await
    .map_err(|join_error| {
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            join_error.to_string(),
        ))
    })?;

    store.write().await.complete_save(&job, &result);

    result
}

/// Runs the autosave until the store is dropped.
pub fn spawn(
    store: &Arc<RwLock<DraftStore>>,
    debounce: Duration,
    logger: Logger,
) -> JoinHandle<()> {
    tokio::spawn(run(Arc::downgrade(store), debounce, logger))
}

async fn run(store: Weak<RwLock<DraftStore>>, debounce: Duration, logger: Logger) {
    let mut revisions = match store.upgrade() {
        Some(store) => {
            let store = store.read().await;
            store.subscribe()
        }
        None => return,
    };

    let mut autosave = Autosave::new(debounce);
    autosave.on_revision(*revisions.borrow_and_update(), Instant::now());

    loop {
        let deadline = autosave.deadline();
        let timer = time::sleep_until(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    debug!(&logger, "Draft store dropped, stopping"; "module" => "autosave");
                    break;
                }
                let revision = *revisions.borrow_and_update();
                autosave.on_revision(revision, Instant::now());
            }
            _ = timer, if deadline.is_some() => {
                if !autosave.try_fire(Instant::now()) {
                    continue;
                }

                let store = match store.upgrade() {
                    Some(store) => store,
                    None => break,
                };

                if let Err(save_error) = save(&store, &logger).await {
                    error!(&logger, "Autosave failed, waiting for the next change"; "module" => "autosave", "error" => %save_error);
                }

                let revision = *revisions.borrow_and_update();
                autosave.on_saved(revision, Instant::now());
            }
        }
    }
}
