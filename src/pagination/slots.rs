//! Fixed pool of fetch slots
//!
//! A run owns `N` slot identities. The governing loop takes one before each
//! dispatch and the spawned unit hands it back (or retires it) when done.
//! Ownership of an identity is carried by a [`SlotLease`]; dropping the lease
//! returns the slot, so panicking or aborted units never leak capacity.

use crate::error::{Error, Result};
use std::fmt;
use tokio::sync::mpsc;

/// Identity of one fetch slot, `1..=N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Numeric slot index
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bounded FIFO holding the idle slot identities of a run
#[derive(Debug)]
pub struct SlotPool {
    tx: mpsc::Sender<SlotId>,
    rx: mpsc::Receiver<SlotId>,
    size: usize,
}

impl SlotPool {
    /// Create a pool preloaded with slots `1..=size`
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_value(
                "pagination.slots",
                "at least one slot is required",
            ));
        }

        let (tx, rx) = mpsc::channel(size);
        for id in 1..=size {
            tx.try_send(SlotId(id))
                .map_err(|e| Error::worker(format!("could not seed slot pool: {e}")))?;
        }

        Ok(Self { tx, rx, size })
    }

    /// Number of slot identities the pool was created with
    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait for an idle slot
    ///
    /// Returns `None` once the pool is closed and empty.
    pub async fn acquire(&mut self) -> Option<SlotLease> {
        let id = self.rx.recv().await?;
        Some(SlotLease {
            id,
            home: Some(self.tx.clone()),
        })
    }

    /// Stop accepting returned slots
    ///
    /// Slots already queued stay readable through [`SlotPool::drain`].
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Take every idle slot currently queued
    pub fn drain(&mut self) -> Vec<SlotId> {
        let mut idle = Vec::with_capacity(self.size);
        while let Ok(id) = self.rx.try_recv() {
            idle.push(id);
        }
        idle
    }
}

/// Exclusive hold on one slot for the lifetime of a dispatch unit
#[derive(Debug)]
pub struct SlotLease {
    id: SlotId,
    home: Option<mpsc::Sender<SlotId>>,
}

impl SlotLease {
    /// Slot held by this lease
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Return the slot to the pool
    pub fn recycle(self) {
        drop(self);
    }

    /// Consume the slot without returning it
    pub fn retire(mut self) {
        self.home = None;
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if let Some(home) = self.home.take() {
            // Capacity equals the number of identities, so this only fails
            // once the pool has been closed.
            let _ = home.try_send(self.id);
        }
    }
}
