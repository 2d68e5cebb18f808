// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Two independent slot pools: `phase1` bounds sectors doing piece and phase 1
/// work, `phase2` admits a single phase 2 computation at a time.
#[derive(Debug, Clone)]
pub struct Admission {
    phase1: Arc<Semaphore>,
    phase2: Arc<Semaphore>,
}

/// Held from piece addition through phase 1. Released on drop.
#[derive(Debug)]
pub struct Phase1Slot {
    _permit: OwnedSemaphorePermit,
}

/// Held for the phase 2 computation. Released on drop.
#[derive(Debug)]
pub struct Phase2Slot {
    _permit: OwnedSemaphorePermit,
}

impl Admission {
    pub fn new(phase1_slots: NonZeroUsize) -> Self {
        Self {
            phase1: Arc::new(Semaphore::new(phase1_slots.get())),
            phase2: Arc::new(Semaphore::new(1)),
        }
    }

    /// Waits for a phase 1 slot. [`None`] once `cancel` fires.
    pub async fn phase1(&self, cancel: &CancellationToken) -> Option<Phase1Slot> {
        acquire(&self.phase1, cancel)
            .await
            .map(|_permit| Phase1Slot { _permit })
    }

    /// Waits for the phase 2 slot. [`None`] once `cancel` fires.
    pub async fn phase2(&self, cancel: &CancellationToken) -> Option<Phase2Slot> {
        acquire(&self.phase2, cancel)
            .await
            .map(|_permit| Phase2Slot { _permit })
    }

    pub fn available_phase1(&self) -> usize {
        self.phase1.available_permits()
    }

    pub fn available_phase2(&self) -> usize {
        self.phase2.available_permits()
    }
}

async fn acquire(
    slots: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        permit = slots.clone().acquire_owned() => permit.ok(),
    }
}
