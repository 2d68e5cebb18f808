// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Re-sealing of committed sectors whose sealing artifacts were lost.
//!
//! Every sector runs as its own task through
//! `status -> add-piece -> pre-commit-1 -> pre-commit-2 -> finalize`, then the
//! recomputed sealed CID is compared with the one committed on chain. Piece
//! addition and phase 1 run under one of `N` phase 1 slots; phase 2 runs under
//! the single phase 2 slot. A sector gives its phase 1 slot back before it
//! waits for phase 2. Sectors that match the chain are moved to the
//! destination store, if there is one.

mod admission;
#[cfg(test)]
mod tests;

pub use admission::{Admission, Phase1Slot, Phase2Slot};

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainReader, SectorStatus};
use crate::prover::{Prover, SealRandomness, SectorCids, full_sector_piece_size, null_reader};
use crate::shim::sector::{SectorNumber, SectorRef, SectorTemplate};
use crate::store::{PathType, SectorStore, relocate};
use crate::utils::SectorNumbers;

/// How a sector without a committed sealed CID compares.
pub const NO_COMM_R: &str = "<none>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Stage {
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "add-piece")]
    AddPiece,
    #[strum(serialize = "pre-commit-1")]
    PreCommit1,
    #[strum(serialize = "pre-commit-2")]
    PreCommit2,
    #[strum(serialize = "finalize")]
    Finalize,
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{stage}: {error:#}")]
    Failed { stage: Stage, error: anyhow::Error },
    #[error("cancelled before {0}")]
    Cancelled(Stage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectorOutcome {
    /// The recomputed sealed CID matches the chain.
    Sealed,
    /// Sealing completed but disagrees with the chain.
    Mismatch { computed: String, on_chain: String },
    Failed { stage: Stage, error: String },
    Cancelled,
}

/// Result of moving one artifact category of a sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub path_type: PathType,
    pub destination: PathBuf,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorReport {
    pub outcome: SectorOutcome,
    pub relocations: Vec<Relocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedoReport {
    pub sectors: BTreeMap<SectorNumber, SectorReport>,
    /// Input tokens that aren't sector numbers.
    pub skipped: Vec<String>,
}

impl RedoReport {
    pub fn outcome(&self, number: SectorNumber) -> Option<&SectorOutcome> {
        self.sectors.get(&number).map(|it| &it.outcome)
    }

    pub fn summary(&self) -> RedoSummary {
        let mut summary = RedoSummary {
            skipped: self.skipped.len(),
            ..Default::default()
        };
        for report in self.sectors.values() {
            match report.outcome {
                SectorOutcome::Sealed => summary.sealed += 1,
                SectorOutcome::Mismatch { .. } => summary.mismatched += 1,
                SectorOutcome::Failed { .. } => summary.failed += 1,
                SectorOutcome::Cancelled => summary.cancelled += 1,
            }
            summary.relocation_failures += report
                .relocations
                .iter()
                .filter(|it| it.error.is_some())
                .count();
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedoSummary {
    pub sealed: usize,
    pub mismatched: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub skipped: usize,
    pub relocation_failures: usize,
}

impl fmt::Display for RedoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sealed, {} mismatched, {} failed, {} cancelled, {} skipped, {} relocation failures",
            self.sealed,
            self.mismatched,
            self.failed,
            self.cancelled,
            self.skipped,
            self.relocation_failures
        )
    }
}

enum Finished {
    Sector {
        sector: SectorRef,
        outcome: SectorOutcome,
    },
    Relocation {
        number: SectorNumber,
        relocations: Vec<Relocation>,
    },
}

/// The redo pipeline of one batch of sectors.
pub struct Redo<P, C> {
    prover: Arc<P>,
    chain: Arc<C>,
    template: SectorTemplate,
    store: SectorStore,
    destination: Option<SectorStore>,
    admission: Admission,
    cancel: CancellationToken,
}

impl<P, C> Clone for Redo<P, C> {
    fn clone(&self) -> Self {
        Self {
            prover: self.prover.clone(),
            chain: self.chain.clone(),
            template: self.template,
            store: self.store.clone(),
            destination: self.destination.clone(),
            admission: self.admission.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<P, C> Redo<P, C>
where
    P: Prover,
    C: ChainReader + 'static,
{
    pub fn new(
        prover: Arc<P>,
        chain: Arc<C>,
        template: SectorTemplate,
        store: SectorStore,
        parallel: NonZeroUsize,
    ) -> Self {
        Self {
            prover,
            chain,
            template,
            store,
            destination: None,
            admission: Admission::new(parallel),
            cancel: CancellationToken::new(),
        }
    }

    /// Store that sectors matching the chain are moved to.
    pub fn with_destination(mut self, destination: Option<SectorStore>) -> Self {
        self.destination = destination;
        self
    }

    /// Stops sectors waiting for a slot or between stages once `cancel` fires.
    /// Prover calls already running are not interrupted.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Redoes every sector of `sectors` and waits for all of them, relocations
    /// included. Per-sector failures end up in the report.
    pub async fn run(&self, sectors: SectorNumbers) -> RedoReport {
        let mut report = RedoReport {
            skipped: sectors.skipped,
            ..Default::default()
        };
        let mut tasks = JoinSet::new();
        for number in sectors.numbers {
            let sector = self.template.sector(number);
            let this = self.clone();
            tasks.spawn(async move {
                let outcome = this.redo_sector(sector).await;
                Finished::Sector { sector, outcome }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Finished::Sector { sector, outcome }) => {
                    if outcome == SectorOutcome::Sealed
                        && let Some(destination) = &self.destination
                    {
                        tasks.spawn(relocate_sector(
                            self.store.clone(),
                            destination.clone(),
                            sector,
                        ));
                    }
                    report.sectors.insert(
                        sector.number,
                        SectorReport {
                            outcome,
                            relocations: vec![],
                        },
                    );
                }
                Ok(Finished::Relocation {
                    number,
                    relocations,
                }) => {
                    if let Some(sector) = report.sectors.get_mut(&number) {
                        sector.relocations = relocations;
                    }
                }
                Err(e) => error!("sector task failed: {e}"),
            }
        }
        report
    }

    async fn redo_sector(&self, sector: SectorRef) -> SectorOutcome {
        let number = sector.number;
        match self.seal(sector).await {
            Ok((cids, status)) => compare(number, &cids, &status),
            Err(StageError::Cancelled(stage)) => {
                warn!(sector = number, %stage, "redo cancelled");
                SectorOutcome::Cancelled
            }
            Err(StageError::Failed { stage, error }) => {
                let error = format!("{error:#}");
                error!(sector = number, %stage, %error, "redo failed");
                SectorOutcome::Failed { stage, error }
            }
        }
    }

    async fn seal(&self, sector: SectorRef) -> Result<(SectorCids, SectorStatus), StageError> {
        let phase1 = self
            .admission
            .phase1(&self.cancel)
            .await
            .ok_or(StageError::Cancelled(Stage::Status))?;

        let status = self
            .chain
            .sector_status(sector.number)
            .await
            .map_err(|error| StageError::Failed {
                stage: Stage::Status,
                error,
            })?;
        let ticket = SealRandomness::try_from(status.ticket.value.as_slice()).map_err(|_| {
            StageError::Failed {
                stage: Stage::Status,
                error: anyhow::anyhow!(
                    "seal ticket must be 32 bytes, got {}",
                    status.ticket.value.len()
                ),
            }
        })?;
        debug!(
            sector = sector.number,
            epoch = status.ticket.epoch,
            "fetched seal ticket"
        );

        let piece = self
            .blocking(Stage::AddPiece, move |prover| {
                let size = full_sector_piece_size(sector.sector_size()? as u64);
                prover.add_piece(&sector, &[], size, null_reader(size))
            })
            .await?;
        let phase1_output = self
            .blocking(Stage::PreCommit1, move |prover| {
                prover.seal_pre_commit_phase1(&sector, &ticket, &[piece])
            })
            .await?;
        drop(phase1);

        let phase2 = self
            .admission
            .phase2(&self.cancel)
            .await
            .ok_or(StageError::Cancelled(Stage::PreCommit2))?;
        let cids = self
            .blocking(Stage::PreCommit2, move |prover| {
                prover.seal_pre_commit_phase2(&sector, phase1_output)
            })
            .await?;
        drop(phase2);

        self.blocking(Stage::Finalize, move |prover| {
            prover.finalize_sector(&sector, false)
        })
        .await?;
        Ok((cids, status))
    }

    /// Runs one prover call off the async workers.
    async fn blocking<T: Send + 'static>(
        &self,
        stage: Stage,
        f: impl FnOnce(&P) -> anyhow::Result<T> + Send + 'static,
    ) -> Result<T, StageError> {
        if self.cancel.is_cancelled() {
            return Err(StageError::Cancelled(stage));
        }
        let prover = self.prover.clone();
        match tokio::task::spawn_blocking(move || f(&prover)).await {
            Ok(Ok(it)) => Ok(it),
            Ok(Err(error)) => Err(StageError::Failed { stage, error }),
            Err(e) => Err(StageError::Failed {
                stage,
                error: anyhow::anyhow!("prover task: {e}"),
            }),
        }
    }
}

fn compare(number: SectorNumber, cids: &SectorCids, status: &SectorStatus) -> SectorOutcome {
    let computed = cids.sealed.to_string();
    let on_chain = status
        .comm_r
        .map(|it| it.to_string())
        .unwrap_or_else(|| NO_COMM_R.to_owned());
    if computed == on_chain {
        info!(sector = number, sealed_cid = %computed, "redo successful");
        SectorOutcome::Sealed
    } else {
        warn!(sector = number, %computed, %on_chain, "sealed CID differs from chain");
        SectorOutcome::Mismatch { computed, on_chain }
    }
}

async fn relocate_sector(
    store: SectorStore,
    destination: SectorStore,
    sector: SectorRef,
) -> Finished {
    let mut relocations = vec![];
    for path_type in PathType::relocatable() {
        let from = store.sector_path(path_type, &sector);
        let to = destination.sector_path(path_type, &sector);
        let error = match relocate(&from, &to).await {
            Ok(()) => {
                info!(
                    sector = sector.number,
                    %path_type,
                    to = %to.display(),
                    "relocated sector artifacts"
                );
                None
            }
            Err(e) => {
                warn!(sector = sector.number, %path_type, error = %e, "relocation failed");
                Some(e.to_string())
            }
        };
        relocations.push(Relocation {
            path_type,
            destination: to,
            error,
        });
    }
    Finished::Relocation {
        number: sector.number,
        relocations,
    }
}
