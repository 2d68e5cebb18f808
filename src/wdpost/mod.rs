// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Window PoSt emulation over the sectors of a local store.
//!
//! A round proves one batch of sectors: the live sectors of a partition, or an
//! explicit list. Each round goes through
//! `scope -> metadata -> challenge -> generate -> verify` and ends verified or
//! failed at one of those stages.


use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use fvm_ipld_bitfield::BitField;
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::chain::ChainReader;
use crate::prover::{PoStRandomness, Prover, WindowPoStOutput};
use crate::shim::address::{Address, actor_id};
use crate::shim::sector::{ActorID, SectorInfo, SectorNumber};
use crate::utils::rand::forest_rng;

/// Proving deadlines per proving period.
pub const WPOST_PERIOD_DEADLINES: u64 = 48;

/// Fails unless `deadline` is a valid deadline index.
pub fn validate_deadline(deadline: i64) -> anyhow::Result<u64> {
    match u64::try_from(deadline) {
        Ok(deadline) if deadline < WPOST_PERIOD_DEADLINES => Ok(deadline),
        _ => bail!("--deadline must be between 0 and {}", WPOST_PERIOD_DEADLINES - 1),
    }
}

/// Sectors to emulate a window PoSt for.
#[derive(Debug, Clone)]
pub enum Scope {
    Sectors(BitField),
    Partition { deadline: u64, partition: u64 },
    /// Every partition of a deadline, one round each.
    Deadline(u64),
}

/// What to prove for a requested sector the chain doesn't return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubstitutionPolicy {
    /// Prove the first fetched sector in its place.
    #[default]
    SubstituteFirst,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EmulationStage {
    Scope,
    Metadata,
    Challenge,
    Generate,
    Verify,
}

#[derive(Debug, thiserror::Error)]
#[error("{stage}: {error:#}")]
pub struct EmulationError {
    pub stage: EmulationStage,
    pub error: anyhow::Error,
}

impl EmulationError {
    fn at(stage: EmulationStage) -> impl FnOnce(anyhow::Error) -> Self {
        move |error| Self { stage, error }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Verified,
    /// Nothing to prove.
    Empty,
    Failed { stage: EmulationStage, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResult {
    pub deadline: Option<u64>,
    pub partition: Option<u64>,
    pub sectors: Vec<SectorNumber>,
    pub faulty: Vec<SectorNumber>,
    pub skipped: Vec<SectorNumber>,
    pub outcome: RoundOutcome,
}

impl PartitionResult {
    fn new(deadline: Option<u64>, partition: Option<u64>, sectors: &BitField) -> Self {
        Self {
            deadline,
            partition,
            sectors: sectors.iter().collect(),
            faulty: vec![],
            skipped: vec![],
            outcome: RoundOutcome::Empty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmulationReport {
    pub partitions: Vec<PartitionResult>,
}

impl EmulationReport {
    pub fn failures(&self) -> impl Iterator<Item = &PartitionResult> {
        self.partitions
            .iter()
            .filter(|it| matches!(it.outcome, RoundOutcome::Failed { .. }))
    }

    /// Turns the first failed round into an error.
    pub fn ensure_verified(&self) -> anyhow::Result<()> {
        match self.failures().next() {
            Some(PartitionResult {
                outcome: RoundOutcome::Failed { stage, error },
                ..
            }) => bail!("window post emulation failed at {stage}: {error}"),
            _ => Ok(()),
        }
    }
}

/// Emulates window PoSt rounds of one miner.
pub struct Emulator<P, C> {
    prover: Arc<P>,
    chain: Arc<C>,
    miner: Address,
    actor_id: ActorID,
    policy: SubstitutionPolicy,
    cancel: CancellationToken,
}

impl<P, C> Emulator<P, C>
where
    P: Prover,
    C: ChainReader,
{
    pub fn new(prover: Arc<P>, chain: Arc<C>, miner: Address) -> anyhow::Result<Self> {
        Ok(Self {
            actor_id: actor_id(&miner)?,
            prover,
            chain,
            miner,
            policy: SubstitutionPolicy::default(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_policy(mut self, policy: SubstitutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs every round of `scope`. A deadline keeps going after a failed
    /// partition; failed rounds are part of the report, not an error.
    pub async fn run(&self, scope: &Scope) -> Result<EmulationReport, EmulationError> {
        let mut report = EmulationReport::default();
        match scope {
            Scope::Sectors(sectors) => {
                report.partitions.push(self.round(None, None, sectors).await);
            }
            Scope::Partition {
                deadline,
                partition,
            } => {
                let partitions = self.partitions(*deadline).await?;
                let result = match usize::try_from(*partition)
                    .ok()
                    .and_then(|it| partitions.get(it))
                {
                    Some(sectors) => {
                        self.round(Some(*deadline), Some(*partition), sectors)
                            .await
                    }
                    None => {
                        let mut result = PartitionResult::new(
                            Some(*deadline),
                            Some(*partition),
                            &BitField::new(),
                        );
                        result.outcome = RoundOutcome::Failed {
                            stage: EmulationStage::Metadata,
                            error: format!(
                                "deadline {deadline} has {} partitions",
                                partitions.len()
                            ),
                        };
                        result
                    }
                };
                report.partitions.push(result);
            }
            Scope::Deadline(deadline) => {
                for (partition, sectors) in (0..).zip(self.partitions(*deadline).await?.iter()) {
                    let result = self.round(Some(*deadline), Some(partition), sectors).await;
                    if matches!(result.outcome, RoundOutcome::Failed { .. }) {
                        warn!(
                            deadline,
                            partition, "partition round failed, continuing with the next one"
                        );
                    }
                    report.partitions.push(result);
                }
            }
        }
        Ok(report)
    }

    async fn partitions(&self, deadline: u64) -> Result<Vec<BitField>, EmulationError> {
        if deadline >= WPOST_PERIOD_DEADLINES {
            return Err(EmulationError {
                stage: EmulationStage::Scope,
                error: anyhow::anyhow!("deadline {deadline} is out of range"),
            });
        }
        self.chain
            .deadline_partitions(&self.miner, deadline)
            .await
            .with_context(|| format!("loading partitions of deadline {deadline}"))
            .map_err(EmulationError::at(EmulationStage::Scope))
    }

    async fn round(
        &self,
        deadline: Option<u64>,
        partition: Option<u64>,
        sectors: &BitField,
    ) -> PartitionResult {
        let mut result = PartitionResult::new(deadline, partition, sectors);
        if result.sectors.is_empty() {
            info!(?deadline, ?partition, "no live sectors to prove");
            return result;
        }
        result.outcome = match self.prove(sectors, &mut result).await {
            Ok(()) => {
                info!(sids = ?result.sectors, "wdpost simulation is successful");
                RoundOutcome::Verified
            }
            Err(EmulationError { stage, error }) => {
                let error = format!("{error:#}");
                error!(?deadline, ?partition, %stage, %error, "window post emulation failed");
                RoundOutcome::Failed { stage, error }
            }
        };
        result
    }

    async fn prove(
        &self,
        sectors: &BitField,
        result: &mut PartitionResult,
    ) -> Result<(), EmulationError> {
        let infos = self
            .sector_infos(sectors)
            .await
            .map_err(EmulationError::at(EmulationStage::Metadata))?;

        let randomness = challenge(&mut forest_rng());

        if self.cancel.is_cancelled() {
            return Err(EmulationError {
                stage: EmulationStage::Generate,
                error: anyhow::anyhow!("cancelled"),
            });
        }
        let WindowPoStOutput {
            proofs,
            faulty,
            skipped,
        } = self
            .blocking({
                let infos = infos.clone();
                let miner = self.actor_id;
                move |prover| prover.generate_window_post(miner, &infos, &randomness)
            })
            .await
            .map_err(EmulationError::at(EmulationStage::Generate))?;
        if !skipped.is_empty() {
            error!(?skipped, "skip sectors");
        }
        if !faulty.is_empty() {
            error!(?faulty, "faulty sectors");
        }
        result.faulty = faulty;
        result.skipped = skipped;

        let miner = self.actor_id;
        let verified = self
            .blocking(move |prover| {
                prover.verify_window_post(miner, &infos, &randomness, &proofs)
            })
            .await
            .map_err(EmulationError::at(EmulationStage::Verify))?;
        if !verified {
            return Err(EmulationError {
                stage: EmulationStage::Verify,
                error: anyhow::anyhow!("window post verification failed"),
            });
        }
        Ok(())
    }

    /// Proof metadata of every sector in `sectors`, in bitfield order.
    async fn sector_infos(&self, sectors: &BitField) -> anyhow::Result<Vec<SectorInfo>> {
        let fetched = self
            .chain
            .miner_sectors(&self.miner, sectors)
            .await
            .context("fetching sector infos")?;
        let Some(substitute) = fetched.first().cloned() else {
            bail!(
                "the chain knows none of the {} requested sectors",
                sectors.len()
            );
        };
        let by_number = fetched
            .into_iter()
            .map(|it| (it.sector_number, it))
            .collect::<HashMap<_, _>>();
        sectors
            .iter()
            .map(|number| match (by_number.get(&number), self.policy) {
                (Some(info), _) => Ok(info.clone()),
                (None, SubstitutionPolicy::SubstituteFirst) => {
                    warn!(
                        sector = number,
                        substitute = substitute.sector_number,
                        "sector is unknown to the chain, proving a substitute"
                    );
                    Ok(substitute.clone())
                }
                (None, SubstitutionPolicy::Reject) => {
                    bail!("sector {number} is unknown to the chain")
                }
            })
            .collect()
    }

    async fn blocking<T: Send + 'static>(
        &self,
        f: impl FnOnce(&P) -> anyhow::Result<T> + Send + 'static,
    ) -> anyhow::Result<T> {
        let prover = self.prover.clone();
        tokio::task::spawn_blocking(move || f(&prover))
            .await
            .context("prover task")?
    }
}

/// A random window PoSt challenge that is a valid BLS12-381 scalar.
pub fn challenge(rng: &mut impl RngCore) -> PoStRandomness {
    let mut randomness = PoStRandomness::default();
    rng.fill_bytes(&mut randomness);
    randomness[31] &= 0x3f;
    randomness
}
