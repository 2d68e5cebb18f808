// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! In-memory stand-ins for the prover and the chain.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cid::Cid;
use fvm_ipld_bitfield::BitField;
use fvm_shared4::version::NetworkVersion;
use parking_lot::Mutex;

use crate::chain::{ChainReader, SealTicket, SectorStatus};
use crate::prover::{
    PieceInfo, PoStRandomness, Prover, SealRandomness, SectorCids, UnpaddedPieceSize,
    WindowPoStOutput,
};
use crate::redo::Stage;
use crate::shim::address::Address;
use crate::shim::sector::{
    ActorID, PoStProof, RegisteredPoStProof, SectorInfo, SectorNumber, SectorRef, SectorSize,
};
use crate::store::{PathType, SectorStore};
use crate::utils::commcid;

/// The sealed CID [`MockProver`] computes for a sector, and [`MockChain`]
/// reports unless told otherwise.
pub fn mock_comm_r(number: SectorNumber) -> Cid {
    let mut comm = [0u8; 32];
    comm[..8].copy_from_slice(&number.to_le_bytes());
    comm[31] = 0x2a;
    commcid::replica_commitment_v1_to_cid(&comm).unwrap()
}

pub fn mock_comm_d(number: SectorNumber) -> Cid {
    let mut comm = [0u8; 32];
    comm[..8].copy_from_slice(&number.to_le_bytes());
    commcid::data_commitment_v1_to_cid(&comm).unwrap()
}

/// Current and peak number of concurrent holders.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) -> GaugeGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

struct GaugeGuard<'a>(&'a Gauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A [`Prover`] that writes placeholder artifacts into a [`SectorStore`] and
/// records what it was asked to do.
#[derive(Debug)]
pub struct MockProver {
    store: SectorStore,
    delay: Duration,
    failures: HashMap<SectorNumber, Stage>,
    wrong_comm_r: HashSet<SectorNumber>,
    /// Window PoSt generation fails for batches containing these sectors.
    post_failures: HashSet<SectorNumber>,
    post_faulty: Vec<SectorNumber>,
    post_skipped: Vec<SectorNumber>,
    verify_result: bool,
    phase2_awaits_other_phase1: bool,
    pub phase1: Gauge,
    pub phase2: Gauge,
    calls: Mutex<Vec<(SectorNumber, Stage)>>,
    post_batches: Mutex<Vec<(Vec<SectorInfo>, PoStRandomness)>>,
}

impl MockProver {
    pub fn new(store: SectorStore) -> Self {
        Self {
            store,
            delay: Duration::ZERO,
            failures: HashMap::new(),
            wrong_comm_r: HashSet::new(),
            post_failures: HashSet::new(),
            post_faulty: vec![],
            post_skipped: vec![],
            verify_result: true,
            phase2_awaits_other_phase1: false,
            phase1: Gauge::default(),
            phase2: Gauge::default(),
            calls: Mutex::new(vec![]),
            post_batches: Mutex::new(vec![]),
        }
    }

    /// Time each sealing call takes, so that sectors overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_at(mut self, number: SectorNumber, stage: Stage) -> Self {
        self.failures.insert(number, stage);
        self
    }

    /// Phase 2 of `number` yields a sealed CID that differs from the chain's.
    pub fn with_wrong_comm_r(mut self, number: SectorNumber) -> Self {
        self.wrong_comm_r.insert(number);
        self
    }

    /// Phase 2 of a sector blocks until another sector has reached phase 1,
    /// and fails if that doesn't happen within a few seconds.
    pub fn with_phase2_awaiting_other_phase1(mut self) -> Self {
        self.phase2_awaits_other_phase1 = true;
        self
    }

    pub fn failing_post_for(mut self, number: SectorNumber) -> Self {
        self.post_failures.insert(number);
        self
    }

    pub fn with_post_faults(mut self, faulty: Vec<SectorNumber>, skipped: Vec<SectorNumber>) -> Self {
        self.post_faulty = faulty;
        self.post_skipped = skipped;
        self
    }

    pub fn with_verify_result(mut self, verify_result: bool) -> Self {
        self.verify_result = verify_result;
        self
    }

    /// Sealing calls in the order they started.
    pub fn calls(&self) -> Vec<(SectorNumber, Stage)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, number: SectorNumber) -> Vec<Stage> {
        self.calls
            .lock()
            .iter()
            .filter(|(it, _)| *it == number)
            .map(|(_, stage)| *stage)
            .collect()
    }

    /// Sector infos and challenge of each window PoSt generation.
    pub fn post_batches(&self) -> Vec<(Vec<SectorInfo>, PoStRandomness)> {
        self.post_batches.lock().clone()
    }

    fn other_reached_phase1(&self, number: SectorNumber) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|(it, stage)| *it != number && *stage == Stage::PreCommit1)
    }

    fn step(&self, sector: &SectorRef, stage: Stage) -> anyhow::Result<()> {
        self.calls.lock().push((sector.number, stage));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.failures.get(&sector.number) {
            Some(failing) if *failing == stage => {
                anyhow::bail!("mock {stage} failure of sector {}", sector.number)
            }
            _ => Ok(()),
        }
    }
}

impl Prover for MockProver {
    type Phase1Output = SectorNumber;

    fn add_piece(
        &self,
        sector: &SectorRef,
        _: &[UnpaddedPieceSize],
        piece_size: UnpaddedPieceSize,
        mut data: Box<dyn Read + Send>,
    ) -> anyhow::Result<PieceInfo> {
        let _phase1 = self.phase1.enter();
        self.step(sector, Stage::AddPiece)?;
        let mut unsealed = vec![];
        data.read_to_end(&mut unsealed)?;
        anyhow::ensure!(unsealed.len() as u64 == piece_size.0, "short piece");
        std::fs::write(
            self.store.sector_path(PathType::Unsealed, sector),
            &unsealed,
        )?;
        Ok(PieceInfo {
            size: piece_size.padded(),
            cid: mock_comm_d(sector.number),
        })
    }

    fn seal_pre_commit_phase1(
        &self,
        sector: &SectorRef,
        _: &SealRandomness,
        pieces: &[PieceInfo],
    ) -> anyhow::Result<Self::Phase1Output> {
        let _phase1 = self.phase1.enter();
        self.step(sector, Stage::PreCommit1)?;
        anyhow::ensure!(pieces.len() == 1, "expected a single piece");
        let cache = self.store.sector_path(PathType::Cache, sector);
        std::fs::create_dir_all(&cache)?;
        std::fs::write(cache.join("sc-02-data-layer-1.dat"), b"layer")?;
        std::fs::write(cache.join("p_aux"), b"aux")?;
        Ok(sector.number)
    }

    fn seal_pre_commit_phase2(
        &self,
        sector: &SectorRef,
        phase1_output: Self::Phase1Output,
    ) -> anyhow::Result<SectorCids> {
        let _phase2 = self.phase2.enter();
        if self.phase2_awaits_other_phase1 {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !self.other_reached_phase1(sector.number) {
                anyhow::ensure!(
                    Instant::now() < deadline,
                    "no other sector got through phase 1 while sector {} was in phase 2",
                    sector.number
                );
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        self.step(sector, Stage::PreCommit2)?;
        anyhow::ensure!(phase1_output == sector.number, "phase 1 output of another sector");
        std::fs::write(self.store.sector_path(PathType::Sealed, sector), b"replica")?;
        let sealed = match self.wrong_comm_r.contains(&sector.number) {
            true => mock_comm_r(sector.number + 1_000_000),
            false => mock_comm_r(sector.number),
        };
        Ok(SectorCids {
            sealed,
            unsealed: mock_comm_d(sector.number),
        })
    }

    fn finalize_sector(&self, sector: &SectorRef, keep_unsealed: bool) -> anyhow::Result<()> {
        self.step(sector, Stage::Finalize)?;
        let cache = self.store.sector_path(PathType::Cache, sector);
        std::fs::remove_file(cache.join("sc-02-data-layer-1.dat"))?;
        if !keep_unsealed {
            std::fs::remove_file(self.store.sector_path(PathType::Unsealed, sector))?;
        }
        Ok(())
    }

    fn generate_window_post(
        &self,
        _: ActorID,
        sector_infos: &[SectorInfo],
        randomness: &PoStRandomness,
    ) -> anyhow::Result<WindowPoStOutput> {
        self.post_batches
            .lock()
            .push((sector_infos.to_vec(), *randomness));
        if let Some(info) = sector_infos
            .iter()
            .find(|it| self.post_failures.contains(&it.sector_number))
        {
            anyhow::bail!("mock proving failure of sector {}", info.sector_number);
        }
        Ok(WindowPoStOutput {
            proofs: vec![PoStProof {
                post_proof: RegisteredPoStProof::StackedDRGWindow2KiBV1P1,
                proof_bytes: randomness.to_vec(),
            }],
            faulty: self.post_faulty.clone(),
            skipped: self.post_skipped.clone(),
        })
    }

    fn verify_window_post(
        &self,
        _: ActorID,
        _: &[SectorInfo],
        randomness: &PoStRandomness,
        proofs: &[PoStProof],
    ) -> anyhow::Result<bool> {
        Ok(self.verify_result
            && proofs
                .iter()
                .all(|it| it.proof_bytes.as_slice() == randomness.as_slice()))
    }
}

/// A [`ChainReader`] over canned state.
#[derive(Debug)]
pub struct MockChain {
    actor: Address,
    sector_size: SectorSize,
    network_version: NetworkVersion,
    comm_r: HashMap<SectorNumber, Option<Cid>>,
    failing_status: HashSet<SectorNumber>,
    sectors: Vec<SectorInfo>,
    partitions: HashMap<u64, Vec<BitField>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MockChain {
    pub fn new(actor: Address) -> Self {
        Self {
            actor,
            sector_size: SectorSize::_2KiB,
            network_version: NetworkVersion::V21,
            comm_r: HashMap::new(),
            failing_status: HashSet::new(),
            sectors: vec![],
            partitions: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the committed sealed CID of a sector.
    pub fn with_comm_r(mut self, number: SectorNumber, comm_r: Option<Cid>) -> Self {
        self.comm_r.insert(number, comm_r);
        self
    }

    pub fn with_failing_status(mut self, number: SectorNumber) -> Self {
        self.failing_status.insert(number);
        self
    }

    pub fn with_sectors(mut self, sectors: impl IntoIterator<Item = SectorInfo>) -> Self {
        self.sectors.extend(sectors);
        self
    }

    pub fn with_partitions(mut self, deadline: u64, partitions: Vec<BitField>) -> Self {
        self.partitions.insert(deadline, partitions);
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or_default()
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().entry(method).or_default() += 1;
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn actor_address(&self) -> anyhow::Result<Address> {
        self.record("actor_address");
        Ok(self.actor)
    }

    async fn sector_size_and_network_version(
        &self,
        _: &Address,
    ) -> anyhow::Result<(SectorSize, NetworkVersion)> {
        self.record("sector_size_and_network_version");
        Ok((self.sector_size, self.network_version))
    }

    async fn sector_status(&self, number: SectorNumber) -> anyhow::Result<SectorStatus> {
        self.record("sector_status");
        anyhow::ensure!(
            !self.failing_status.contains(&number),
            "sector {number} not found"
        );
        Ok(SectorStatus {
            sector_number: number,
            ticket: SealTicket {
                value: vec![7; 32],
                epoch: 1000,
            },
            comm_r: self
                .comm_r
                .get(&number)
                .copied()
                .unwrap_or_else(|| Some(mock_comm_r(number))),
        })
    }

    async fn miner_sectors(
        &self,
        _: &Address,
        sectors: &BitField,
    ) -> anyhow::Result<Vec<SectorInfo>> {
        self.record("miner_sectors");
        Ok(self
            .sectors
            .iter()
            .filter(|it| sectors.get(it.sector_number))
            .cloned()
            .collect())
    }

    async fn deadline_partitions(
        &self,
        _: &Address,
        deadline: u64,
    ) -> anyhow::Result<Vec<BitField>> {
        self.record("deadline_partitions");
        Ok(self.partitions.get(&deadline).cloned().unwrap_or_default())
    }
}
