// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The sealing and proving operations, behind [`Prover`].
//!
//! All methods block the calling thread for as long as the computation takes
//! (minutes to hours for sealing). Async callers run them on
//! [`tokio::task::spawn_blocking`].

#[cfg(feature = "proofs")]
mod proofs_api;

#[cfg(feature = "proofs")]
pub use proofs_api::ProofsApiProver;

use std::io::Read;

use cid::Cid;
pub use fvm_shared4::piece::{PaddedPieceSize, PieceInfo, UnpaddedPieceSize};

use crate::shim::sector::{ActorID, PoStProof, SectorInfo, SectorNumber, SectorRef};
use crate::store::SectorStore;

/// Sealing randomness drawn from the chain at pre-commit time.
pub type SealRandomness = [u8; 32];
/// Window PoSt challenge randomness.
pub type PoStRandomness = [u8; 32];

/// Commitments of a freshly sealed sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorCids {
    /// `CommR`
    pub sealed: Cid,
    /// `CommD`
    pub unsealed: Cid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowPoStOutput {
    pub proofs: Vec<PoStProof>,
    /// Sectors whose replica couldn't be read during proving.
    pub faulty: Vec<SectorNumber>,
    /// Sectors left out of the proof because their artifacts are missing.
    pub skipped: Vec<SectorNumber>,
}

pub trait Prover: Send + Sync + 'static {
    /// Opaque output of pre-commit phase 1, consumed by phase 2.
    type Phase1Output: Send + 'static;

    /// Writes a piece of `piece_size` bytes read from `data` into the sector's
    /// unsealed file, after the pieces of `existing_piece_sizes`.
    fn add_piece(
        &self,
        sector: &SectorRef,
        existing_piece_sizes: &[UnpaddedPieceSize],
        piece_size: UnpaddedPieceSize,
        data: Box<dyn Read + Send>,
    ) -> anyhow::Result<PieceInfo>;

    fn seal_pre_commit_phase1(
        &self,
        sector: &SectorRef,
        ticket: &SealRandomness,
        pieces: &[PieceInfo],
    ) -> anyhow::Result<Self::Phase1Output>;

    fn seal_pre_commit_phase2(
        &self,
        sector: &SectorRef,
        phase1_output: Self::Phase1Output,
    ) -> anyhow::Result<SectorCids>;

    /// Drops the cache layers only needed while sealing. The unsealed copy is
    /// removed too unless `keep_unsealed` is set.
    fn finalize_sector(&self, sector: &SectorRef, keep_unsealed: bool) -> anyhow::Result<()>;

    fn generate_window_post(
        &self,
        miner: ActorID,
        sector_infos: &[SectorInfo],
        randomness: &PoStRandomness,
    ) -> anyhow::Result<WindowPoStOutput>;

    fn verify_window_post(
        &self,
        miner: ActorID,
        sector_infos: &[SectorInfo],
        randomness: &PoStRandomness,
        proofs: &[PoStProof],
    ) -> anyhow::Result<bool>;
}

/// `size` zero bytes, the content of a sector without deals.
pub fn null_reader(size: UnpaddedPieceSize) -> Box<dyn Read + Send> {
    Box::new(std::io::repeat(0).take(size.0))
}

/// The largest piece that fits into a sector of the given size.
pub fn full_sector_piece_size(sector_size: u64) -> UnpaddedPieceSize {
    PaddedPieceSize(sector_size).unpadded()
}

#[cfg(feature = "proofs")]
pub type DefaultProver = ProofsApiProver;
#[cfg(not(feature = "proofs"))]
pub type DefaultProver = Unavailable;

/// Builds the prover sealing and proving against `store`.
#[cfg(feature = "proofs")]
pub fn default_prover(store: SectorStore) -> anyhow::Result<DefaultProver> {
    Ok(ProofsApiProver::new(store))
}

/// Builds the prover sealing and proving against `store`.
#[cfg(not(feature = "proofs"))]
pub fn default_prover(store: SectorStore) -> anyhow::Result<DefaultProver> {
    anyhow::bail!(
        "the proving library is unavailable for {}, forest sector tools need to be recompiled with `proofs` feature",
        store.root().display()
    )
}

/// Stand-in prover of builds without the `proofs` feature. It can't be
/// constructed.
#[cfg(not(feature = "proofs"))]
#[derive(Debug)]
pub enum Unavailable {}

#[cfg(not(feature = "proofs"))]
impl Prover for Unavailable {
    type Phase1Output = std::convert::Infallible;

    fn add_piece(
        &self,
        _: &SectorRef,
        _: &[UnpaddedPieceSize],
        _: UnpaddedPieceSize,
        _: Box<dyn Read + Send>,
    ) -> anyhow::Result<PieceInfo> {
        match *self {}
    }

    fn seal_pre_commit_phase1(
        &self,
        _: &SectorRef,
        _: &SealRandomness,
        _: &[PieceInfo],
    ) -> anyhow::Result<Self::Phase1Output> {
        match *self {}
    }

    fn seal_pre_commit_phase2(
        &self,
        _: &SectorRef,
        _: Self::Phase1Output,
    ) -> anyhow::Result<SectorCids> {
        match *self {}
    }

    fn finalize_sector(&self, _: &SectorRef, _: bool) -> anyhow::Result<()> {
        match *self {}
    }

    fn generate_window_post(
        &self,
        _: ActorID,
        _: &[SectorInfo],
        _: &PoStRandomness,
    ) -> anyhow::Result<WindowPoStOutput> {
        match *self {}
    }

    fn verify_window_post(
        &self,
        _: ActorID,
        _: &[SectorInfo],
        _: &PoStRandomness,
        _: &[PoStProof],
    ) -> anyhow::Result<bool> {
        match *self {}
    }
}
