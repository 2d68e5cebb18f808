// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Read access to chain state and to the miner's sealing records.

pub mod lotus;

pub use lotus::LotusChainReader;

use async_trait::async_trait;
use cid::Cid;
use fvm_ipld_bitfield::BitField;
use fvm_shared4::{clock::ChainEpoch, version::NetworkVersion};
use tracing::info;

use crate::shim::{
    address::Address,
    sector::{SectorInfo, SectorNumber, SectorSize},
};

/// Sealing randomness a sector was pre-committed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealTicket {
    pub value: Vec<u8>,
    pub epoch: ChainEpoch,
}

/// The miner's record of a sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorStatus {
    pub sector_number: SectorNumber,
    pub ticket: SealTicket,
    /// Sealed CID committed on chain, if any.
    pub comm_r: Option<Cid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerInfo {
    pub sector_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub all_sectors: BitField,
    pub faulty_sectors: BitField,
    pub recovering_sectors: BitField,
    pub live_sectors: BitField,
    pub active_sectors: BitField,
}

/// Chain state and miner records the redo pipeline and the window PoSt
/// emulator depend on.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Address of the miner actor the connected miner API runs.
    async fn actor_address(&self) -> anyhow::Result<Address>;

    /// Sector size of `miner` and the network version at the chain head.
    async fn sector_size_and_network_version(
        &self,
        miner: &Address,
    ) -> anyhow::Result<(SectorSize, NetworkVersion)>;

    async fn sector_status(&self, number: SectorNumber) -> anyhow::Result<SectorStatus>;

    /// Committed sector infos of the sectors in `sectors`. Sectors unknown to the
    /// chain are absent from the result.
    async fn miner_sectors(
        &self,
        miner: &Address,
        sectors: &BitField,
    ) -> anyhow::Result<Vec<SectorInfo>>;

    /// Live sectors of each partition of `deadline`, in partition order.
    async fn deadline_partitions(
        &self,
        miner: &Address,
        deadline: u64,
    ) -> anyhow::Result<Vec<BitField>>;
}

/// An explicit actor wins; otherwise ask the miner API.
pub async fn resolve_actor_address(
    actor: Option<Address>,
    chain: &dyn ChainReader,
) -> anyhow::Result<Address> {
    match actor {
        Some(actor) => Ok(actor),
        None => {
            let actor = chain.actor_address().await?;
            info!("using actor address {actor} of the miner API");
            Ok(actor)
        }
    }
}
