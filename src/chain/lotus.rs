// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use async_trait::async_trait;
use cid::Cid;
use fvm_ipld_bitfield::BitField;
use fvm_shared4::version::NetworkVersion;

use super::{ChainReader, MinerInfo, Partition, SectorStatus};
use crate::rpc_client::{ApiInfo, ApiVersion, Client, RpcRequest};
use crate::shim::{
    address::Address,
    sector::{SectorInfo, SectorNumber, SectorSize, sector_size_from_bytes},
};

/// [`ChainReader`] over the Lotus JSON-RPC API. Chain state comes from the full
/// node (`/rpc/v1`), sealing records from the miner (`/rpc/v0`).
#[derive(Debug)]
pub struct LotusChainReader {
    full_node: Client,
    miner: Option<Client>,
}

impl LotusChainReader {
    pub async fn connect(full_node: &ApiInfo, miner: Option<&ApiInfo>) -> anyhow::Result<Self> {
        let full_node = Client::from_api_info(full_node, ApiVersion::V1)
            .await
            .context("couldn't connect to the full node API")?;
        let miner = match miner {
            Some(miner) => Some(
                Client::from_api_info(miner, ApiVersion::V0)
                    .await
                    .context("couldn't connect to the miner API")?,
            ),
            None => None,
        };
        Ok(Self { full_node, miner })
    }

    fn miner(&self) -> anyhow::Result<&Client> {
        self.miner
            .as_ref()
            .context("the miner API is not configured")
    }
}

/// Request builders of the Lotus methods in use. All chain state is read at the
/// heaviest tipset, which Lotus takes as the empty tipset key.
pub mod methods {
    use super::*;

    fn heaviest_tipset() -> Vec<Cid> {
        vec![]
    }

    pub fn actor_address() -> RpcRequest<Address> {
        RpcRequest::new("Filecoin.ActorAddress", ())
    }

    pub fn sectors_status(number: SectorNumber) -> RpcRequest<SectorStatus> {
        RpcRequest::new("Filecoin.SectorsStatus", (number, false))
    }

    pub fn state_miner_info(miner: Address) -> RpcRequest<MinerInfo> {
        RpcRequest::new("Filecoin.StateMinerInfo", (miner, heaviest_tipset()))
    }

    pub fn state_network_version() -> RpcRequest<u32> {
        RpcRequest::new("Filecoin.StateNetworkVersion", (heaviest_tipset(),))
    }

    pub fn state_miner_sectors(miner: Address, sectors: BitField) -> RpcRequest<Vec<SectorInfo>> {
        RpcRequest::new(
            "Filecoin.StateMinerSectors",
            (miner, sectors, heaviest_tipset()),
        )
    }

    pub fn state_miner_partitions(miner: Address, deadline: u64) -> RpcRequest<Vec<Partition>> {
        RpcRequest::new(
            "Filecoin.StateMinerPartitions",
            (miner, deadline, heaviest_tipset()),
        )
    }
}

#[async_trait]
impl ChainReader for LotusChainReader {
    async fn actor_address(&self) -> anyhow::Result<Address> {
        self.miner()?.call(methods::actor_address()).await
    }

    async fn sector_size_and_network_version(
        &self,
        miner: &Address,
    ) -> anyhow::Result<(SectorSize, NetworkVersion)> {
        let info = self
            .full_node
            .call(methods::state_miner_info(*miner))
            .await?;
        let network_version = self
            .full_node
            .call(methods::state_network_version())
            .await?;
        Ok((
            sector_size_from_bytes(info.sector_size)?,
            NetworkVersion::new(network_version),
        ))
    }

    async fn sector_status(&self, number: SectorNumber) -> anyhow::Result<SectorStatus> {
        self.miner()?.call(methods::sectors_status(number)).await
    }

    async fn miner_sectors(
        &self,
        miner: &Address,
        sectors: &BitField,
    ) -> anyhow::Result<Vec<SectorInfo>> {
        self.full_node
            .call(methods::state_miner_sectors(*miner, sectors.clone()))
            .await
    }

    async fn deadline_partitions(
        &self,
        miner: &Address,
        deadline: u64,
    ) -> anyhow::Result<Vec<BitField>> {
        let partitions = self
            .full_node
            .call(methods::state_miner_partitions(*miner, deadline))
            .await?;
        Ok(partitions.into_iter().map(|it| it.live_sectors).collect())
    }
}
