// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::chain::MinerInfo;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerInfoLotusJson {
    sector_size: u64,
}

impl HasLotusJson for MinerInfo {
    type LotusJson = MinerInfoLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(
            json!({"SectorSize": 34359738368_u64}),
            MinerInfo {
                sector_size: 34359738368,
            },
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self { sector_size } = self;
        Self::LotusJson { sector_size }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson { sector_size } = lotus_json;
        Self { sector_size }
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<MinerInfo>();
}

#[test]
fn state_miner_info_parses() {
    let info = serde_json::from_value::<LotusJson<MinerInfo>>(json!({
        "Owner": "f01234",
        "Worker": "f01235",
        "NewWorker": "<empty>",
        "ControlAddresses": null,
        "WorkerChangeEpoch": -1,
        "PeerId": null,
        "Multiaddrs": null,
        "WindowPoStProofType": 3,
        "SectorSize": 2048,
        "WindowPoStPartitionSectors": 2,
        "ConsensusFaultElapsed": -1
    }))
    .unwrap()
    .into_inner();
    assert_eq!(info.sector_size, 2048);
}
