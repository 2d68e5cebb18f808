// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::chain::Partition;
use fvm_ipld_bitfield::BitField;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartitionLotusJson {
    all_sectors: LotusJson<BitField>,
    faulty_sectors: LotusJson<BitField>,
    recovering_sectors: LotusJson<BitField>,
    live_sectors: LotusJson<BitField>,
    active_sectors: LotusJson<BitField>,
}

impl HasLotusJson for Partition {
    type LotusJson = PartitionLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        let bits = |bits: &[u64]| {
            let mut it = BitField::new();
            for bit in bits {
                it.set(*bit);
            }
            it
        };
        vec![(
            json!({
                "AllSectors": [0, 3],
                "FaultySectors": [2, 1],
                "RecoveringSectors": [0],
                "LiveSectors": [0, 3],
                "ActiveSectors": [0, 2]
            }),
            Partition {
                all_sectors: bits(&[0, 1, 2]),
                faulty_sectors: bits(&[2]),
                recovering_sectors: BitField::new(),
                live_sectors: bits(&[0, 1, 2]),
                active_sectors: bits(&[0, 1]),
            },
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            all_sectors,
            faulty_sectors,
            recovering_sectors,
            live_sectors,
            active_sectors,
        } = self;
        Self::LotusJson {
            all_sectors: all_sectors.into(),
            faulty_sectors: faulty_sectors.into(),
            recovering_sectors: recovering_sectors.into(),
            live_sectors: live_sectors.into(),
            active_sectors: active_sectors.into(),
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            all_sectors,
            faulty_sectors,
            recovering_sectors,
            live_sectors,
            active_sectors,
        } = lotus_json;
        Self {
            all_sectors: all_sectors.into_inner(),
            faulty_sectors: faulty_sectors.into_inner(),
            recovering_sectors: recovering_sectors.into_inner(),
            live_sectors: live_sectors.into_inner(),
            active_sectors: active_sectors.into_inner(),
        }
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<Partition>();
}
