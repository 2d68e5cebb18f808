// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::shim::sector::{RegisteredSealProof, SectorInfo};
use ::cid::Cid;

/// The subset of `SectorOnChainInfo` (`Filecoin.StateMinerSectors`) a window
/// PoSt needs. Lotus sends many more fields; they are ignored.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorInfoLotusJson {
    seal_proof: LotusJson<RegisteredSealProof>,
    sector_number: u64,
    #[serde(rename = "SealedCID")]
    sealed_cid: LotusJson<Cid>,
}

impl HasLotusJson for SectorInfo {
    type LotusJson = SectorInfoLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(
            json!({
                "SealProof": 0,
                "SectorNumber": 0,
                "SealedCID": {
                    "/": "baeaaaaa"
                }
            }),
            Self {
                proof: RegisteredSealProof::StackedDRG2KiBV1,
                sector_number: 0,
                sealed_cid: Cid::default(),
            },
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            proof,
            sector_number,
            sealed_cid,
        } = self;
        Self::LotusJson {
            seal_proof: proof.into(),
            sector_number,
            sealed_cid: sealed_cid.into(),
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            seal_proof,
            sector_number,
            sealed_cid,
        } = lotus_json;
        Self {
            proof: seal_proof.into_inner(),
            sector_number,
            sealed_cid: sealed_cid.into_inner(),
        }
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<SectorInfo>();
}

#[test]
fn on_chain_info_extra_fields_are_ignored() {
    let it = serde_json::from_value::<LotusJson<Vec<SectorInfo>>>(json!([{
        "SectorNumber": 7,
        "SealProof": 8,
        "SealedCID": {"/": "bagboea4b5abcatlxechwbp7kjpjguna6r6q7ejrhe6mdp3lf34pmswn27pkkiekz"},
        "DealIDs": null,
        "Activation": 1000,
        "Expiration": 2000,
        "DealWeight": "0",
        "VerifiedDealWeight": "0",
        "InitialPledge": "0",
        "ExpectedDayReward": "0",
        "ExpectedStoragePledge": "0",
        "SectorKeyCID": null
    }]))
    .unwrap()
    .into_inner();
    assert_eq!(it.len(), 1);
    assert_eq!(it[0].sector_number, 7);
    assert_eq!(it[0].proof, RegisteredSealProof::StackedDRG32GiBV1P1);
}
