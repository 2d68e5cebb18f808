// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::chain::{SealTicket, SectorStatus};
use ::cid::Cid;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SealTicketLotusJson {
    #[serde(with = "base64_standard")]
    value: Vec<u8>,
    epoch: i64,
}

/// The subset of the miner's `SectorInfo` (`Filecoin.SectorsStatus`) a redo
/// needs.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorStatusLotusJson {
    #[serde(rename = "SectorID")]
    sector_id: u64,
    ticket: SealTicketLotusJson,
    #[serde(default)]
    comm_r: LotusJson<Option<Cid>>,
}

impl HasLotusJson for SectorStatus {
    type LotusJson = SectorStatusLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![
            (
                json!({
                    "SectorID": 9,
                    "Ticket": {"Value": "AQID", "Epoch": 100},
                    "CommR": {"/": "baeaaaaa"}
                }),
                SectorStatus {
                    sector_number: 9,
                    ticket: SealTicket {
                        value: vec![1, 2, 3],
                        epoch: 100,
                    },
                    comm_r: Some(Cid::default()),
                },
            ),
            (
                json!({
                    "SectorID": 0,
                    "Ticket": {"Value": "", "Epoch": 0},
                    "CommR": null
                }),
                SectorStatus {
                    sector_number: 0,
                    ticket: SealTicket {
                        value: vec![],
                        epoch: 0,
                    },
                    comm_r: None,
                },
            ),
        ]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            sector_number,
            ticket: SealTicket { value, epoch },
            comm_r,
        } = self;
        Self::LotusJson {
            sector_id: sector_number,
            ticket: SealTicketLotusJson { value, epoch },
            comm_r: comm_r.into(),
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            sector_id,
            ticket: SealTicketLotusJson { value, epoch },
            comm_r,
        } = lotus_json;
        Self {
            sector_number: sector_id,
            ticket: SealTicket { value, epoch },
            comm_r: comm_r.into_inner(),
        }
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<SectorStatus>();
}

#[test]
fn miner_sector_info_parses() {
    let status = serde_json::from_value::<LotusJson<SectorStatus>>(json!({
        "SectorID": 5,
        "State": "Proving",
        "CommD": {"/": "baga6ea4seaqao7s73y24kcutaosvacpdjgfe5pw76ooefnyqw4ynr3d2y6x2mpq"},
        "CommR": {"/": "bagboea4b5abcatlxechwbp7kjpjguna6r6q7ejrhe6mdp3lf34pmswn27pkkiekz"},
        "Proof": "AAAA",
        "Deals": null,
        "Pieces": null,
        "Ticket": {"Value": "3q2+7w==", "Epoch": 1234},
        "Seed": {"Value": null, "Epoch": 0},
        "Retries": 0,
        "LastErr": "",
        "Log": null,
        "SealProof": 8
    }))
    .unwrap()
    .into_inner();
    assert_eq!(status.sector_number, 5);
    assert_eq!(status.ticket.value, vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(status.ticket.epoch, 1234);
    assert_eq!(
        status.comm_r.map(|it| it.to_string()).as_deref(),
        Some("bagboea4b5abcatlxechwbp7kjpjguna6r6q7ejrhe6mdp3lf34pmswn27pkkiekz")
    );
}
