// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::bail;
pub use fvm_shared4::ActorID;
pub use fvm_shared4::sector::{
    PoStProof, RegisteredPoStProof, RegisteredSealProof, SectorInfo, SectorNumber, SectorSize,
};
use fvm_shared4::version::NetworkVersion;

/// A sector identity together with the seal proof type it is sealed with.
///
/// The proof type is derived once per batch from the chain state (sector size
/// and network version), not per sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorRef {
    pub miner: ActorID,
    pub number: SectorNumber,
    pub proof_type: RegisteredSealProof,
}

impl SectorRef {
    /// Directory/file name of this sector's artifacts, e.g. `s-t01000-5`.
    pub fn name(&self) -> String {
        sector_name(self.miner, self.number)
    }

    pub fn sector_size(&self) -> anyhow::Result<SectorSize> {
        self.proof_type
            .sector_size()
            .map_err(|e| anyhow::anyhow!("sector {}: {e}", self.name()))
    }
}

/// Actor and proof type shared by every sector of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorTemplate {
    pub miner: ActorID,
    pub proof_type: RegisteredSealProof,
}

impl SectorTemplate {
    pub fn new(miner: ActorID, sector_size: SectorSize, network_version: NetworkVersion) -> Self {
        Self {
            miner,
            proof_type: RegisteredSealProof::from_sector_size(sector_size, network_version),
        }
    }

    pub fn sector(&self, number: SectorNumber) -> SectorRef {
        SectorRef {
            miner: self.miner,
            number,
            proof_type: self.proof_type,
        }
    }
}

/// Lotus naming convention for sector artifacts.
pub fn sector_name(miner: ActorID, number: SectorNumber) -> String {
    format!("s-t0{miner}-{number}")
}

pub fn sector_size_from_bytes(bytes: u64) -> anyhow::Result<SectorSize> {
    Ok(match bytes {
        b if b == SectorSize::_2KiB as u64 => SectorSize::_2KiB,
        b if b == SectorSize::_8MiB as u64 => SectorSize::_8MiB,
        b if b == SectorSize::_512MiB as u64 => SectorSize::_512MiB,
        b if b == SectorSize::_32GiB as u64 => SectorSize::_32GiB,
        b if b == SectorSize::_64GiB as u64 => SectorSize::_64GiB,
        other => bail!("unsupported sector size: {other} bytes"),
    })
}

/// Window PoSt proof type used to prove sectors sealed with `seal_proof`.
pub fn registered_window_post_proof(
    seal_proof: RegisteredSealProof,
) -> anyhow::Result<RegisteredPoStProof> {
    use RegisteredPoStProof as PoStProof;
    use RegisteredSealProof as SealProof;
    match seal_proof {
        SealProof::StackedDRG64GiBV1
        | SealProof::StackedDRG64GiBV1P1
        | SealProof::StackedDRG64GiBV1P1_Feat_SyntheticPoRep
        | SealProof::StackedDRG64GiBV1P2_Feat_NiPoRep => Ok(PoStProof::StackedDRGWindow64GiBV1P1),
        SealProof::StackedDRG32GiBV1
        | SealProof::StackedDRG32GiBV1P1
        | SealProof::StackedDRG32GiBV1P1_Feat_SyntheticPoRep
        | SealProof::StackedDRG32GiBV1P2_Feat_NiPoRep => Ok(PoStProof::StackedDRGWindow32GiBV1P1),
        SealProof::StackedDRG2KiBV1
        | SealProof::StackedDRG2KiBV1P1
        | SealProof::StackedDRG2KiBV1P1_Feat_SyntheticPoRep
        | SealProof::StackedDRG2KiBV1P2_Feat_NiPoRep => Ok(PoStProof::StackedDRGWindow2KiBV1P1),
        SealProof::StackedDRG8MiBV1
        | SealProof::StackedDRG8MiBV1P1
        | SealProof::StackedDRG8MiBV1P1_Feat_SyntheticPoRep
        | SealProof::StackedDRG8MiBV1P2_Feat_NiPoRep => Ok(PoStProof::StackedDRGWindow8MiBV1P1),
        SealProof::StackedDRG512MiBV1
        | SealProof::StackedDRG512MiBV1P1
        | SealProof::StackedDRG512MiBV1P1_Feat_SyntheticPoRep
        | SealProof::StackedDRG512MiBV1P2_Feat_NiPoRep => {
            Ok(PoStProof::StackedDRGWindow512MiBV1P1)
        }
        SealProof::Invalid(_) => bail!(
            "Unsupported mapping from {:?} to PoSt-window RegisteredProof",
            seal_proof
        ),
    }
}
