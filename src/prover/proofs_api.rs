// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Read;

use anyhow::{Context as _, bail};
use filecoin_proofs_api::{
    self as api, PrivateReplicaInfo, ProverId, PublicReplicaInfo, SectorId, UnpaddedBytesAmount,
    post, seal,
};
use tracing::{debug, warn};

use super::{
    PieceInfo, PoStRandomness, Prover, SealRandomness, SectorCids, UnpaddedPieceSize,
    WindowPoStOutput,
};
use crate::shim::address::Address;
use crate::shim::sector::{
    ActorID, PoStProof, RegisteredPoStProof, RegisteredSealProof, SectorInfo, SectorRef,
    registered_window_post_proof,
};
use crate::store::{PathType, SectorStore};
use crate::utils::commcid;

/// [`Prover`] running `filecoin-proofs` over the artifacts of a [`SectorStore`].
#[derive(Debug, Clone)]
pub struct ProofsApiProver {
    store: SectorStore,
}

impl ProofsApiProver {
    pub fn new(store: SectorStore) -> Self {
        Self { store }
    }
}

/// The 32-byte prover id of a miner: the payload of its `ID` address,
/// zero-padded.
pub fn prover_id_from_u64(id: u64) -> ProverId {
    let mut prover_id = ProverId::default();
    let prover_bytes = Address::new_id(id).payload().to_raw_bytes();
    prover_id[..prover_bytes.len()].copy_from_slice(&prover_bytes);
    prover_id
}

fn seal_proof(proof: RegisteredSealProof) -> anyhow::Result<api::RegisteredSealProof> {
    proof.try_into().map_err(|e: String| anyhow::anyhow!(e))
}

fn window_post_proof(proof: RegisteredPoStProof) -> anyhow::Result<api::RegisteredPoStProof> {
    proof.try_into().map_err(|e: String| anyhow::anyhow!(e))
}

fn replica_commitment(info: &SectorInfo) -> anyhow::Result<api::Commitment> {
    commcid::cid_to_replica_commitment_v1(&info.sealed_cid)
        .with_context(|| format!("sector {}: invalid sealed CID", info.sector_number))
}

impl Prover for ProofsApiProver {
    type Phase1Output = seal::SealPreCommitPhase1Output;

    fn add_piece(
        &self,
        sector: &SectorRef,
        existing_piece_sizes: &[UnpaddedPieceSize],
        piece_size: UnpaddedPieceSize,
        data: Box<dyn Read + Send>,
    ) -> anyhow::Result<PieceInfo> {
        let path = self.store.sector_path(PathType::Unsealed, sector);
        let target = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(existing_piece_sizes.is_empty())
            .open(&path)
            .with_context(|| format!("couldn't open {}", path.display()))?;
        let existing = existing_piece_sizes
            .iter()
            .map(|it| UnpaddedBytesAmount(it.0))
            .collect::<Vec<_>>();
        let (piece, _) = seal::add_piece(
            seal_proof(sector.proof_type)?,
            data,
            target,
            UnpaddedBytesAmount(piece_size.0),
            &existing,
        )?;
        Ok(PieceInfo {
            size: piece_size.padded(),
            cid: commcid::data_commitment_v1_to_cid(&piece.commitment)?,
        })
    }

    fn seal_pre_commit_phase1(
        &self,
        sector: &SectorRef,
        ticket: &SealRandomness,
        pieces: &[PieceInfo],
    ) -> anyhow::Result<Self::Phase1Output> {
        let cache = self.store.sector_path(PathType::Cache, sector);
        std::fs::create_dir_all(&cache)
            .with_context(|| format!("couldn't create {}", cache.display()))?;
        let sealed = self.store.sector_path(PathType::Sealed, sector);
        // the replica is written in place of an empty file
        std::fs::File::create(&sealed)
            .with_context(|| format!("couldn't create {}", sealed.display()))?;
        let pieces = pieces
            .iter()
            .map(|it| {
                Ok(api::PieceInfo {
                    commitment: commcid::cid_to_data_commitment_v1(&it.cid)?,
                    size: UnpaddedBytesAmount(it.size.unpadded().0),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        seal::seal_pre_commit_phase1(
            seal_proof(sector.proof_type)?,
            cache,
            self.store.sector_path(PathType::Unsealed, sector),
            sealed,
            prover_id_from_u64(sector.miner),
            SectorId::from(sector.number),
            *ticket,
            &pieces,
        )
    }

    fn seal_pre_commit_phase2(
        &self,
        sector: &SectorRef,
        phase1_output: Self::Phase1Output,
    ) -> anyhow::Result<SectorCids> {
        let out = seal::seal_pre_commit_phase2(
            phase1_output,
            self.store.sector_path(PathType::Cache, sector),
            self.store.sector_path(PathType::Sealed, sector),
        )?;
        Ok(SectorCids {
            sealed: commcid::replica_commitment_v1_to_cid(&out.comm_r)?,
            unsealed: commcid::data_commitment_v1_to_cid(&out.comm_d)?,
        })
    }

    fn finalize_sector(&self, sector: &SectorRef, keep_unsealed: bool) -> anyhow::Result<()> {
        let cache = self.store.sector_path(PathType::Cache, sector);
        seal::clear_cache(sector.sector_size()? as u64, &cache)
            .with_context(|| format!("couldn't clear {}", cache.display()))?;
        if !keep_unsealed {
            let unsealed = self.store.sector_path(PathType::Unsealed, sector);
            match std::fs::remove_file(&unsealed) {
                Ok(()) => debug!("removed {}", unsealed.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("couldn't remove {}", unsealed.display()));
                }
            }
        }
        Ok(())
    }

    fn generate_window_post(
        &self,
        miner: ActorID,
        sector_infos: &[SectorInfo],
        randomness: &PoStRandomness,
    ) -> anyhow::Result<WindowPoStOutput> {
        let mut output = WindowPoStOutput::default();
        let mut replicas = BTreeMap::new();
        let mut post_proof = None;
        for info in sector_infos {
            let sector = SectorRef {
                miner,
                number: info.sector_number,
                proof_type: info.proof,
            };
            let sealed = self.store.sector_path(PathType::Sealed, &sector);
            let cache = self.store.sector_path(PathType::Cache, &sector);
            if !sealed.is_file() || !cache.is_dir() {
                warn!(sector = info.sector_number, "sector artifacts are missing, skipping");
                output.skipped.push(info.sector_number);
                continue;
            }
            let expected_len = sector.sector_size()? as u64;
            if std::fs::metadata(&sealed)?.len() != expected_len {
                warn!(sector = info.sector_number, "sealed replica is truncated");
                output.faulty.push(info.sector_number);
                continue;
            }
            let proof = registered_window_post_proof(info.proof)?;
            post_proof.get_or_insert(proof);
            replicas.insert(
                SectorId::from(info.sector_number),
                PrivateReplicaInfo::new(
                    window_post_proof(proof)?,
                    replica_commitment(info)?,
                    cache,
                    sealed,
                ),
            );
        }
        let Some(post_proof) = post_proof else {
            bail!("none of the {} sectors can be proven", sector_infos.len());
        };
        output.proofs = post::generate_window_post(randomness, &replicas, prover_id_from_u64(miner))?
            .into_iter()
            .map(|(_, proof_bytes)| PoStProof {
                post_proof,
                proof_bytes,
            })
            .collect();
        Ok(output)
    }

    fn verify_window_post(
        &self,
        miner: ActorID,
        sector_infos: &[SectorInfo],
        randomness: &PoStRandomness,
        proofs: &[PoStProof],
    ) -> anyhow::Result<bool> {
        let replicas = sector_infos
            .iter()
            .map(|info| {
                let proof = window_post_proof(registered_window_post_proof(info.proof)?)?;
                Ok((
                    SectorId::from(info.sector_number),
                    PublicReplicaInfo::new(proof, replica_commitment(info)?),
                ))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;
        let proofs = proofs
            .iter()
            .map(|it| Ok((window_post_proof(it.post_proof)?, it.proof_bytes.as_slice())))
            .collect::<anyhow::Result<Vec<_>>>()?;
        post::verify_window_post(randomness, &proofs, &replicas, prover_id_from_u64(miner))
    }
}
