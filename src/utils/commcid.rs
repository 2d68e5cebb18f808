// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Conversions between raw 32-byte sector commitments and the CIDs Lotus uses
//! for them on chain.

use cid::{Cid, multihash::Multihash};

pub type Commitment = [u8; 32];

/// Multicodec of sealed replica commitments (`CommR`).
pub const FIL_COMMITMENT_SEALED: u64 = 0xf102;
/// Multicodec of unsealed data commitments (`CommD`, `CommP`).
pub const FIL_COMMITMENT_UNSEALED: u64 = 0xf101;
/// Multihash code for Sha2 256 trunc254 padded used in data commitments.
pub const SHA2_256_TRUNC254_PADDED: u64 = 0x1012;
/// Multihash code for Poseidon BLS replica commitments.
pub const POSEIDON_BLS12_381_A1_FC1: u64 = 0xb401;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommCidError {
    #[error("invalid commitment codec {0:#x}")]
    Codec(u64),
    #[error("invalid commitment hash {0:#x}")]
    Hash(u64),
    #[error("commitments must be 32 bytes long, got {0}")]
    Length(usize),
}

fn validate_segments(codec: u64, hash: u64, digest: &[u8]) -> Result<(), CommCidError> {
    match (codec, hash) {
        (FIL_COMMITMENT_UNSEALED, SHA2_256_TRUNC254_PADDED)
        | (FIL_COMMITMENT_SEALED, POSEIDON_BLS12_381_A1_FC1) => {}
        (FIL_COMMITMENT_UNSEALED | FIL_COMMITMENT_SEALED, other) => {
            return Err(CommCidError::Hash(other));
        }
        (other, _) => return Err(CommCidError::Codec(other)),
    }
    if digest.len() != 32 {
        return Err(CommCidError::Length(digest.len()));
    }
    Ok(())
}

/// Wraps a raw commitment into a `v1` CID with the given filecoin codec and
/// hash type.
pub fn commitment_to_cid(
    codec: u64,
    hash: u64,
    commitment: &Commitment,
) -> Result<Cid, CommCidError> {
    validate_segments(codec, hash, commitment)?;
    let mh = Multihash::<64>::wrap(hash, commitment)
        .map_err(|_| CommCidError::Length(commitment.len()))?;
    Ok(Cid::new_v1(codec, mh))
}

/// Extracts codec, hash type and raw commitment from a CID after validating
/// that they are consistent.
pub fn cid_to_commitment(c: &Cid) -> Result<(u64, u64, Commitment), CommCidError> {
    let digest = c.hash().digest();
    validate_segments(c.codec(), c.hash().code(), digest)?;
    let mut comm = Commitment::default();
    comm.copy_from_slice(digest);
    Ok((c.codec(), c.hash().code(), comm))
}

pub fn data_commitment_v1_to_cid(comm_d: &Commitment) -> Result<Cid, CommCidError> {
    commitment_to_cid(FIL_COMMITMENT_UNSEALED, SHA2_256_TRUNC254_PADDED, comm_d)
}

pub fn cid_to_data_commitment_v1(c: &Cid) -> Result<Commitment, CommCidError> {
    match cid_to_commitment(c)? {
        (FIL_COMMITMENT_UNSEALED, _, comm_d) => Ok(comm_d),
        (codec, _, _) => Err(CommCidError::Codec(codec)),
    }
}

pub fn replica_commitment_v1_to_cid(comm_r: &Commitment) -> Result<Cid, CommCidError> {
    commitment_to_cid(FIL_COMMITMENT_SEALED, POSEIDON_BLS12_381_A1_FC1, comm_r)
}

pub fn cid_to_replica_commitment_v1(c: &Cid) -> Result<Commitment, CommCidError> {
    match cid_to_commitment(c)? {
        (FIL_COMMITMENT_SEALED, _, comm_r) => Ok(comm_r),
        (codec, _, _) => Err(CommCidError::Codec(codec)),
    }
}
