// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
pub use fvm_shared4::address::Address;
use fvm_shared4::address::Network;

use super::sector::ActorID;

/// Parses an address with either the mainnet (`f`) or the testnet (`t`) prefix.
pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    Network::Mainnet
        .parse_address(s)
        .or_else(|_| Network::Testnet.parse_address(s))
        .with_context(|| format!("invalid actor address: {s}"))
}

/// The actor id behind an `ID` address, e.g. `1000` for `f01000`.
pub fn actor_id(address: &Address) -> anyhow::Result<ActorID> {
    address
        .id()
        .with_context(|| format!("{address} is not an ID address"))
}
