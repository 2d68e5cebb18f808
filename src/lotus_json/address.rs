// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::shim::address::{Address, parse_address};

/// Addresses are strings. Both the `f` and the `t` network prefix are accepted.
pub struct AddressLotusJson(Address);

impl Serialize for AddressLotusJson {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AddressLotusJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_address(&String::deserialize(deserializer)?)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

impl HasLotusJson for Address {
    type LotusJson = AddressLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(json!("f01000"), Address::new_id(1000))]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        AddressLotusJson(self)
    }

    fn from_lotus_json(AddressLotusJson(it): Self::LotusJson) -> Self {
        it
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<Address>();
}

#[test]
fn testnet_prefix_is_accepted() {
    let it = serde_json::from_value::<LotusJson<Address>>(json!("t01000")).unwrap();
    assert_eq!(it.into_inner(), Address::new_id(1000));
    assert!(serde_json::from_value::<LotusJson<Address>>(json!("q01000")).is_err());
}
