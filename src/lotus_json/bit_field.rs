// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use fvm_ipld_bitfield::{BitField, iter::Ranges};

/// Run-length encoding of a bitfield: alternating run lengths of unset and
/// set bits, starting with an unset run. The empty bitfield is `[0]`.
pub struct BitFieldLotusJson(BitField);

impl Serialize for BitFieldLotusJson {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut runs = vec![];
        let mut offset = 0;
        for range in self.0.ranges() {
            runs.push(range.start - offset);
            runs.push(range.end - range.start);
            offset = range.end;
        }
        if runs.is_empty() {
            runs.push(0);
        }
        runs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BitFieldLotusJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let runs = Option::<Vec<u64>>::deserialize(deserializer)?.unwrap_or_default();
        let mut ranges = vec![];
        let mut offset = 0u64;
        for (i, run) in runs.into_iter().enumerate() {
            let end = offset
                .checked_add(run)
                .ok_or_else(|| serde::de::Error::custom(format!("bitfield run {i} overflows")))?;
            if i % 2 == 1 && run > 0 {
                ranges.push(offset..end);
            }
            offset = end;
        }
        Ok(Self(BitField::from_ranges(Ranges::new(ranges))))
    }
}

impl HasLotusJson for BitField {
    type LotusJson = BitFieldLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![
            (json!([0]), Self::new()),
            (json!([1, 1]), {
                let mut it = Self::new();
                it.set(1);
                it
            }),
            (json!([0, 3, 2, 1]), {
                let mut it = Self::new();
                for bit in [0, 1, 2, 5] {
                    it.set(bit);
                }
                it
            }),
        ]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        BitFieldLotusJson(self)
    }

    fn from_lotus_json(BitFieldLotusJson(it): Self::LotusJson) -> Self {
        it
    }
}

#[test]
fn snapshots() {
    assert_all_snapshots::<BitField>();
}

#[test]
fn null_is_empty() {
    let it = serde_json::from_value::<LotusJson<BitField>>(json!(null)).unwrap();
    assert!(it.into_inner().is_empty());
}

#[test]
fn overflowing_runs_are_rejected() {
    assert!(serde_json::from_value::<LotusJson<BitField>>(json!([u64::MAX, 2])).is_err());
}

#[cfg(test)]
quickcheck! {
    fn quickcheck(bits: Vec<u16>) -> () {
        let mut it = BitField::new();
        for bit in bits {
            it.set(u64::from(bit));
        }
        assert_unchanged_via_json(it)
    }
}
