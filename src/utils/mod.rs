// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod commcid;
pub mod rand;

use std::path::{Path, PathBuf};

use itertools::Itertools as _;
use tracing::warn;

use crate::shim::sector::SectorNumber;

/// Sector numbers parsed out of a comma separated list such as `1,2,5`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorNumbers {
    /// Well-formed numbers in input order, duplicates removed.
    pub numbers: Vec<SectorNumber>,
    /// Tokens that are not sector numbers.
    pub skipped: Vec<String>,
}

/// Parses a comma separated sector number list. Malformed tokens are logged and
/// collected in [`SectorNumbers::skipped`]; they never abort the whole list.
pub fn parse_sector_numbers(list: &str) -> SectorNumbers {
    let mut skipped = vec![];
    let numbers = list
        .split(',')
        .map(str::trim)
        .filter_map(|token| match token.parse::<SectorNumber>() {
            Ok(number) => Some(number),
            Err(e) => {
                warn!("skipping sector id {token:?}: {e}");
                skipped.push(token.to_owned());
                None
            }
        })
        .unique()
        .collect();
    SectorNumbers { numbers, skipped }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), directories::BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}
