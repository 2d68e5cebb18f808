// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Filesystem layout of sealing artifacts.
//!
//! A store root holds one directory per [`PathType`], each containing one
//! entry per sector named after [`sector_name`](crate::shim::sector::sector_name):
//! ```text
//! <root>/unsealed/s-t01000-5
//! <root>/sealed/s-t01000-5
//! <root>/cache/s-t01000-5/
//! ```

mod relocate;

pub use relocate::{RelocateError, relocate};

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use strum::IntoEnumIterator as _;

use crate::shim::sector::SectorRef;

/// Artifact category of a sector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PathType {
    Unsealed,
    Sealed,
    Cache,
}

impl PathType {
    /// Categories moved to final storage after a successful redo. A redone
    /// sector only ever holds filler data, so its unsealed copy stays behind.
    pub fn relocatable() -> impl Iterator<Item = PathType> {
        PathType::iter().filter(|it| *it != PathType::Unsealed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorStore {
    root: PathBuf,
}

impl SectorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn type_dir(&self, path_type: PathType) -> PathBuf {
        self.root.join(path_type.as_ref())
    }

    pub fn sector_path(&self, path_type: PathType, sector: &SectorRef) -> PathBuf {
        self.type_dir(path_type).join(sector.name())
    }

    /// Creates the per-[`PathType`] directories that don't exist yet.
    pub fn ensure_type_dirs(&self) -> anyhow::Result<()> {
        for path_type in PathType::iter() {
            let dir = self.type_dir(path_type);
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("couldn't create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
