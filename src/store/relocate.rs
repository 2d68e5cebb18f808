// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    #[error("base names must match ('{from}' != '{to}')")]
    NameMismatch { from: String, to: String },
    #[error("{0} has no final path component")]
    NoFileName(PathBuf),
    #[error("moving {} to {}: {source}", .from.display(), .to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Moves a sector artifact (file or directory) from `from` to `to`.
///
/// Both paths must end in the same component. A plain rename is tried first;
/// across filesystems the artifact is copied and the source removed.
pub async fn relocate(from: &Path, to: &Path) -> Result<(), RelocateError> {
    let from_name = file_name(from)?;
    let to_name = file_name(to)?;
    if from_name != to_name {
        return Err(RelocateError::NameMismatch {
            from: from_name.to_string_lossy().into_owned(),
            to: to_name.to_string_lossy().into_owned(),
        });
    }

    debug!(from = %from.display(), to = %to.display(), "moving sector data");

    let io_err = |source: io::Error| RelocateError::Io {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    let to_dir = to
        .parent()
        .ok_or_else(|| RelocateError::NoFileName(to.to_path_buf()))?;
    tokio::fs::create_dir_all(to_dir).await.map_err(io_err)?;

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let (src, dst_dir) = (from.to_path_buf(), to_dir.to_path_buf());
            tokio::task::spawn_blocking(move || {
                fs_extra::move_items(&[&src], &dst_dir, &fs_extra::dir::CopyOptions::new())
                    .map_err(io::Error::other)
            })
            .await
            .map_err(|e| io_err(io::Error::other(e)))?
            .map(|_| ())
            .map_err(io_err)
        }
        Err(e) => Err(io_err(e)),
    }
}

fn file_name(path: &Path) -> Result<&OsStr, RelocateError> {
    path.file_name()
        .ok_or_else(|| RelocateError::NoFileName(path.to_path_buf()))
}
