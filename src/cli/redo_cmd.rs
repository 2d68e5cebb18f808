// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;

use super::{Command, cancel_on_ctrl_c};
use crate::chain::{ChainReader as _, LotusChainReader, resolve_actor_address};
use crate::cli_shared::cli::{CliOpts, Config};
use crate::prover::default_prover;
use crate::redo::Redo;
use crate::shim::address::{Address, actor_id, parse_address};
use crate::shim::sector::SectorTemplate;
use crate::store::SectorStore;
use crate::utils::{expand_home, parse_sector_numbers};

/// Re-seal committed sectors whose sealing artifacts were lost
#[derive(Debug, clap::Parser)]
#[command(name = "forest-redo", author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"))]
pub struct RedoCommand {
    #[command(flatten)]
    pub opts: CliOpts,
    /// Sector ids to redo, separated by commas, e.g. `1,2`
    #[arg(long)]
    pub sids: String,
    /// Directory the sectors are sealed in [default: `$HOME/redo`]
    #[arg(long)]
    pub seal_dir: Option<PathBuf>,
    /// Directory successfully redone sectors are moved to
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
    /// Number of sectors in piece addition and pre-commit phase 1 at once [default: 1]
    #[arg(long)]
    pub parallel: Option<usize>,
    /// Miner actor address. Defaults to the actor of the miner API
    #[arg(long, value_parser = parse_address)]
    pub actor: Option<Address>,
}

impl Command for RedoCommand {
    fn opts(&self) -> &CliOpts {
        &self.opts
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = Config::read(self.opts.config.as_deref())?;
        let parallel = NonZeroUsize::new(self.parallel.unwrap_or(config.redo.parallel))
            .context("parallel must be greater than 0")?;

        let store = SectorStore::new(seal_dir(self.seal_dir.or(config.redo.seal_dir))?);
        let destination = self
            .storage_dir
            .or(config.redo.storage_dir)
            .map(|it| SectorStore::new(expand_home(&it)));
        for store in std::iter::once(&store).chain(destination.as_ref()) {
            store.ensure_type_dirs()?;
        }
        let sectors = parse_sector_numbers(&self.sids);
        let prover = default_prover(store.clone())?;

        let chain = LotusChainReader::connect(
            &config.api.full_node()?,
            Some(&config.api.miner()?),
        )
        .await?;
        let actor = resolve_actor_address(self.actor, &chain).await?;
        let (sector_size, network_version) = chain
            .sector_size_and_network_version(&actor)
            .await
            .with_context(|| format!("couldn't read the sector size of {actor}"))?;
        let template = SectorTemplate::new(actor_id(&actor)?, sector_size, network_version);
        info!(
            %actor,
            proof_type = ?template.proof_type,
            parallel = parallel.get(),
            sectors = sectors.numbers.len(),
            "redoing sectors"
        );

        let report = Redo::new(
            Arc::new(prover),
            Arc::new(chain),
            template,
            store,
            parallel,
        )
        .with_destination(destination)
        .with_cancellation(cancel_on_ctrl_c())
        .run(sectors)
        .await;
        info!(summary = %report.summary(), "redo finished");
        Ok(())
    }
}

/// The working directory: the flag or config value, else `$HOME/redo`.
fn seal_dir(dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(expand_home(&dir));
    }
    let home = directories::BaseDirs::new()
        .context("no seal directory is set and the home directory is unknown")?;
    let dir = home.home_dir().join("redo");
    info!(path = %dir.display(), "no seal directory is set, using the default");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use std::path::Path;

    #[test]
    fn flags() {
        let cmd = RedoCommand::try_parse_from([
            "forest-redo",
            "--sids",
            "5,7",
            "--seal-dir",
            "/srv/seal",
            "--parallel",
            "2",
            "--actor",
            "t01000",
        ])
        .unwrap();
        assert_eq!(cmd.sids, "5,7");
        assert_eq!(cmd.seal_dir, Some(PathBuf::from("/srv/seal")));
        assert_eq!(cmd.storage_dir, None);
        assert_eq!(cmd.parallel, Some(2));
        assert_eq!(cmd.actor, Some(Address::new_id(1000)));
    }

    #[test]
    fn invalid_actor_is_rejected() {
        assert!(
            RedoCommand::try_parse_from(["forest-redo", "--sids", "1", "--actor", "nope"]).is_err()
        );
    }

    #[tokio::test]
    async fn zero_parallelism_is_fatal() {
        let cmd =
            RedoCommand::try_parse_from(["forest-redo", "--sids", "1", "--parallel", "0"]).unwrap();
        let err = cmd.run().await.unwrap_err();
        assert_eq!(err.to_string(), "parallel must be greater than 0");
    }

    #[test]
    fn explicit_seal_dir_wins() {
        assert_eq!(
            seal_dir(Some("/srv/seal".into())).unwrap(),
            Path::new("/srv/seal")
        );
    }
}
