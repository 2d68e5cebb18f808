// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::ensure;
use fvm_ipld_bitfield::BitField;
use tracing::info;

use super::{Command, cancel_on_ctrl_c};
use crate::chain::{LotusChainReader, resolve_actor_address};
use crate::cli_shared::cli::{CliOpts, Config};
use crate::prover::default_prover;
use crate::shim::address::{Address, parse_address};
use crate::store::SectorStore;
use crate::utils::{expand_home, parse_sector_numbers};
use crate::wdpost::{Emulator, Scope, SubstitutionPolicy, validate_deadline};

/// Window PoSt emulator
#[derive(Debug, clap::Parser)]
#[command(name = "forest-wdpost", author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"))]
pub struct WdpostCommand {
    #[command(flatten)]
    pub opts: CliOpts,
    #[command(subcommand)]
    pub cmd: WdpostSubcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum WdpostSubcommand {
    /// Sector window PoSt emulator
    #[command(name = "s-emulator")]
    Sector {
        /// Sector ids to prove, separated by commas, e.g. `1,2`
        #[arg(long)]
        sids: String,
        #[command(flatten)]
        target: Target,
    },
    /// Partition window PoSt emulator
    #[command(name = "p-emulator")]
    Partition {
        /// Deadline index
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        deadline: i64,
        /// Partition index within the deadline
        #[arg(long, default_value_t = 0)]
        partition: u64,
        #[command(flatten)]
        target: Target,
    },
    /// Deadline window PoSt emulator, one round per partition
    #[command(name = "d-emulator")]
    Deadline {
        /// Deadline index
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        deadline: i64,
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, clap::Args)]
pub struct Target {
    /// Directory the redone sectors are stored in
    #[arg(long)]
    pub sdir: PathBuf,
    /// Miner actor address. Defaults to the actor of the miner API
    #[arg(long, value_parser = parse_address)]
    pub actor: Option<Address>,
    /// Fail on sectors unknown to the chain instead of proving a substitute
    #[arg(long)]
    pub strict_sectors: bool,
}

impl WdpostSubcommand {
    fn scope(self) -> anyhow::Result<(Scope, Target)> {
        Ok(match self {
            Self::Sector { sids, target } => {
                let mut sectors = BitField::new();
                for number in parse_sector_numbers(&sids).numbers {
                    sectors.set(number);
                }
                ensure!(!sectors.is_empty(), "--sids holds no valid sector id");
                (Scope::Sectors(sectors), target)
            }
            Self::Partition {
                deadline,
                partition,
                target,
            } => (
                Scope::Partition {
                    deadline: validate_deadline(deadline)?,
                    partition,
                },
                target,
            ),
            Self::Deadline { deadline, target } => {
                (Scope::Deadline(validate_deadline(deadline)?), target)
            }
        })
    }
}

impl Command for WdpostCommand {
    fn opts(&self) -> &CliOpts {
        &self.opts
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = Config::read(self.opts.config.as_deref())?;
        let (scope, target) = self.cmd.scope()?;
        let prover = default_prover(SectorStore::new(expand_home(&target.sdir)))?;

        // the miner API only names the actor
        let miner_api = match target.actor {
            Some(_) => None,
            None => Some(config.api.miner()?),
        };
        let chain =
            LotusChainReader::connect(&config.api.full_node()?, miner_api.as_ref()).await?;
        let miner = resolve_actor_address(target.actor, &chain).await?;
        let policy = match target.strict_sectors {
            true => SubstitutionPolicy::Reject,
            false => SubstitutionPolicy::SubstituteFirst,
        };

        let report = Emulator::new(Arc::new(prover), Arc::new(chain), miner)?
            .with_policy(policy)
            .with_cancellation(cancel_on_ctrl_c())
            .run(&scope)
            .await?;
        match scope {
            Scope::Deadline(deadline) => {
                info!(
                    deadline,
                    partitions = report.partitions.len(),
                    failed = report.failures().count(),
                    "deadline emulation finished"
                );
                Ok(())
            }
            Scope::Sectors(_) | Scope::Partition { .. } => report.ensure_verified(),
        }
    }
}
