// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod redo_cmd;
pub mod wdpost_cmd;

use std::ffi::OsString;
use std::future::Future;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli_shared::cli::CliOpts;
use crate::cli_shared::logger::setup_logger;

/// A binary's command line: the shared options plus what it runs.
pub trait Command: Parser {
    fn opts(&self) -> &CliOpts;

    fn run(self) -> impl Future<Output = anyhow::Result<()>>;
}

/// Parses `args`, sets up logging and runs the command to completion on a
/// multi-threaded runtime.
pub fn main<C, ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    C: Command,
    ArgT: Into<OsString> + Clone,
{
    // Capture Cli inputs
    let cmd = C::parse_from(args);
    let _guards = setup_logger(cmd.opts());

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(cmd.run())
}

/// A token cancelled on the first Ctrl-C. Prover calls already running still
/// finish.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping after the prover calls in progress");
                cancel.cancel();
            }
        }
    });
    cancel
}
