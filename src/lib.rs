// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Recovery tools for Filecoin storage providers: redo the sealing of
//! committed sectors whose artifacts were lost, and emulate window PoSt over
//! the result.

pub mod chain;
pub mod cli;
pub mod cli_shared;
pub mod lotus_json;
pub mod prover;
pub mod redo;
pub mod rpc_client;
pub mod shim;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod utils;
pub mod wdpost;

use std::ffi::OsString;

/// Entry point of `forest-redo`.
pub fn forest_redo_main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    ArgT: Into<OsString> + Clone,
{
    cli::main::<cli::redo_cmd::RedoCommand, _>(args)
}

/// Entry point of `forest-wdpost`.
pub fn forest_wdpost_main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    ArgT: Into<OsString> + Clone,
{
    cli::main::<cli::wdpost_cmd::WdpostCommand, _>(args)
}
