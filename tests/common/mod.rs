// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use tempfile::TempDir;

pub fn redo() -> Command {
    cargo_bin_cmd!("forest-redo")
}

pub fn wdpost() -> Command {
    cargo_bin_cmd!("forest-wdpost")
}

pub trait CommonEnv {
    fn common_env(&mut self, home: &TempDir) -> &mut Self;
}

impl CommonEnv for Command {
    // Keeps the commands away from the caller's config and home directory.
    fn common_env(&mut self, home: &TempDir) -> &mut Self {
        self.env_remove(sector_tools::cli_shared::cli::CONFIG_ENV_KEY)
            .env_remove("FULLNODE_API_INFO")
            .env_remove("MINER_API_INFO")
            .env("HOME", home.path())
    }
}
