// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::rpc_client::{
    ApiInfo, DEFAULT_FULLNODE_API, DEFAULT_MINER_API, FULLNODE_API_INFO_KEY, MINER_API_INFO_KEY,
};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_KEY: &str = "FOREST_SECTOR_TOOLS_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub redo: RedoConfig,
}

/// Lotus endpoints. Unset entries come from `FULLNODE_API_INFO` and
/// `MINER_API_INFO`, then from the local defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub full_node: Option<ApiInfo>,
    pub miner: Option<ApiInfo>,
}

impl ApiConfig {
    pub fn full_node(&self) -> anyhow::Result<ApiInfo> {
        match &self.full_node {
            Some(it) => Ok(it.clone()),
            None => ApiInfo::from_env(FULLNODE_API_INFO_KEY, DEFAULT_FULLNODE_API),
        }
    }

    pub fn miner(&self) -> anyhow::Result<ApiInfo> {
        match &self.miner {
            Some(it) => Ok(it.clone()),
            None => ApiInfo::from_env(MINER_API_INFO_KEY, DEFAULT_MINER_API),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RedoConfig {
    /// Working directory sectors are sealed in.
    pub seal_dir: Option<PathBuf>,
    /// Final storage of successfully redone sectors.
    pub storage_dir: Option<PathBuf>,
    /// Sectors allowed in piece addition and phase 1 at once.
    #[default(1)]
    pub parallel: usize,
}

impl Config {
    /// Reads the configuration file at `path`, or the defaults without one.
    pub fn read(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let toml = std::fs::read_to_string(path)
                    .with_context(|| format!("couldn't read config file {}", path.display()))?;
                toml::from_str(&toml)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}
