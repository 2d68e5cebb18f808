// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod config;

pub use config::*;

use std::path::PathBuf;

use is_terminal::IsTerminal as _;

/// Options shared by every binary.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct CliOpts {
    /// A TOML file containing relevant configurations
    #[arg(short, long, env = CONFIG_ENV_KEY)]
    pub config: Option<PathBuf>,
    /// Also write logs to hourly rotated files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// Enable or disable colored logging in `stdout`
    #[arg(long, default_value = "auto")]
    pub color: LoggingColor,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LoggingColor {
    Always,
    #[default]
    Auto,
    Never,
}

impl LoggingColor {
    pub fn coloring_enabled(&self) -> bool {
        match self {
            LoggingColor::Auto => std::io::stdout().is_terminal(),
            LoggingColor::Always => true,
            LoggingColor::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Opts {
        #[command(flatten)]
        opts: CliOpts,
    }

    #[test]
    fn shared_flags() {
        let Opts { opts } =
            Opts::try_parse_from(["test", "--color", "never", "--log-dir", "/var/log/redo"])
                .unwrap();
        assert_eq!(opts.color, LoggingColor::Never);
        assert!(!opts.color.coloring_enabled());
        assert_eq!(opts.log_dir, Some(PathBuf::from("/var/log/redo")));
    }

    #[test]
    fn unknown_color_is_rejected() {
        assert!(Opts::try_parse_from(["test", "--color", "sometimes"]).is_err());
    }
}
