//! Command-line flags.
//!
//! `-h` is the bind host, so help is only available as `--help`.

use std::path::PathBuf;

use catcache_core::ConfigOverrides;
use clap::{ArgAction, Parser};

/// Read-through image cache.
#[derive(Debug, Parser)]
#[command(name = "catcache", version, disable_help_flag = true)]
pub struct Cli {
    /// Address to bind to
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Cache directory
    #[arg(short, long = "cache", value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Cli {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides { host: self.host, port: self.port, cache_dir: self.cache, config_file: self.config }
    }
}
