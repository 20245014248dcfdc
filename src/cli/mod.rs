//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::telemetry::{init_logging, DEFAULT_LOG_LEVEL};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cachesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "run", about = "Run one full synchronization cycle")]
    Run(RunArgs),

    #[command(name = "status", about = "Show the published cycle markers")]
    Status(ConfigArgs),

    #[command(name = "ping", about = "Check source and store connectivity")]
    Ping(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, help = "Path to the TOML configuration")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Config> {
        Config::from_file(&self.config)
            .with_context(|| format!("Failed to load configuration from {}", self.config.display()))
    }
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(short, long, help = "Print metrics after the cycle")]
    pub metrics: bool,
}

mod ping;
mod run;
mod status;

pub async fn run() -> Result<()> {
    init_logging(DEFAULT_LOG_LEVEL);
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Status(args) => status::execute(args).await,
        Commands::Ping(args) => ping::execute(args).await,
    }
}
