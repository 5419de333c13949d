use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use procreg::{
    BackendOptions, CompletionPolicy, ProcessRegistryManager, ProcregOptions, SqliteRegistry,
};

use crate::commands;

/// Inspect and drive the registry of running executions
#[derive(Parser, Debug)]
#[command(name = "procreg", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a starting execution
    Summary(commands::summary::SummaryArgs),

    /// Report the status of one unit
    Report(commands::report::ReportArgs),

    /// Remove a finished execution
    Complete(commands::complete::CompleteArgs),

    /// Show running executions
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Apply a YAML file of lifecycle signals in order
    Replay(commands::replay::ReplayArgs),
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Registry database file
    #[arg(long, global = true, env = procreg::constants::envs::PROCREG_DB)]
    pub db: Option<PathBuf>,

    /// YAML options file
    #[arg(long, global = true, env = procreg::constants::envs::PROCREG_CONFIG)]
    pub config: Option<PathBuf>,

    /// Completion policy, overrides the options file
    #[arg(long, global = true)]
    pub policy: Option<CompletionPolicy>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Write logs to daily files in this directory instead of stderr
    #[arg(long, global = true, env = procreg::constants::envs::PROCREG_LOG_DIR)]
    pub log_dir: Option<PathBuf>,
}

impl GlobalFlags {
    /// Options from the config file, with command-line overrides applied.
    ///
    /// The CLI always works on a sqlite registry: `--db` wins, then a sqlite
    /// backend from the options file, then the default data directory.
    pub fn options(&self) -> anyhow::Result<ProcregOptions> {
        let mut options = match &self.config {
            Some(path) => ProcregOptions::from_yaml_file(path)?,
            None => ProcregOptions::default(),
        };

        let db = match (&self.db, &options.backend) {
            (Some(db), _) => db.clone(),
            (None, BackendOptions::Sqlite { path }) => path.clone(),
            (None, BackendOptions::Memory) => default_db_path(),
        };
        options.backend = BackendOptions::Sqlite { path: db };

        if let Some(policy) = self.policy {
            options.completion_policy = policy;
        }
        Ok(options)
    }

    pub fn create_manager(&self) -> anyhow::Result<ProcessRegistryManager> {
        let options = self.options()?;
        let BackendOptions::Sqlite { path } = &options.backend else {
            anyhow::bail!("the CLI requires a sqlite registry");
        };
        tracing::debug!(db = %path.display(), "Opening registry");
        let registry = SqliteRegistry::open(path)?;
        Ok(ProcessRegistryManager::with_options(
            Arc::new(registry),
            &options,
        )?)
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("procreg").join("registry.db"))
        .unwrap_or_else(|| PathBuf::from("procreg.db"))
}
