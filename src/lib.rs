pub mod app;
pub mod articles;
pub mod cli;
pub mod db;
pub mod error;
pub mod goals;
pub mod profile;
pub mod settings;
pub mod stats;
pub mod sync;
pub mod utils;

use anyhow::Context;
use clap::Parser;

pub use app::{App, MigrationReport, PullReport, StartupReport};
pub use error::{
    GoalError, MigrationFailure, ProfileIntegrityFailure, RemoteSyncFailure, StorageFailure,
};
pub use goals::GoalsController;

use cli::Cli;
use settings::EnvOverrides;
use utils::init_logging;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug || EnvOverrides::from_env().debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let output = runtime.block_on(cli::execute(cli))?;
    println!("{output}");
    Ok(())
}
