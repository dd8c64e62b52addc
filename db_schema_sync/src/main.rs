//! CLI entry point for db_schema_sync.
//! Takes the config file path, runs one sync and prints the summary.
//! Every fatal error is one line on stderr and exit code 1.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use db_schema_sync::artifacts::today_run_id;
use db_schema_sync::report::print_summary;
use db_schema_sync::utils::init_logging;
use db_schema_sync::{config, SchemaSyncClient};

#[derive(Parser)]
#[command(
    name = "db_schema_sync",
    about = "Write the DDL that brings an old MySQL schema in line with a new one",
    version
)]
struct Cli {
    /// YAML file with the new_db and old_db connection profiles
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Root directory for the dated output directories (overrides config)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let Some(config_path) = cli.config.as_deref() else {
        eprintln!("Usage: db_schema_sync <config file path>");
        process::exit(1);
    };

    if let Err(e) = run(&cli, config_path).await {
        eprintln!("{}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli, config_path: &Path) -> anyhow::Result<()> {
    let mut config = config::load_from_file(config_path)?;
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }

    init_logging(config.logging.as_ref(), cli.verbose)?;

    let client = SchemaSyncClient::connect(config).await?;
    let run_id = today_run_id();
    let result = client.sync_database(&run_id).await;
    client.close().await;

    print_summary(&result?);
    Ok(())
}
