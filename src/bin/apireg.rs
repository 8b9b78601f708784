use apireg::cli::{run_cli, Cli};
use apireg::logging::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    let output = run_cli(Cli::parse())?;
    println!("{output}");
    Ok(())
}
