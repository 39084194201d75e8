//! ml-autopipeline - command line entry point

use clap::Parser;
use ml_autopipeline::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(&cli)
}
