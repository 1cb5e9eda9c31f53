use clap::Parser;
use eyre::Result;

use storyrover::cli::CliOpts;

fn main() -> Result<()> {
    let opts = CliOpts::parse();

    storyrover::init()?;
    storyrover::banner();

    storyrover::cli(opts)
}
