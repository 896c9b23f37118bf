use crate::cli::BenchCli;
use clap::Parser;

/// Initialise logging and parse the command line for a benchmark scenario.
pub fn init() -> BenchCli {
    env_logger::init();

    BenchCli::parse()
}
