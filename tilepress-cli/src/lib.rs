//! Command-line interface for converting OSM extracts into MBTiles.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod convert;
mod error;

pub use error::CliError;

use convert::{ConvertArgs, run_convert};

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_COMPRESSION: &str = "compression";
const ENV_INPUT: &str = "TILEPRESS_CMDS_CONVERT_INPUT";

/// Run the tilepress CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Convert(args) => run_convert(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tilepress",
    about = "Convert OpenStreetMap extracts into MBTiles vector tile sets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an `.osm.pbf` extract into an `.mbtiles` file.
    Convert(ConvertArgs),
}

#[cfg(test)]
mod tests;
