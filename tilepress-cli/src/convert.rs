//! Convert command implementation for the tilepress CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tilepress_core::TileCompression;
use tilepress_data::{ConvertOptions, ConvertReport};

use crate::{ARG_COMPRESSION, ARG_INPUT, ARG_OUTPUT, CliError, ENV_INPUT};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Decode an OpenStreetMap PBF extract, bin its nodes and ways \
                 into zoom levels 0 to 14 and write the resulting vector \
                 tiles into an MBTiles file. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Convert an OSM PBF extract into MBTiles"
)]
#[ortho_config(prefix = "TILEPRESS")]
pub(crate) struct ConvertArgs {
    /// Path to the `.osm.pbf` extract.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Output file; defaults to the input with `.osm.pbf` replaced by `.mbtiles`.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Tile compression: `gzip` (default) or `none`.
    #[arg(long = ARG_COMPRESSION, value_name = "codec")]
    #[serde(default)]
    pub(crate) compression: Option<TileCompression>,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    /// Extract to convert.
    pub(crate) input: Utf8PathBuf,
    /// Explicit output path, if any.
    pub(crate) output: Option<Utf8PathBuf>,
    /// Compression applied to every tile.
    pub(crate) compression: TileCompression,
}

impl ConvertConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.input, ARG_INPUT)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match tilepress_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub(crate) fn options(&self) -> ConvertOptions {
        ConvertOptions {
            output: self.output.clone(),
            compression: self.compression,
        }
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        Ok(Self {
            input,
            output: args.output,
            compression: args.compression.unwrap_or_default(),
        })
    }
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_convert_with(args, &mut stdout)
}

pub(crate) fn run_convert_with(args: ConvertArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let report = execute_convert(args)?;
    write_summary(writer, &report)
}

pub(crate) fn execute_convert(args: ConvertArgs) -> Result<ConvertReport, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    info!(
        "Converting {} with {} tile compression",
        config.input, config.compression
    );
    Ok(tilepress_data::convert(&config.input, &config.options())?)
}

fn write_summary(writer: &mut dyn Write, report: &ConvertReport) -> Result<(), CliError> {
    writeln!(
        writer,
        "{}: {} tiles from {} nodes, {} ways and {} relations",
        report.output, report.tiles_written, report.nodes, report.ways, report.relations
    )
    .map_err(CliError::WriteSummary)
}
