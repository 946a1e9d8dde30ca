//! Error types emitted by the tilepress CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tilepress_data::ConvertError;

/// Errors emitted by the tilepress CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (pass <{field}> or set {env})")]
    MissingArgument {
        /// Name of the missing argument.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Argument naming the path.
        field: &'static str,
        /// Missing path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Argument naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Argument naming the path.
        field: &'static str,
        /// Path being inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The conversion itself failed.
    #[error("conversion failed ({} error): {source}", .source.kind())]
    Convert {
        /// Underlying conversion error.
        #[from]
        source: ConvertError,
    },
    /// Writing the conversion summary failed.
    #[error("failed to write conversion summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
