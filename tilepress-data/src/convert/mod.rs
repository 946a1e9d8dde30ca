//! End-to-end conversion of an OSM PBF extract into an MBTiles file.
//!
//! The input is decoded sequentially into a feature cache. Once every block
//! has been read, way geometry is resolved and the frozen features are
//! indexed and encoded with one scoped thread per zoom level. Encoded tiles
//! are funnelled through a bounded channel to the calling thread, the only
//! writer to the output database.

use std::io::{self, BufReader};
use std::sync::mpsc::{self, SyncSender};
use std::thread;

use camino::{Utf8Path, Utf8PathBuf};
use geo::Rect;
use log::info;
use thiserror::Error;
use tilepress_core::{
    EncodeError, MAX_ZOOM, MIN_ZOOM, ResolvedFeatures, TileCompression, TileIndexer,
    VectorTileEncoder,
};

use crate::ErrorKind;
use crate::format::SourceFormat;
use crate::mbtiles::{OutputTile, PersistTilesError, TileStore, TileWriter, build_metadata_rows};
use crate::pbf::{BlobReadError, BlobReader, DecodeError, DecodedDataset, PrimitiveDecoder};

/// Encoded tiles buffered between the encoding threads and the writer.
const TILE_CHANNEL_CAPACITY: usize = 256;

/// Settings for one conversion job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Output file; derived from the input path when `None`.
    pub output: Option<Utf8PathBuf>,
    /// Compression applied to every tile.
    pub compression: TileCompression,
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertReport {
    /// MBTiles file written.
    pub output: Utf8PathBuf,
    /// Nodes decoded.
    pub nodes: u64,
    /// Ways decoded.
    pub ways: u64,
    /// Relations decoded.
    pub relations: u64,
    /// Extent of the decoded node coordinates.
    pub bounds: Option<Rect<f64>>,
    /// Way node references that matched no node.
    pub unresolved_refs: u64,
    /// Tiles upserted into the output.
    pub tiles_written: u64,
}

/// Errors raised by [`convert`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input path does not name an OSM PBF file.
    #[error("{path} is not an OSM PBF extract (detected format: {format})")]
    UnsupportedFormat {
        /// Rejected input.
        path: Utf8PathBuf,
        /// Format detected from the path.
        format: SourceFormat,
    },
    /// The input file could not be opened.
    #[error("failed to open {path}")]
    Open {
        /// Input file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The input stream could not be framed into blobs.
    #[error(transparent)]
    Read(#[from] BlobReadError),
    /// A blob payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The output could not be written.
    #[error(transparent)]
    Persist(#[from] PersistTilesError),
    /// A tile could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ConvertError {
    /// Broad failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } | Self::Open { .. } => ErrorKind::Input,
            Self::Read(err) => err.kind(),
            Self::Decode(err) => err.kind(),
            Self::Persist(err) => err.kind(),
            Self::Encode(_) => ErrorKind::Persistence,
        }
    }
}

/// Output path used when none is configured: the input with its `.osm.pbf`
/// suffix replaced by `.mbtiles`.
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use tilepress_data::default_output_path;
///
/// assert_eq!(
///     default_output_path(Utf8Path::new("data/berlin.osm.pbf")),
///     Utf8Path::new("data/berlin.mbtiles"),
/// );
/// ```
#[must_use]
pub fn default_output_path(input: &Utf8Path) -> Utf8PathBuf {
    tilepress_fs::replace_suffix(input, ".osm.pbf", ".mbtiles")
}

/// Convert the OSM PBF extract at `input` into an MBTiles file.
///
/// Every row is upserted, so rerunning a conversion into the same output is
/// safe. Any error aborts the job; a failure while writing tiles rolls the
/// tile transaction back.
pub fn convert(input: &Utf8Path, options: &ConvertOptions) -> Result<ConvertReport, ConvertError> {
    let format = SourceFormat::detect(input);
    if format != SourceFormat::OsmPbf {
        return Err(ConvertError::UnsupportedFormat {
            path: input.to_path_buf(),
            format,
        });
    }
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
    info!("Converting {input} into {output}");

    let DecodedDataset {
        cache,
        stats,
        header,
        summary,
    } = decode_input(input)?;
    info!(
        "Decoded {} nodes, {} ways and {} relations",
        summary.nodes, summary.ways, summary.relations
    );

    let features = cache.resolve_geometry();
    let rows = build_metadata_rows(&header, summary.bounds, &stats.finalize())?;

    let mut store = TileStore::open(&output)?;
    let mut writer = store.writer()?;
    writer.put_metadata(&rows)?;
    write_pyramid(
        &features,
        &VectorTileEncoder::new(options.compression),
        &mut writer,
    )?;
    let tiles_written = writer.commit()?;
    info!("Wrote {tiles_written} tiles to {output}");

    Ok(ConvertReport {
        output,
        nodes: summary.nodes,
        ways: summary.ways,
        relations: summary.relations,
        bounds: summary.bounds,
        unresolved_refs: features.unresolved_refs(),
        tiles_written,
    })
}

fn decode_input(input: &Utf8Path) -> Result<DecodedDataset, ConvertError> {
    let file = tilepress_fs::open_utf8_file(input).map_err(|source| ConvertError::Open {
        path: input.to_path_buf(),
        source,
    })?;

    let mut decoder = PrimitiveDecoder::new();
    for block in BlobReader::new(BufReader::new(file)) {
        let (kind, payload) = block?;
        decoder.decode(kind, &payload)?;
    }
    Ok(decoder.finish())
}

fn write_pyramid(
    features: &ResolvedFeatures,
    encoder: &VectorTileEncoder,
    writer: &mut TileWriter<'_>,
) -> Result<(), ConvertError> {
    thread::scope(|scope| -> Result<(), ConvertError> {
        let (sender, receiver) = mpsc::sync_channel(TILE_CHANNEL_CAPACITY);
        for zoom in MIN_ZOOM..=MAX_ZOOM {
            let zoom_sender = sender.clone();
            scope.spawn(move || encode_zoom(features, encoder, zoom, &zoom_sender));
        }
        drop(sender);

        // Returning early drops the receiver, which stops the encoders.
        for encoded in receiver {
            writer.put_tile(&encoded?)?;
        }
        Ok(())
    })
}

fn encode_zoom(
    features: &ResolvedFeatures,
    encoder: &VectorTileEncoder,
    zoom: u8,
    sender: &SyncSender<Result<OutputTile, EncodeError>>,
) {
    let cells = TileIndexer::new(features).index_zoom(zoom);

    for cell in &cells {
        let Some(encoded) = encoder.encode(cell).transpose() else {
            continue;
        };
        let failed = encoded.is_err();
        let message = encoded.map(|data| OutputTile {
            coord: cell.coord,
            data,
        });
        if sender.send(message).is_err() || failed {
            return;
        }
    }
}

#[cfg(test)]
mod tests;
