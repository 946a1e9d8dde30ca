//! Extension-based detection of input and output file formats.

use std::fmt;

use camino::Utf8Path;

const OSM_PBF_SUFFIX: &str = ".osm.pbf";
const MBTILES_SUFFIX: &str = ".mbtiles";

/// File format inferred from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// OpenStreetMap protocol-buffer extract (`.osm.pbf`).
    OsmPbf,
    /// MBTiles container (`.mbtiles`).
    Mbtiles,
    /// Anything else.
    Unknown,
}

impl SourceFormat {
    /// Detect the format of `path`, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use tilepress_data::SourceFormat;
    ///
    /// assert_eq!(SourceFormat::detect(Utf8Path::new("berlin.OSM.PBF")), SourceFormat::OsmPbf);
    /// assert_eq!(SourceFormat::detect(Utf8Path::new("berlin.pbf")), SourceFormat::Unknown);
    /// ```
    #[must_use]
    pub fn detect(path: &Utf8Path) -> Self {
        let Some(name) = path.file_name() else {
            return Self::Unknown;
        };
        let lowered = name.to_ascii_lowercase();
        if lowered.ends_with(OSM_PBF_SUFFIX) {
            Self::OsmPbf
        } else if lowered.ends_with(MBTILES_SUFFIX) {
            Self::Mbtiles
        } else {
            Self::Unknown
        }
    }

    /// Canonical file suffix, if the format has one.
    #[must_use]
    pub const fn suffix(self) -> Option<&'static str> {
        match self {
            Self::OsmPbf => Some(OSM_PBF_SUFFIX),
            Self::Mbtiles => Some(MBTILES_SUFFIX),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OsmPbf => "OSM PBF",
            Self::Mbtiles => "MBTiles",
            Self::Unknown => "unknown",
        })
    }
}
