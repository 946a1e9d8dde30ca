//! Test helpers for writing extracts into scratch directories.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tilepress_data::test_support::sample_extract;

/// Scratch directory holding one sample extract.
#[derive(Debug)]
pub(super) struct ExtractFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
    extract: Utf8PathBuf,
}

impl ExtractFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let extract = root.join("sample.osm.pbf");
        let bytes = sample_extract().expect("build sample extract");
        std::fs::write(extract.as_std_path(), bytes).expect("write sample extract");
        Self {
            _dir: dir,
            root,
            extract,
        }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn extract(&self) -> &Utf8Path {
        &self.extract
    }
}
