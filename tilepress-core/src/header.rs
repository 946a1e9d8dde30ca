use geo::Rect;

/// Dataset name used when the input header names none.
pub const DEFAULT_DATASET_NAME: &str = "OSM Data";

/// File-level metadata taken from the input's header block.
///
/// A later header block replaces an earlier one wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetHeader {
    /// First required feature of the input, used as the dataset name.
    pub name: Option<String>,
    /// Program that wrote the input.
    pub writing_program: Option<String>,
    /// Free-form source attribution.
    pub source: Option<String>,
    /// Declared bounding box, `x = longitude`, `y = latitude`.
    pub bbox: Option<Rect<f64>>,
}

impl DatasetHeader {
    /// Name to publish for the dataset.
    ///
    /// # Examples
    /// ```
    /// use tilepress_core::DatasetHeader;
    ///
    /// assert_eq!(DatasetHeader::default().display_name(), "OSM Data");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATASET_NAME)
    }
}
