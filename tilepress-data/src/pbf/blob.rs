//! Framing of the PBF byte stream into decompressed block payloads.
//!
//! Each blob on the wire is a 4-byte big-endian header length, a
//! `BlobHeader` message and a `Blob` message whose size the header declares.
//! Sizes are checked against the format limits before any buffer for them is
//! allocated.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use log::debug;
use prost::Message;

use super::error::BlobReadError;
use super::proto::{Blob, BlobData, BlobHeader};

/// Largest accepted serialized `BlobHeader`.
pub const MAX_HEADER_SIZE: usize = 64 * 1024;
/// Largest accepted `Blob`, compressed or inflated.
pub const MAX_BLOB_SIZE: usize = 64 * 1024 * 1024;

const HEADER_BLOB_TYPE: &str = "OSMHeader";
const DATA_BLOB_TYPE: &str = "OSMData";

/// Payload type named by a blob header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// `OSMHeader`: a serialized `HeaderBlock`.
    Header,
    /// `OSMData`: a serialized `PrimitiveBlock`.
    Data,
}

impl BlobKind {
    /// Map a header type string to a kind; unknown types yield `None`.
    #[must_use]
    pub fn from_type(blob_type: &str) -> Option<Self> {
        match blob_type {
            HEADER_BLOB_TYPE => Some(Self::Header),
            DATA_BLOB_TYPE => Some(Self::Data),
            _ => None,
        }
    }

    /// Type string used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => HEADER_BLOB_TYPE,
            Self::Data => DATA_BLOB_TYPE,
        }
    }
}

/// Lazy, forward-only sequence of `(kind, payload)` pairs read from a stream.
///
/// The iterator ends cleanly when the stream ends exactly on a blob
/// boundary. After the first error it yields nothing more. A blob whose type
/// is neither `OSMHeader` nor `OSMData` is an error.
///
/// # Examples
/// ```
/// use tilepress_data::pbf::BlobReader;
///
/// let mut reader = BlobReader::new(std::io::empty());
/// assert!(reader.next().is_none());
/// ```
#[derive(Debug)]
pub struct BlobReader<R> {
    reader: R,
    position: u64,
    finished: bool,
}

impl<R: Read> BlobReader<R> {
    /// Wrap `reader`, which should be positioned at the start of the file.
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            finished: false,
        }
    }

    /// Bytes consumed from the stream so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    fn next_block(&mut self) -> Result<Option<(BlobKind, Vec<u8>)>, BlobReadError> {
        let offset = self.position;
        let Some(header_len) = self.read_length_prefix(offset)? else {
            return Ok(None);
        };
        if header_len > MAX_HEADER_SIZE {
            return Err(BlobReadError::HeaderTooLarge {
                offset,
                size: header_len,
                limit: MAX_HEADER_SIZE,
            });
        }

        let header_bytes = self.read_section(offset, "blob header", header_len)?;
        let header = BlobHeader::decode(header_bytes.as_slice())
            .map_err(|source| BlobReadError::DecodeHeader { offset, source })?;
        let data_len = declared_size(offset, header.datasize)?;
        let kind =
            BlobKind::from_type(&header.r#type).ok_or_else(|| BlobReadError::UnknownBlobType {
                offset,
                blob_type: header.r#type.clone(),
            })?;

        let blob_bytes = self.read_section(offset, "blob", data_len)?;
        let blob = Blob::decode(blob_bytes.as_slice())
            .map_err(|source| BlobReadError::DecodeBlob { offset, source })?;
        let payload = payload(offset, blob)?;
        debug!(
            "{} blob at byte {offset}: {} bytes",
            kind.as_str(),
            payload.len()
        );
        Ok(Some((kind, payload)))
    }

    /// Read the 4-byte length prefix, or `None` on a clean end of stream.
    #[expect(clippy::big_endian_bytes, reason = "PBF length prefixes are big-endian")]
    fn read_length_prefix(&mut self, offset: u64) -> Result<Option<usize>, BlobReadError> {
        let mut prefix = [0_u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            let Some(buffer) = prefix.get_mut(filled..) else {
                break;
            };
            match self.reader.read(buffer) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => return Err(BlobReadError::Read { offset, source }),
            }
        }
        self.advance(filled);

        match filled {
            0 => Ok(None),
            4 => Ok(Some(
                usize::try_from(u32::from_be_bytes(prefix)).unwrap_or(usize::MAX),
            )),
            actual => Err(BlobReadError::Truncated {
                offset,
                section: "length prefix",
                expected: prefix.len(),
                actual,
            }),
        }
    }

    fn read_section(
        &mut self,
        offset: u64,
        section: &'static str,
        len: usize,
    ) -> Result<Vec<u8>, BlobReadError> {
        let mut buffer = Vec::with_capacity(len);
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut buffer)
            .map_err(|source| BlobReadError::Read { offset, source })?;
        self.advance(buffer.len());
        if buffer.len() < len {
            return Err(BlobReadError::Truncated {
                offset,
                section,
                expected: len,
                actual: buffer.len(),
            });
        }
        Ok(buffer)
    }

    fn advance(&mut self, bytes: usize) {
        self.position = self.position.saturating_add(bytes as u64);
    }
}

impl<R: Read> Iterator for BlobReader<R> {
    type Item = Result<(BlobKind, Vec<u8>), BlobReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let outcome = self.next_block().transpose();
        if !matches!(outcome, Some(Ok(_))) {
            self.finished = true;
        }
        outcome
    }
}

impl<R: Read> std::iter::FusedIterator for BlobReader<R> {}

/// Validate a declared size against the blob limit.
fn declared_size(offset: u64, size: i32) -> Result<usize, BlobReadError> {
    let bytes = usize::try_from(size).map_err(|_| BlobReadError::InvalidSize { offset, size })?;
    if bytes > MAX_BLOB_SIZE {
        return Err(BlobReadError::BlobTooLarge {
            offset,
            size: bytes,
            limit: MAX_BLOB_SIZE,
        });
    }
    Ok(bytes)
}

fn payload(offset: u64, blob: Blob) -> Result<Vec<u8>, BlobReadError> {
    match blob.data {
        Some(BlobData::Raw(raw)) => Ok(raw),
        Some(BlobData::ZlibData(compressed)) => {
            let expected = declared_size(offset, blob.raw_size.unwrap_or_default())?;
            inflate(offset, &compressed, expected)
        }
        Some(BlobData::LzmaData(_)) => Err(unsupported(offset, "lzma")),
        Some(BlobData::ObsoleteBzip2Data(_)) => Err(unsupported(offset, "bzip2")),
        Some(BlobData::Lz4Data(_)) => Err(unsupported(offset, "lz4")),
        Some(BlobData::ZstdData(_)) => Err(unsupported(offset, "zstd")),
        None => Err(unsupported(offset, "empty")),
    }
}

const fn unsupported(offset: u64, encoding: &'static str) -> BlobReadError {
    BlobReadError::MissingData { offset, encoding }
}

/// Inflate a zlib stream, reading at most one byte past `expected` so an
/// oversized stream is caught without inflating it fully.
fn inflate(offset: u64, compressed: &[u8], expected: usize) -> Result<Vec<u8>, BlobReadError> {
    let mut inflated = Vec::with_capacity(expected);
    ZlibDecoder::new(compressed)
        .take(expected as u64 + 1)
        .read_to_end(&mut inflated)
        .map_err(|source| BlobReadError::Inflate { offset, source })?;
    if inflated.len() != expected {
        return Err(BlobReadError::SizeMismatch {
            offset,
            expected,
            actual: inflated.len(),
        });
    }
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::{PbfBuilder, frame_blob, zlib};
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Reader that counts bytes handed out, to prove limits are enforced
    /// before payload reads.
    struct CountingReader<R> {
        inner: R,
        consumed: Rc<Cell<usize>>,
    }

    impl<R: Read> Read for CountingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let read = self.inner.read(buf)?;
            self.consumed.set(self.consumed.get() + read);
            Ok(read)
        }
    }

    fn collect(bytes: &[u8]) -> Vec<Result<(BlobKind, Vec<u8>), BlobReadError>> {
        BlobReader::new(bytes).collect()
    }

    #[rstest]
    fn yields_raw_and_zlib_payloads_in_order() {
        let bytes = PbfBuilder::new()
            .raw_blob("OSMHeader", b"header")
            .zlib_blob("OSMData", b"primitive block")
            .build()
            .expect("build extract");

        let blocks: Vec<_> = collect(&bytes)
            .into_iter()
            .map(|item| item.expect("blob decodes"))
            .collect();

        assert_eq!(
            blocks,
            vec![
                (BlobKind::Header, b"header".to_vec()),
                (BlobKind::Data, b"primitive block".to_vec()),
            ]
        );
    }

    #[rstest]
    fn unknown_blob_type_stops_the_stream() {
        let bytes = PbfBuilder::new()
            .raw_blob("OSMHeader", b"header")
            .raw_blob("OSMIndex", b"unsupported")
            .raw_blob("OSMData", b"never reached")
            .build()
            .expect("build extract");

        let items = collect(&bytes);

        assert_eq!(items.len(), 2, "reader is fused after the unknown blob");
        let mut items = items.into_iter();
        let first = items.next().expect("header item").expect("header decodes");
        assert_eq!(first, (BlobKind::Header, b"header".to_vec()));
        let err = items
            .next()
            .expect("second item")
            .expect_err("unknown blob type rejected");
        match &err {
            BlobReadError::UnknownBlobType { blob_type, offset } => {
                assert_eq!(blob_type, "OSMIndex");
                assert!(*offset > 0);
            }
            other => panic!("expected UnknownBlobType, found {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[rstest]
    #[expect(clippy::big_endian_bytes, reason = "frames a length prefix by hand")]
    fn rejects_oversized_blob_before_reading_payload() {
        let header = BlobHeader {
            r#type: "OSMData".to_owned(),
            indexdata: None,
            datasize: 70_000_000,
        }
        .encode_to_vec();
        let mut bytes = u32::try_from(header.len())
            .expect("small header")
            .to_be_bytes()
            .to_vec();
        bytes.extend_from_slice(&header);
        let framing_len = bytes.len();
        bytes.extend(std::iter::repeat_n(0_u8, 4096));

        let consumed = Rc::new(Cell::new(0));
        let reader = CountingReader {
            inner: bytes.as_slice(),
            consumed: Rc::clone(&consumed),
        };
        let mut blobs = BlobReader::new(reader);

        let err = blobs
            .next()
            .expect("one item")
            .expect_err("oversized blob rejected");
        assert!(matches!(err, BlobReadError::BlobTooLarge { size: 70_000_000, .. }));
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(consumed.get(), framing_len);
        assert!(blobs.next().is_none(), "reader is fused after an error");
    }

    #[rstest]
    fn detects_inflated_size_mismatch() {
        let blob = Blob {
            raw_size: Some(3),
            data: Some(BlobData::ZlibData(zlib(b"four").expect("compress"))),
        };
        let bytes = frame_blob("OSMData", &blob);

        let err = collect(&bytes)
            .into_iter()
            .next()
            .expect("one item")
            .expect_err("size mismatch");

        assert!(matches!(
            err,
            BlobReadError::SizeMismatch { expected: 3, actual: 4, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[rstest]
    #[case(None, "empty")]
    #[case(Some(BlobData::LzmaData(vec![1, 2, 3])), "lzma")]
    fn rejects_blobs_without_supported_data(
        #[case] data: Option<BlobData>,
        #[case] expected: &str,
    ) {
        let bytes = frame_blob("OSMData", &Blob { raw_size: None, data });

        let err = collect(&bytes)
            .into_iter()
            .next()
            .expect("one item")
            .expect_err("unsupported data");

        match err {
            BlobReadError::MissingData { encoding, .. } => assert_eq!(encoding, expected),
            other => panic!("expected MissingData, found {other:?}"),
        }
    }

    #[rstest]
    #[case(2, "length prefix")]
    #[case(6, "blob header")]
    fn truncated_streams_are_input_errors(#[case] keep: usize, #[case] section: &str) {
        let bytes = PbfBuilder::new()
            .raw_blob("OSMData", b"payload")
            .build()
            .expect("build extract");

        let err = collect(bytes.get(..keep).expect("prefix"))
            .into_iter()
            .next()
            .expect("one item")
            .expect_err("truncated input");

        match &err {
            BlobReadError::Truncated { section: found, .. } => assert_eq!(found, &section),
            other => panic!("expected Truncated, found {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[rstest]
    #[expect(clippy::big_endian_bytes, reason = "frames a length prefix by hand")]
    fn garbage_header_is_a_decode_error() {
        let mut bytes = 3_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xff, 0xff]);

        let err = collect(&bytes)
            .into_iter()
            .next()
            .expect("one item")
            .expect_err("garbage header");

        assert!(matches!(err, BlobReadError::DecodeHeader { offset: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
