//! Pull parser for the streamed tar transport.
//!
//! The Engine API's archive endpoint frames even a single file as a tar
//! archive: 512-byte headers, each followed by a zero-padded payload,
//! terminated by two all-zero blocks. [`ArchiveReader`] decodes entries
//! lazily from the byte stream; the sequence is finite and not
//! restartable. [`extract_file`] pulls the first entry matching a file
//! name and ignores the rest, since some daemons wrap single files in
//! multi-entry archives.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::backend::{ArchiveStream, BackendError};

/// Tar block size; headers and payload padding are multiples of this.
pub const BLOCK_SIZE: usize = 512;

/// Header offsets per the ustar layout.
const NAME_RANGE: std::ops::Range<usize> = 0..100;
const SIZE_RANGE: std::ops::Range<usize> = 124..136;
const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;
const TYPE_FLAG_OFFSET: usize = 156;

/// Type flag for a regular file (`'0'` or the pre-POSIX NUL).
fn is_regular_file(type_flag: u8) -> bool {
    type_flag == b'0' || type_flag == 0
}

/// Errors raised while decoding the archive transport.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The underlying byte stream failed mid-transfer.
    #[error("archive transport failed: {0}")]
    Transport(#[source] BackendError),

    /// The stream ended before a complete header or payload was read.
    #[error("archive truncated: {0}")]
    Truncated(String),

    /// A header block failed structural validation.
    #[error("malformed archive header: {0}")]
    Malformed(String),
}

/// A single decoded archive entry.
#[derive(Debug)]
pub struct Entry {
    /// Entry name as recorded in the header (may carry a directory part).
    pub name: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Raw tar type flag.
    pub type_flag: u8,
    /// Unpadded payload.
    pub data: Vec<u8>,
}

impl Entry {
    /// Final path component of the entry name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Lazy entry reader over a streamed archive.
pub struct ArchiveReader {
    stream: ArchiveStream,
    buf: BytesMut,
    done: bool,
}

impl ArchiveReader {
    pub fn new(stream: ArchiveStream) -> Self {
        Self {
            stream,
            buf: BytesMut::new(),
            done: false,
        }
    }

    /// Pull the next entry, or `None` once the archive ends.
    ///
    /// The end of the archive is either the conventional zero-block
    /// trailer or a clean end of stream on a block boundary; both are
    /// accepted. Ending anywhere else is a truncation error.
    pub async fn next_entry(&mut self) -> Result<Option<Entry>, ArchiveError> {
        if self.done {
            return Ok(None);
        }

        let header = match self.read_exact(BLOCK_SIZE).await? {
            Some(block) => block,
            None => {
                self.done = true;
                return Ok(None);
            }
        };

        if header.iter().all(|b| *b == 0) {
            // Zero-block trailer; anything after it is padding.
            self.done = true;
            return Ok(None);
        }

        let (name, size, type_flag) = parse_header(&header)?;

        let padded = padded_size(size);
        let mut data = match self.read_exact(padded).await? {
            Some(bytes) => bytes.to_vec(),
            None => {
                return Err(ArchiveError::Truncated(format!(
                    "stream ended before the payload of entry `{name}` ({size} bytes)",
                )))
            }
        };
        data.truncate(size as usize);

        Ok(Some(Entry {
            name,
            size,
            type_flag,
            data,
        }))
    }

    /// Buffer until `n` bytes are available, then split them off.
    ///
    /// Returns `None` only on a clean end of stream with nothing buffered;
    /// a partial read is a truncation error.
    async fn read_exact(&mut self, n: usize) -> Result<Option<Bytes>, ArchiveError> {
        while self.buf.len() < n {
            match self.stream.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(err)) => return Err(ArchiveError::Transport(err)),
                None if self.buf.is_empty() => return Ok(None),
                None => {
                    return Err(ArchiveError::Truncated(format!(
                        "expected {n} bytes, stream ended with {} buffered",
                        self.buf.len(),
                    )))
                }
            }
        }
        Ok(Some(self.buf.split_to(n).freeze()))
    }
}

/// Extract the payload of the first regular-file entry named `file_name`.
///
/// Later entries are ignored. Returns `Ok(None)` when the archive holds
/// entries but none match; an archive with no entries at all is an error,
/// since the transport always frames at least one.
pub async fn extract_file(
    stream: ArchiveStream,
    file_name: &str,
) -> Result<Option<Vec<u8>>, ArchiveError> {
    let mut reader = ArchiveReader::new(stream);
    let mut entries_seen = 0usize;

    while let Some(entry) = reader.next_entry().await? {
        entries_seen += 1;
        if is_regular_file(entry.type_flag) && entry.file_name() == file_name {
            return Ok(Some(entry.data));
        }
        tracing::debug!(name = %entry.name, "Skipping archive entry");
    }

    if entries_seen == 0 {
        return Err(ArchiveError::Malformed(
            "archive stream contained no entries".into(),
        ));
    }
    Ok(None)
}

/// Payload size rounded up to the next block boundary.
fn padded_size(size: u64) -> usize {
    let size = size as usize;
    size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

fn parse_header(block: &[u8]) -> Result<(String, u64, u8), ArchiveError> {
    verify_checksum(block)?;

    let name = field_str(&block[NAME_RANGE]);
    if name.is_empty() {
        return Err(ArchiveError::Malformed("empty entry name".into()));
    }
    let size = parse_octal(&block[SIZE_RANGE])?;
    let type_flag = block[TYPE_FLAG_OFFSET];

    Ok((name, size, type_flag))
}

/// NUL-terminated header text field.
fn field_str(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Octal numeric field, NUL/space padded on either side.
fn parse_octal(field: &[u8]) -> Result<u64, ArchiveError> {
    let text = field_str(field);
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(trimmed, 8)
        .map_err(|_| ArchiveError::Malformed(format!("invalid octal field `{trimmed}`")))
}

/// Header checksum: byte sum of the block with the checksum field itself
/// read as spaces.
fn verify_checksum(block: &[u8]) -> Result<(), ArchiveError> {
    let recorded = parse_octal(&block[CHECKSUM_RANGE])?;
    let computed: u64 = block
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if CHECKSUM_RANGE.contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(*b)
            }
        })
        .sum();

    if computed != recorded {
        return Err(ArchiveError::Malformed(format!(
            "checksum mismatch (recorded {recorded}, computed {computed})",
        )));
    }
    Ok(())
}
