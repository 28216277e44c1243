//! Incremental multipart body encoder.
//!
//! State machine per request:
//! `PendingItem → WritingHeader → TransferringFile → (next item | WritingFooter) → Done`.
//! All header blocks and the footer are precomputed, so the exact content
//! length is known before the first byte is produced and never changes
//! mid-transfer.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::MultipartError;
use crate::sniff::sniff_content_type;

/// How many leading bytes are read for content sniffing.
const SNIFF_LEN: usize = 16;

/// One named file item of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub field_name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub len: u64,
    pub content_type: &'static str,
}

impl Part {
    /// Builds a part from a file on disk.
    ///
    /// Reads the file's leading bytes to sniff the content type and
    /// records the byte length the encoder will later declare.
    pub fn from_path(field_name: &str, path: &Path) -> io::Result<Part> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let mut head = [0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < head.len() {
            let n = file.read(&mut head[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Part {
            field_name: field_name.to_string(),
            file_name,
            path: path.to_path_buf(),
            len,
            content_type: sniff_content_type(&head[..filled]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PendingItem,
    WritingHeader,
    TransferringFile,
    WritingFooter,
    Done,
}

struct Item {
    part: Part,
    /// Boundary line + part headers + blank line, plus the CRLF that
    /// terminates the previous part's bytes (for items after the first).
    header: Vec<u8>,
}

/// Serializes an ordered list of parts into a multipart/form-data body.
///
/// The consumer pulls bytes via [`read_chunk`](Self::read_chunk) and may
/// accept fewer bytes than offered; cursors make partial writes resumable
/// without re-transmitting. At most one file handle is open at a time,
/// and it is opened lazily when its item starts transferring.
pub struct MultipartEncoder {
    boundary: String,
    items: Vec<Item>,
    footer: Vec<u8>,
    content_length: u64,
    state: State,
    index: usize,
    cursor: usize,
    file_sent: u64,
    file: Option<File>,
    closed: bool,
}

impl MultipartEncoder {
    /// Creates an encoder with a fresh random boundary token.
    pub fn new(parts: Vec<Part>) -> MultipartEncoder {
        let boundary = format!("relpush{}", Uuid::new_v4().simple());

        let items: Vec<Item> = parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let mut header = Vec::new();
                if i > 0 {
                    header.extend_from_slice(b"\r\n");
                }
                header.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                header.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.field_name, part.file_name
                    )
                    .as_bytes(),
                );
                header.extend_from_slice(
                    format!("Content-Type: {}\r\n", part.content_type).as_bytes(),
                );
                header.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n\r\n");
                Item { part, header }
            })
            .collect();

        let mut footer = Vec::new();
        if !items.is_empty() {
            footer.extend_from_slice(b"\r\n");
        }
        footer.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let content_length = items
            .iter()
            .map(|item| item.header.len() as u64 + item.part.len)
            .sum::<u64>()
            + footer.len() as u64;

        MultipartEncoder {
            boundary,
            items,
            footer,
            content_length,
            state: State::PendingItem,
            index: 0,
            cursor: 0,
            file_sent: 0,
            file: None,
            closed: false,
        }
    }

    /// Boundary token, for the `Content-Type` request header.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Exact body length: every header block, every file, the footer.
    ///
    /// Computed before transfer begins and immutable thereafter.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// The encoder holds no exhausted single-use stream, so a request
    /// built on it can be replayed after [`reset`](Self::reset).
    pub fn is_replayable(&self) -> bool {
        !self.closed
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Produces the next body bytes into `buf`.
    ///
    /// Returns the number of bytes written; `0` once the body is
    /// complete. Short reads resume exactly where the previous call
    /// stopped.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, MultipartError> {
        if self.closed {
            return Err(MultipartError::Closed);
        }

        let mut written = 0;
        while written < buf.len() {
            match self.state {
                State::PendingItem => {
                    self.cursor = 0;
                    self.state = if self.index < self.items.len() {
                        State::WritingHeader
                    } else {
                        State::WritingFooter
                    };
                }
                State::WritingHeader => {
                    let header = &self.items[self.index].header;
                    written += copy_from(header, &mut self.cursor, &mut buf[written..]);
                    if self.cursor == header.len() {
                        self.file_sent = 0;
                        self.state = State::TransferringFile;
                    } else {
                        break;
                    }
                }
                State::TransferringFile => {
                    let remaining = self.items[self.index].part.len - self.file_sent;
                    if remaining == 0 {
                        self.file = None;
                        self.index += 1;
                        self.state = State::PendingItem;
                        continue;
                    }

                    if self.file.is_none() {
                        let mut f = File::open(&self.items[self.index].part.path)?;
                        if self.file_sent > 0 {
                            f.seek(SeekFrom::Start(self.file_sent))?;
                        }
                        self.file = Some(f);
                    }
                    let Some(file) = self.file.as_mut() else {
                        break;
                    };

                    let cap = remaining.min((buf.len() - written) as u64) as usize;
                    let n = file.read(&mut buf[written..written + cap])?;
                    if n == 0 {
                        // The declared length is already on the wire; a
                        // shrunken file cannot be papered over.
                        return Err(MultipartError::Io(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!(
                                "file truncated during transfer: {}",
                                self.items[self.index].part.path.display()
                            ),
                        )));
                    }
                    self.file_sent += n as u64;
                    written += n;
                }
                State::WritingFooter => {
                    written += copy_from(&self.footer, &mut self.cursor, &mut buf[written..]);
                    if self.cursor == self.footer.len() {
                        self.state = State::Done;
                    }
                    break;
                }
                State::Done => break,
            }
        }

        Ok(written)
    }

    /// Rewinds every cursor and releases the open file handle so the
    /// same body can be produced again for a retry attempt.
    pub fn reset(&mut self) {
        self.file = None;
        self.state = State::PendingItem;
        self.index = 0;
        self.cursor = 0;
        self.file_sent = 0;
    }

    /// Releases file handles regardless of transfer progress. Further
    /// reads fail; `close` is terminal.
    pub fn close(&mut self) {
        self.file = None;
        self.closed = true;
    }
}

/// Copies `src[*cursor..]` into `dst`, advancing the cursor.
fn copy_from(src: &[u8], cursor: &mut usize, dst: &mut [u8]) -> usize {
    let n = (src.len() - *cursor).min(dst.len());
    dst[..n].copy_from_slice(&src[*cursor..*cursor + n]);
    *cursor += n;
    n
}
