//! Newline-aligned chunker for splitting text files into bounded chunks.
//!
//! A line is a maximal run of bytes ending in `\n`, or the trailing run of a
//! file that does not end in one. Chunks are concatenations of whole lines;
//! a line is never split, so a single line longer than the target occupies
//! its own oversized chunk.

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::CasError;

/// A single chunk of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position of this chunk within the file.
    pub sequence: u64,
    /// Byte offset within the original file.
    pub offset: u64,
    /// The raw chunk data, a run of whole lines.
    pub data: Bytes,
}

impl Chunk {
    /// Size of the chunk content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Chunker that packs consecutive lines into chunks of at most `target` bytes.
///
/// A chunk accumulates lines until the next line would push it past the
/// target; it is then closed and the next chunk starts with that line.
/// Empty data produces zero chunks.
#[derive(Debug, Clone, Copy)]
pub struct LineChunker {
    target: u64,
}

impl LineChunker {
    /// Create a new chunker with the given target chunk size in bytes.
    pub fn new(target: u64) -> Self {
        Self { target }
    }

    /// Target chunk size in bytes.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Split in-memory data into newline-aligned chunks.
    pub fn chunk(&self, data: &[u8]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;

        for line in data.split_inclusive(|&b| b == b'\n') {
            if end > start && (end - start + line.len()) as u64 > self.target {
                chunks.push(Chunk {
                    sequence: chunks.len() as u64,
                    offset: start as u64,
                    data: Bytes::copy_from_slice(&data[start..end]),
                });
                start = end;
            }
            end += line.len();
        }

        if end > start {
            chunks.push(Chunk {
                sequence: chunks.len() as u64,
                offset: start as u64,
                data: Bytes::copy_from_slice(&data[start..end]),
            });
        }

        chunks
    }

    /// Wrap a buffered reader in a [`ChunkReader`] that yields chunks lazily.
    pub fn reader<R: AsyncBufRead + Unpin>(&self, reader: R) -> ChunkReader<R> {
        ChunkReader::new(reader, self.target)
    }

    /// Split data from an async reader into newline-aligned chunks.
    ///
    /// Reads the entire stream. Boundaries are identical to [`Self::chunk`].
    pub async fn chunk_stream(
        &self,
        reader: impl AsyncBufRead + Unpin,
    ) -> Result<Vec<Chunk>, CasError> {
        let mut reader = self.reader(reader);
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}

/// Incremental chunk producer over an async buffered reader.
///
/// Holds at most one chunk plus one carried-over line in memory, so
/// arbitrarily large files can be chunked with bounded memory.
pub struct ChunkReader<R> {
    reader: R,
    target: u64,
    sequence: u64,
    offset: u64,
    /// Line read past the end of the previous chunk; it opens the next one.
    carry: Vec<u8>,
    line: Vec<u8>,
    eof: bool,
}

impl<R: AsyncBufRead + Unpin> ChunkReader<R> {
    /// Create a chunk reader with the given target chunk size in bytes.
    pub fn new(reader: R, target: u64) -> Self {
        Self {
            reader,
            target,
            sequence: 0,
            offset: 0,
            carry: Vec::new(),
            line: Vec::new(),
            eof: false,
        }
    }

    /// Read the next chunk, or `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, CasError> {
        let mut buf = std::mem::take(&mut self.carry);

        while !self.eof {
            self.line.clear();
            let n = self.reader.read_until(b'\n', &mut self.line).await?;
            if n == 0 {
                self.eof = true;
                break;
            }
            if !buf.is_empty() && (buf.len() + n) as u64 > self.target {
                self.carry = std::mem::take(&mut self.line);
                break;
            }
            buf.extend_from_slice(&self.line);
        }

        if buf.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk {
            sequence: self.sequence,
            offset: self.offset,
            data: Bytes::from(buf),
        };
        self.sequence += 1;
        self.offset += chunk.size();
        Ok(Some(chunk))
    }
}
