//! Line splitting for uploaded documents.
//!
//! Multipart uploads arrive as arbitrary byte chunks. [`ChunkedLines`] turns
//! any chunk stream into a [`LineSource`] without buffering more than the
//! current partial line.

use std::io;

use async_trait::async_trait;
use axum::extract::multipart::Field;
use tokenscope::{LineSource, decode_line};

/// A stream of raw byte chunks.
#[async_trait]
pub trait ChunkStream: Send {
    type Chunk: AsRef<[u8]> + Send;

    async fn next_chunk(&mut self) -> io::Result<Option<Self::Chunk>>;
}

#[async_trait]
impl<'a> ChunkStream for Field<'a> {
    type Chunk = axum::body::Bytes;

    async fn next_chunk(&mut self) -> io::Result<Option<Self::Chunk>> {
        self.chunk()
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.body_text()))
    }
}

/// [`LineSource`] over a [`ChunkStream`], splitting on `\n` and dropping a
/// trailing `\r`. Invalid UTF-8 is replaced rather than rejected.
pub struct ChunkedLines<C> {
    chunks: C,
    buffer: Vec<u8>,
    finished: bool,
}

impl<C: ChunkStream> ChunkedLines<C> {
    pub fn new(chunks: C) -> Self {
        Self {
            chunks,
            buffer: Vec::new(),
            finished: false,
        }
    }
}

#[async_trait]
impl<C: ChunkStream> LineSource for ChunkedLines<C> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                return Ok(Some(decode_line(&line)));
            }

            if self.finished {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buffer);
                return Ok(Some(decode_line(&line)));
            }

            match self.chunks.next_chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(chunk.as_ref()),
                None => self.finished = true,
            }
        }
    }
}
