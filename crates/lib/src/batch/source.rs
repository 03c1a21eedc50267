//! Line sources feeding the batch pipeline.
//!
//! A [`LineSource`] is read once, front to back, one line per call. The
//! pipeline only pulls a new line when it has room for another in-flight
//! request, so large inputs are never buffered whole.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A single-pass, incrementally read sequence of raw lines.
#[async_trait]
pub trait LineSource: Send {
    /// Next raw line, or `None` at end of input.
    ///
    /// An `Err` means the input itself is unreadable and aborts the batch.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// [`LineSource`] over a buffered reader.
///
/// Lines end at `\n`, with a trailing `\r` dropped. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD, so a damaged line still yields a line;
/// only a failed read is an error.
#[derive(Debug)]
pub struct ReaderLines<R> {
    reader: R,
    buffer: Vec<u8>,
}

/// Read lines from any [`AsyncBufRead`], such as a file or stdin wrapped in a
/// `BufReader`.
pub fn lines_from_reader<R>(reader: R) -> ReaderLines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    ReaderLines {
        reader,
        buffer: Vec::new(),
    }
}

#[async_trait]
impl<R> LineSource for ReaderLines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer).await? == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buffer)))
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
pub fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[async_trait]
impl<S> LineSource for Box<S>
where
    S: LineSource + ?Sized,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line().await
    }
}

/// [`LineSource`] over an in-memory iterator.
#[derive(Debug)]
pub struct IterLines<I> {
    inner: I,
}

/// Wrap any iterator of strings as a [`LineSource`].
pub fn lines_from_iter<I, S>(lines: I) -> IterLines<I::IntoIter>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    IterLines {
        inner: lines.into_iter(),
    }
}

#[async_trait]
impl<I, S> LineSource for IterLines<I>
where
    I: Iterator<Item = S> + Send,
    S: Into<String> + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.inner.next().map(Into::into))
    }
}
