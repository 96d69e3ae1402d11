use crate::constants;
use bytes::{Buf, Bytes, BytesMut};
use futures_util::stream::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

type ByteStream<'r> = Pin<Box<dyn Stream<Item = Result<Bytes, crate::Error>> + Send + 'r>>;

/// Bytes received from the underlying stream which are not yet part of an
/// emitted [`Part`](crate::Part).
///
/// Every `read_*` method either consumes a complete item from the front of
/// the buffer or returns `None`, in which case the caller polls for more data
/// and retries. Only blank separator lines are consumed on a `None`.
pub(crate) struct StreamBuffer<'r> {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    pub(crate) stream: Option<ByteStream<'r>>,
    pub(crate) whole_stream_size_limit: u64,
    pub(crate) stream_size_counter: u64,
}

impl<'r> StreamBuffer<'r> {
    pub fn new<S>(stream: S, whole_stream_size_limit: u64) -> Self
    where
        S: Stream<Item = Result<Bytes, crate::Error>> + Send + 'r,
    {
        StreamBuffer {
            eof: false,
            buf: BytesMut::new(),
            stream: Some(Box::pin(stream)),
            whole_stream_size_limit,
            stream_size_counter: 0,
        }
    }

    /// Requests a single chunk from the underlying stream and appends it.
    ///
    /// Resolves once the buffer grew, the stream ended or the stream failed.
    pub fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<crate::Result<()>> {
        let stream = match self.stream.as_mut() {
            Some(stream) if !self.eof => stream,
            _ => {
                self.eof = true;
                return Poll::Ready(Ok(()));
            }
        };

        match stream.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(data))) => {
                self.stream_size_counter += data.len() as u64;

                if self.stream_size_counter > self.whole_stream_size_limit {
                    return Poll::Ready(Err(crate::Error::StreamSizeExceeded {
                        limit: self.whole_stream_size_limit,
                    }));
                }

                self.buf.extend_from_slice(&data);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Err(err)),
            Poll::Ready(None) => {
                self.eof = true;
                self.release();
                Poll::Ready(Ok(()))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    /// Drops the underlying stream. Returns `false` if it was already gone.
    pub fn release(&mut self) -> bool {
        self.stream.take().is_some()
    }

    /// Returns `true` once nothing is buffered and nothing more can arrive.
    pub fn is_exhausted(&self) -> bool {
        self.eof && self.buf.is_empty()
    }

    pub fn read_exact(&mut self, size: usize) -> Option<Bytes> {
        if size <= self.buf.len() {
            Some(self.buf.split_to(size).freeze())
        } else {
            None
        }
    }

    /// Skips blank lines and then consumes `delimiter`, which must be the
    /// full `--<boundary>\r\n` line.
    ///
    /// Bytes are matched against the delimiter as soon as they arrive. A
    /// wrong line is reported once its `\r\n` (or the end of the stream) has
    /// been buffered, so the error always carries the whole line.
    pub fn read_delimiter(&mut self, delimiter: &[u8]) -> crate::Result<Option<()>> {
        while self.buf.starts_with(constants::CRLF.as_bytes()) {
            self.buf.advance(constants::CRLF.len());
        }

        // A lone CR may still become a blank line.
        if self.buf.is_empty() || self.buf[..] == [constants::CR] {
            return Ok(None);
        }

        let n = self.buf.len().min(delimiter.len());
        if self.buf[..n] != delimiter[..n] {
            let end = match memchr::memmem::find(&self.buf, constants::CRLF.as_bytes()) {
                Some(end) => end,
                None if self.eof => self.buf.len(),
                None => return Ok(None),
            };
            let line = Bytes::copy_from_slice(&self.buf[..end]);
            return Err(crate::Error::BadBoundaryLine { line });
        }

        if n < delimiter.len() {
            return Ok(None);
        }

        self.buf.advance(delimiter.len());
        Ok(Some(()))
    }

    /// Consumes one `\r\n` terminated line and returns it without the
    /// terminator.
    /// Length of the buffered bytes before the first `\r`.
    pub fn line_prefix_len(&self) -> usize {
        memchr::memchr(constants::CR, &self.buf).unwrap_or(self.buf.len())
    }

    pub fn read_line(&mut self) -> crate::Result<Option<Bytes>> {
        let idx = match memchr::memchr(constants::CR, &self.buf) {
            Some(idx) if idx + 1 < self.buf.len() => idx,
            _ => return Ok(None),
        };

        if self.buf[idx + 1] != constants::LF {
            return Err(crate::Error::BadHeaderLineCrWithoutNl);
        }

        let line = self.buf.split_to(idx).freeze();
        self.buf.advance(constants::CRLF.len());

        Ok(Some(line))
    }
}

impl fmt::Debug for StreamBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("eof", &self.eof)
            .field("buffered", &self.buf.len())
            .field("released", &self.stream.is_none())
            .field("stream_size_counter", &self.stream_size_counter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn buffer_with(data: &'static [u8]) -> StreamBuffer<'static> {
        let mut buffer = StreamBuffer::new(stream::empty::<crate::Result<Bytes>>(), u64::MAX);
        buffer.buf.extend_from_slice(data);
        buffer
    }

    #[test]
    fn test_read_exact() {
        let mut buffer = buffer_with(b"abcdef");

        assert_eq!(buffer.read_exact(7), None);
        assert_eq!(buffer.read_exact(4), Some(Bytes::from_static(b"abcd")));
        assert_eq!(buffer.read_exact(0), Some(Bytes::new()));
        assert_eq!(&buffer.buf[..], b"ef");
    }

    #[test]
    fn test_read_line() {
        let mut buffer = buffer_with(b"Name: value\r\n\r\nrest\r");
        assert_eq!(buffer.line_prefix_len(), 11);

        assert_eq!(buffer.read_line(), Ok(Some(Bytes::from_static(b"Name: value"))));
        assert_eq!(buffer.read_line(), Ok(Some(Bytes::new())));
        assert_eq!(buffer.read_line(), Ok(None));
        assert_eq!(&buffer.buf[..], b"rest\r");
    }

    #[test]
    fn test_read_line_cr_without_nl() {
        let mut buffer = buffer_with(b"Name: va\rlue\r\n");
        assert_eq!(buffer.read_line(), Err(crate::Error::BadHeaderLineCrWithoutNl));
    }

    #[test]
    fn test_read_delimiter() {
        let mut buffer = buffer_with(b"\r\n\r\n--XYZ\r\nafter");

        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(Some(())));
        assert_eq!(&buffer.buf[..], b"after");
    }

    #[test]
    fn test_read_delimiter_partial() {
        let mut buffer = buffer_with(b"\r\n--XY");
        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(None));
        assert_eq!(&buffer.buf[..], b"--XY");

        let mut buffer = buffer_with(b"\r");
        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(None));
    }

    fn bad_line(result: crate::Result<Option<()>>) -> Bytes {
        match result {
            Err(crate::Error::BadBoundaryLine { line }) => line,
            other => panic!("expected a bad boundary line, got {:?}", other),
        }
    }

    #[test]
    fn test_read_delimiter_mismatch() {
        let mut buffer = buffer_with(b"--XYW\r\n");
        assert_eq!(bad_line(buffer.read_delimiter(b"--XYZ\r\n")), Bytes::from_static(b"--XYW"));

        let mut buffer = buffer_with(b"--XYW-and-more\r\nnext");
        assert_eq!(
            bad_line(buffer.read_delimiter(b"--XYZ\r\n")),
            Bytes::from_static(b"--XYW-and-more")
        );
    }

    #[test]
    fn test_read_delimiter_mismatch_waits_for_line_end() {
        let mut buffer = buffer_with(b"--XW");
        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(None));

        buffer.buf.extend_from_slice(b"\rx\r");
        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(None));

        buffer.buf.extend_from_slice(b"\n");
        assert_eq!(bad_line(buffer.read_delimiter(b"--XYZ\r\n")), Bytes::from_static(b"--XW\rx"));

        let mut buffer = buffer_with(b"\rx");
        assert_eq!(buffer.read_delimiter(b"--XYZ\r\n"), Ok(None));

        buffer.eof = true;
        assert_eq!(bad_line(buffer.read_delimiter(b"--XYZ\r\n")), Bytes::from_static(b"\rx"));
    }

    #[test]
    fn test_release_once() {
        let mut buffer = buffer_with(b"");
        assert!(buffer.release());
        assert!(!buffer.release());
    }
}
