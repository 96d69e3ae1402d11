use crate::buffer::StreamBuffer;
use crate::constants;
use crate::constraints::Constraints;
use crate::error::BoxError;
use crate::helpers;
use crate::state::{DecodingStage, MultipartState};
use crate::Part;
use bytes::Bytes;
use futures_util::future;
use futures_util::stream::{Stream, TryStreamExt};
use http::header::HeaderMap;
use std::fmt;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

/// Decodes a length-delimited multipart stream, such as `multipart/mixed` or
/// `multipart/x-mixed-replace`, into [`Part`]s.
///
/// Each part starts with a `--<boundary>` line followed by its header block
/// and exactly `Content-Length` body bytes. Blank lines between parts are
/// skipped. The stream ends cleanly when the source ends between two parts.
///
/// Decoding is driven by the caller: the source is only polled while a
/// [`next_part`](Multipart::next_part) request needs more bytes, and the
/// chunking of the source has no influence on the decoded parts.
///
/// The parts can be accessed via the [`Stream`] API or the methods defined in
/// this type.
///
/// Every error is fatal. Once a request failed, every later request returns
/// the same error; once the stream ended, every later request returns
/// `Ok(None)`.
///
/// Dropping the `Multipart`, or calling [`cancel`](Multipart::cancel), drops
/// the underlying stream.
///
/// # Examples
///
/// ```
/// use multipart_mixed::Multipart;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Length: 4\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Length: 2\r\n\r\nef";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
///
/// while let Some(part) = multipart.next_part().await.unwrap() {
///     println!("Part: {:?}", part.body())
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct Multipart<'r> {
    state: MultipartState<'r>,
}

enum Decoded {
    Part(Part),
    End,
    NeedMore,
}

impl<'r> Multipart<'r> {
    /// Construct a new `Multipart` instance with the given [`Bytes`] stream and
    /// the boundary.
    pub fn new<S, O, E, B>(stream: S, boundary: B) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<BoxError> + 'r,
        B: Into<String>,
    {
        Multipart::with_constraints(stream, boundary, Constraints::default())
    }

    /// Construct a new `Multipart` instance with the given [`Bytes`] stream,
    /// the boundary and the constraints.
    pub fn with_constraints<S, O, E, B>(stream: S, boundary: B, constraints: Constraints) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<BoxError> + 'r,
        B: Into<String>,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::stream_read_failed(err.into()));

        let boundary: String = boundary.into();
        let delimiter = format!("{}{}{}", constants::BOUNDARY_EXT, boundary, constants::CRLF).into_bytes();

        let state = MultipartState {
            buffer: StreamBuffer::new(stream, constraints.size_limit.whole_stream),
            delimiter,
            stage: DecodingStage::AwaitingBoundary,
            next_part_idx: 0,
            per_part_size_limit: constraints.size_limit.per_part,
            curr_header_size: 0,
        };

        Multipart { state }
    }

    /// Construct a new `Multipart` instance from the `Content-Type` of the
    /// response and its body stream.
    ///
    /// The content type is validated with [`parse_boundary`](crate::parse_boundary)
    /// before the stream is touched; on failure the stream is dropped without
    /// being polled.
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_mixed::{Error, Multipart};
    /// use bytes::Bytes;
    /// use std::convert::Infallible;
    /// use futures_util::stream::empty;
    ///
    /// let stream = empty::<Result<Bytes, Infallible>>();
    /// let multipart = Multipart::from_content_type(stream, "text/plain; boundary=X");
    ///
    /// assert!(matches!(multipart, Err(Error::InvalidContentType { .. })));
    /// ```
    pub fn from_content_type<S, O, E, T>(stream: S, content_type: T) -> crate::Result<Self>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<BoxError> + 'r,
        T: AsRef<str>,
    {
        Multipart::from_content_type_with_constraints(stream, content_type, Constraints::default())
    }

    /// Construct a new `Multipart` instance from the `Content-Type` of the
    /// response, its body stream and the constraints.
    pub fn from_content_type_with_constraints<S, O, E, T>(
        stream: S,
        content_type: T,
        constraints: Constraints,
    ) -> crate::Result<Self>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<BoxError> + 'r,
        T: AsRef<str>,
    {
        let boundary = crate::parse_boundary(content_type)?;
        Ok(Multipart::with_constraints(stream, boundary, constraints))
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`] reader
    /// and the boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_mixed::Multipart;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Length: 4\r\n\r\nabcd\r\n";
    /// let reader = data.as_bytes();
    /// let mut multipart = Multipart::with_reader(reader, "X-BOUNDARY");
    ///
    /// while let Some(part) = multipart.next_part().await.unwrap() {
    ///     println!("Body: {:?}", part.text());
    /// }
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    pub fn with_reader<R, B>(reader: R, boundary: B) -> Self
    where
        R: AsyncRead + Send + 'r,
        B: Into<String>,
    {
        let stream = ReaderStream::new(reader);
        Multipart::new(stream, boundary)
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`] reader,
    /// the boundary and the constraints.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    pub fn with_reader_with_constraints<R, B>(reader: R, boundary: B, constraints: Constraints) -> Self
    where
        R: AsyncRead + Send + 'r,
        B: Into<String>,
    {
        let stream = ReaderStream::new(reader);
        Multipart::with_constraints(stream, boundary, constraints)
    }

    /// Yields the next [`Part`] if available.
    ///
    /// Returns `Ok(None)` once the underlying stream ended cleanly between two
    /// parts.
    pub async fn next_part(&mut self) -> crate::Result<Option<Part>> {
        future::poll_fn(|cx| self.poll_next_part(cx)).await
    }

    /// Yields the next [`Part`] with its positioning index as a tuple
    /// `(usize, Part)`.
    pub async fn next_part_with_idx(&mut self) -> crate::Result<Option<(usize, Part)>> {
        self.next_part().await.map(|p| p.map(|part| (part.index(), part)))
    }

    /// Polls for the next [`Part`].
    ///
    /// The underlying stream is polled at most once per pass and only when the
    /// buffered bytes do not complete the next part.
    pub fn poll_next_part(&mut self, cx: &mut Context<'_>) -> Poll<crate::Result<Option<Part>>> {
        loop {
            match &self.state.stage {
                DecodingStage::Finished => return Poll::Ready(Ok(None)),
                DecodingStage::Failed(err) => return Poll::Ready(Err(err.clone())),
                _ => {}
            }

            match self.state.decode() {
                Ok(Decoded::Part(part)) => return Poll::Ready(Ok(Some(part))),
                Ok(Decoded::End) => {
                    self.state.finish();
                    return Poll::Ready(Ok(None));
                }
                Ok(Decoded::NeedMore) => {
                    if let Err(err) = futures_util::ready!(self.state.buffer.poll_fill(cx)) {
                        return Poll::Ready(Err(self.state.fail(err)));
                    }
                }
                Err(err) => return Poll::Ready(Err(self.state.fail(err))),
            }
        }
    }

    /// Stops decoding and drops the underlying stream.
    ///
    /// Later requests return `Ok(None)`, or the previous error if decoding
    /// had already failed. Calling this more than once has no further effect.
    pub fn cancel(&mut self) {
        if self.state.buffer.release() {
            trace!("multipart: stream cancelled");
        }

        if !self.state.stage.is_terminal() {
            self.state.finish();
        }
    }

    /// Returns `true` once no more parts can be yielded, either because the
    /// stream ended, was cancelled or failed.
    pub fn is_terminated(&self) -> bool {
        self.state.stage.is_terminal()
    }
}

impl MultipartState<'_> {
    fn decode(&mut self) -> crate::Result<Decoded> {
        loop {
            match &mut self.stage {
                DecodingStage::AwaitingBoundary => match self.buffer.read_delimiter(&self.delimiter)? {
                    Some(()) => {
                        trace!("multipart: boundary of part #{} found", self.next_part_idx);
                        self.curr_header_size = 0;
                        self.stage = DecodingStage::AwaitingHeaders(HeaderMap::new());
                    }
                    None if self.buffer.is_exhausted() => return Ok(Decoded::End),
                    None => return need_more(self.buffer.eof),
                },
                DecodingStage::AwaitingHeaders(headers) => {
                    let pending = self.buffer.line_prefix_len() as u64;
                    if self.curr_header_size.saturating_add(pending) > self.per_part_size_limit {
                        return Err(part_size_exceeded(self.per_part_size_limit, self.next_part_idx));
                    }

                    let line = match self.buffer.read_line()? {
                        Some(line) => line,
                        None => return need_more(self.buffer.eof),
                    };

                    self.curr_header_size += (line.len() + constants::CRLF.len()) as u64;
                    if self.curr_header_size > self.per_part_size_limit {
                        return Err(part_size_exceeded(self.per_part_size_limit, self.next_part_idx));
                    }

                    if !line.is_empty() {
                        let (name, value) = helpers::parse_header_line(&line)?;
                        headers.append(name, value);
                        continue;
                    }

                    let content_length = helpers::parse_content_length(headers)?;

                    if content_length as u64 > self.per_part_size_limit {
                        return Err(part_size_exceeded(self.per_part_size_limit, self.next_part_idx));
                    }

                    trace!(
                        "multipart: headers of part #{} read, expecting {} body bytes",
                        self.next_part_idx,
                        content_length
                    );

                    let headers = mem::take(headers);
                    self.stage = DecodingStage::AwaitingBody {
                        headers,
                        content_length,
                    };
                }
                DecodingStage::AwaitingBody {
                    headers,
                    content_length,
                } => {
                    let body = match self.buffer.read_exact(*content_length) {
                        Some(body) => body,
                        None => return need_more(self.buffer.eof),
                    };

                    let part = Part::new(mem::take(headers), body, self.next_part_idx);
                    self.next_part_idx += 1;
                    self.stage = DecodingStage::AwaitingBoundary;

                    return Ok(Decoded::Part(part));
                }
                DecodingStage::Finished => return Ok(Decoded::End),
                DecodingStage::Failed(err) => return Err(err.clone()),
            }
        }
    }

    fn finish(&mut self) {
        debug!("multipart: finished after {} parts", self.next_part_idx);

        self.stage = DecodingStage::Finished;
        self.buffer.release();
        self.buffer.buf.clear();
    }

    fn fail(&mut self, err: crate::Error) -> crate::Error {
        debug!("multipart: decoding part #{} failed: {}", self.next_part_idx, err);

        self.stage = DecodingStage::Failed(err.clone());
        self.buffer.release();
        self.buffer.buf.clear();
        err
    }
}

fn part_size_exceeded(limit: u64, index: usize) -> crate::Error {
    crate::Error::PartSizeExceeded { limit, index }
}

fn need_more(eof: bool) -> crate::Result<Decoded> {
    if eof {
        Err(crate::Error::UnexpectedEndOfStream)
    } else {
        Ok(Decoded::NeedMore)
    }
}

impl Stream for Multipart<'_> {
    type Item = crate::Result<Part>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_next_part(cx).map(Result::transpose)
    }
}

impl fmt::Debug for Multipart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multipart").field("state", &self.state).finish()
    }
}
