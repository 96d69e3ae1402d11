use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use bytes::Bytes;
use derive_more::Display;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a multipart stream and in
/// other operations.
///
/// Every error returned by [`Multipart`](crate::Multipart) is fatal for the
/// decode session: the same error is returned again by every later request.
#[derive(Display, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The `Content-Type` is not a `multipart/*` type with exactly one
    /// non-empty `boundary` parameter.
    #[display(fmt = "invalid content type: {:?}", content_type)]
    InvalidContentType { content_type: String },

    /// The line where a delimiter was expected is not `--<boundary>`.
    #[display(fmt = "bad part boundary")]
    BadBoundaryLine { line: Bytes },

    /// A header line contains a CR which is not followed by a NL.
    #[display(fmt = "bad part header line (CR without NL)")]
    BadHeaderLineCrWithoutNl,

    /// A non-empty header line has no `": "` separator.
    #[display(fmt = "bad part header line (no \": \")")]
    BadHeaderLineNoSeparator { line: Bytes },

    /// The header block has no usable `Content-Length` header.
    #[display(fmt = "missing/invalid part Content-Length")]
    MissingOrInvalidContentLength,

    /// The stream ended while a part was only partially received.
    #[display(fmt = "multipart stream ended mid-part")]
    UnexpectedEndOfStream,

    /// The underlying stream failed. The cause is kept as it was produced by
    /// the stream and is also available through
    /// [`source`](std::error::Error::source).
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(SharedError),

    /// Failed to decode a part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode part's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: SharedError },

    /// Failed to decode a part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode part's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: SharedError },

    /// A part declared a `Content-Length` above the configured limit.
    #[display(fmt = "part #{} exceeded the maximum size limit: {} bytes", index, limit)]
    PartSizeExceeded { limit: u64, index: usize },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// Failed to decode the part body as `JSON` in
    /// [`part.json()`](crate::Part::json) method.
    #[cfg(feature = "json")]
    #[display(fmt = "failed to decode part body as JSON: {}", _0)]
    DecodeJson(Arc<serde_json::Error>),
}

impl Error {
    pub(crate) fn stream_read_failed(cause: BoxError) -> Error {
        Error::StreamReadFailed(Arc::from(cause))
    }

    /// Returns `true` if the error was produced by the underlying stream
    /// rather than by a malformed multipart payload.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Error::StreamReadFailed(_))
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamReadFailed(cause) => Some(&**cause),
            Error::DecodeHeaderName { cause, .. } | Error::DecodeHeaderValue { cause, .. } => Some(&**cause),
            #[cfg(feature = "json")]
            Error::DecodeJson(cause) => Some(&**cause),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
