//! An async parser for length-delimited multipart streams such as
//! `multipart/mixed` and `multipart/x-mixed-replace` in Rust.
//!
//! Each part of the stream is announced by a `--<boundary>` line and carries a
//! `Content-Length` header, so the body is sliced by length and never scanned
//! for the boundary. The stream can be fed in chunks of any size and
//! alignment; parts are yielded as soon as their body is complete.
//!
//! # Examples
//!
//! ```
//! use multipart_mixed::Multipart;
//! use bytes::Bytes;
//! use futures_util::stream::Stream;
//! use std::convert::Infallible;
//!
//! # async fn run() {
//! // Generate a byte stream and the content type from somewhere e.g. a camera feed response.
//! let (stream, content_type) = get_byte_stream_from_somewhere().await;
//!
//! // Create a `Multipart` instance from that byte stream and the content type.
//! let mut multipart = Multipart::from_content_type(stream, content_type).unwrap();
//!
//! // Iterate over the parts, use `next_part()` to get the next part.
//! while let Some(part) = multipart.next_part().await.unwrap() {
//!     println!("Headers: {:?}", part.headers());
//!     println!("Body: {:?}", part.body());
//! }
//! # }
//!
//! // Generate a byte stream and the content type from somewhere e.g. a camera feed response.
//! async fn get_byte_stream_from_somewhere() -> (impl Stream<Item = Result<Bytes, Infallible>>, &'static str) {
//!     let data = "--frame\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nabcd\r\n\
//!                 --frame\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nefgh\r\n";
//!     let stream = futures_util::stream::iter(
//!         data.chars()
//!             .map(|ch| ch.to_string())
//!             .map(|part| Ok(Bytes::copy_from_slice(part.as_bytes()))),
//!     );
//!
//!     (stream, "multipart/x-mixed-replace; boundary=frame")
//! }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run());
//! ```
//!
//! ## Optional features
//!
//! * `json`: Adds [`Part::json`] to deserialize a part body as JSON.
//! * `tokio-io`: Adds [`Multipart::with_reader`] to read from a tokio
//!   `AsyncRead`.
//! * `log`: Logs decoding progress through the `log` crate.

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        log::trace!($($arg)+);
        #[cfg(not(feature = "log"))]
        let _ = format_args!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        log::debug!($($arg)+);
        #[cfg(not(feature = "log"))]
        let _ = format_args!($($arg)+);
    }};
}

pub use bytes;
pub use constraints::Constraints;
pub use error::Error;
pub use multipart::Multipart;
pub use part::Part;
pub use size_limit::SizeLimit;

mod buffer;
mod constants;
mod constraints;
mod error;
mod helpers;
mod multipart;
mod part;
mod size_limit;
mod state;

/// A Result type often returned from methods that can have `multipart_mixed` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// Any `multipart/*` subtype is accepted. Exactly one `boundary` parameter
/// with a non-empty value must be present.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/x-mixed-replace; boundary=frame";
///
/// assert_eq!(multipart_mixed::parse_boundary(content_type), Ok("frame".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let content_type = content_type.as_ref();
    let invalid = || Error::InvalidContentType {
        content_type: content_type.to_owned(),
    };

    let m = content_type.parse::<mime::Mime>().map_err(|_| invalid())?;

    if !m.type_().as_str().eq_ignore_ascii_case(mime::MULTIPART.as_str()) {
        return Err(invalid());
    }

    let mut boundaries = m
        .params()
        .filter(|(name, _)| name.as_str().eq_ignore_ascii_case(mime::BOUNDARY.as_str()));

    match (boundaries.next(), boundaries.next()) {
        (Some((_, value)), None) if !value.as_str().is_empty() => Ok(value.as_str().to_owned()),
        _ => Err(invalid()),
    }
}
