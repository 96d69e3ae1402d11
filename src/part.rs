use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use http::header::{self, HeaderMap};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

/// A single decoded part of a multipart stream.
///
/// The body always holds exactly as many bytes as the part's `Content-Length`
/// header declared. Header names are stored lowercase by [`HeaderMap`], so
/// iterating the headers yields `content-type` even if the wire said
/// `Content-Type`; lookup stays case-insensitive. When a header name occurs
/// more than once on the wire every occurrence is kept in order:
/// [`HeaderMap::get`] returns the first one and [`HeaderMap::get_all`] returns
/// all of them.
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
/// let data = "--X-BOUNDARY\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nabcd";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
///
/// let part = multipart.next_part().await.unwrap().unwrap();
///
/// assert_eq!(part.content_type(), Some(mime::TEXT_PLAIN));
/// assert_eq!(part.text(), "abcd");
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug, Clone)]
pub struct Part {
    headers: HeaderMap,
    body: Bytes,
    idx: usize,
}

impl Part {
    pub(crate) fn new(headers: HeaderMap, body: Bytes, idx: usize) -> Self {
        Part { headers, body, idx }
    }

    /// The headers of the part, without the blank line ending the header block.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body of the part.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The declared `Content-Length`, which is also the body length.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Get the content type of the part, if it is present and valid.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok())
    }

    /// Get the index of this part in order they appeared in the stream.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Consumes the part, returning its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consumes the part, returning its headers and body.
    pub fn into_parts(self) -> (HeaderMap, Bytes) {
        (self.headers, self.body)
    }

    /// Decodes the body as text.
    ///
    /// The `charset` parameter of the part's `Content-Type` picks the
    /// encoding, falling back to `utf-8`. Malformed sequences are replaced
    /// with `U+FFFD`.
    pub fn text(&self) -> String {
        self.text_with_charset("utf-8")
    }

    /// Decodes the body as text, using `default_encoding` when the part's
    /// `Content-Type` has no `charset` parameter.
    ///
    /// Unknown encoding labels fall back to `utf-8`.
    pub fn text_with_charset(&self, default_encoding: &str) -> String {
        let content_type = self.content_type();
        let encoding_name = content_type
            .as_ref()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding);

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }

    /// Deserializes the body as `JSON`.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| crate::Error::DecodeJson(std::sync::Arc::new(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    fn part_with(content_type: Option<&'static str>, body: &'static [u8]) -> Part {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        Part::new(headers, Bytes::from_static(body), 3)
    }

    #[test]
    fn test_accessors() {
        let part = part_with(Some("image/jpeg"), b"\xff\xd8\xff");

        assert_eq!(part.index(), 3);
        assert_eq!(part.content_length(), 3);
        assert_eq!(part.content_type(), Some(mime::IMAGE_JPEG));
        assert_eq!(part.headers().get("content-length").unwrap(), "3");
        assert_eq!(part.headers().get("CONTENT-LENGTH").unwrap(), "3");

        let (headers, body) = part.into_parts();
        assert_eq!(headers.len(), 2);
        assert_eq!(&body[..], b"\xff\xd8\xff");
    }

    #[test]
    fn test_text() {
        assert_eq!(part_with(None, b"hello").text(), "hello");
        assert_eq!(part_with(Some("text/plain; charset=utf-8"), b"caf\xc3\xa9").text(), "café");
        assert_eq!(part_with(Some("text/plain; charset=iso-8859-1"), b"caf\xe9").text(), "café");
        assert_eq!(part_with(None, b"caf\xe9").text_with_charset("latin1"), "café");
        assert_eq!(part_with(None, b"caf\xe9").text(), "caf\u{fffd}");
    }

    #[test]
    fn test_content_type_invalid() {
        assert_eq!(part_with(Some("not a mime"), b"").content_type(), None);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Frame {
            seq: u32,
        }

        let part = part_with(Some("application/json"), br#"{"seq":7}"#);
        assert_eq!(part.json::<Frame>(), Ok(Frame { seq: 7 }));
        assert!(part_with(None, b"{").json::<Frame>().is_err());
    }
}
