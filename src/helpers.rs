use crate::constants;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::convert::TryFrom;
use std::sync::Arc;

/// Splits a raw header line at the first `": "` and converts both halves.
pub(crate) fn parse_header_line(line: &[u8]) -> crate::Result<(HeaderName, HeaderValue)> {
    let sep = memchr::memmem::find(line, constants::HEADER_SEPARATOR).ok_or_else(|| {
        crate::Error::BadHeaderLineNoSeparator {
            line: bytes::Bytes::copy_from_slice(line),
        }
    })?;

    let (raw_name, raw_value) = (&line[..sep], &line[sep + constants::HEADER_SEPARATOR.len()..]);

    let name = HeaderName::try_from(raw_name).map_err(|err| crate::Error::DecodeHeaderName {
        name: String::from_utf8_lossy(raw_name).into_owned(),
        cause: Arc::new(err),
    })?;

    let value = HeaderValue::try_from(raw_value).map_err(|err| crate::Error::DecodeHeaderValue {
        value: raw_value.to_vec(),
        cause: Arc::new(err),
    })?;

    Ok((name, value))
}

/// Reads the body length of a part. Every `Content-Length` occurrence must
/// hold the same non-negative integer.
pub(crate) fn parse_content_length(headers: &HeaderMap) -> crate::Result<usize> {
    let mut content_length = None;

    for value in headers.get_all(header::CONTENT_LENGTH) {
        let len = parse_decimal(value.as_bytes()).ok_or(crate::Error::MissingOrInvalidContentLength)?;

        match content_length {
            Some(prev) if prev != len => return Err(crate::Error::MissingOrInvalidContentLength),
            _ => content_length = Some(len),
        }
    }

    content_length.ok_or(crate::Error::MissingOrInvalidContentLength)
}

fn parse_decimal(raw: &[u8]) -> Option<usize> {
    let is_ows = |b: &u8| *b == b' ' || *b == b'\t';
    let start = raw.iter().position(|b| !is_ows(b))?;
    let end = raw.iter().rposition(|b| !is_ows(b))? + 1;
    let digits = &raw[start..end];

    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    digits.iter().try_fold(0usize, |acc, digit| {
        acc.checked_mul(10)?.checked_add(usize::from(digit - b'0'))
    })
}
