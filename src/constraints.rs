use crate::size_limit::SizeLimit;

/// Represents some rules to be applied on the stream to prevent abuse.
///
/// # Examples
///
/// ```
/// use multipart_mixed::{Constraints, Multipart, SizeLimit};
/// # use bytes::Bytes;
/// # use std::convert::Infallible;
/// # use futures_util::stream::once;
///
/// # async fn run() {
/// # let data = "--X-BOUNDARY\r\nContent-Length: 4\r\n\r\nabcd";
/// # let some_stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let constraints = Constraints::new().size_limit(
///     SizeLimit::new()
///         .whole_stream(15 * 1024 * 1024)
///         .per_part(1024 * 1024),
/// );
///
/// let mut multipart = Multipart::with_constraints(some_stream, "X-BOUNDARY", constraints);
///
/// while let Some(part) = multipart.next_part().await.unwrap() {
///     println!("{} bytes", part.body().len());
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on the size of the stream and of each part.
    pub fn size_limit(self, size_limit: SizeLimit) -> Constraints {
        Constraints { size_limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_unbounded() {
        let constraints = Constraints::new();
        assert_eq!(constraints.size_limit.whole_stream, u64::MAX);
        assert_eq!(constraints.size_limit.per_part, u64::MAX);
    }

    #[test]
    fn test_size_limit_builder() {
        let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(100).per_part(10));
        assert_eq!(constraints.size_limit.whole_stream, 100);
        assert_eq!(constraints.size_limit.per_part, 10);
    }
}
