use crate::constants;

/// Represents size limits of the stream to prevent a peer from running the
/// process out of memory.
///
/// Please refer [`Constraints`](crate::Constraints) for more info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    pub(crate) whole_stream: u64,
    pub(crate) per_part: u64,
}

impl SizeLimit {
    /// Creates a default size limit which is [`u64::MAX`] for the whole stream
    /// and for each part.
    pub fn new() -> SizeLimit {
        SizeLimit::default()
    }

    /// Sets size limit for the whole stream, counted in bytes read from the
    /// underlying stream.
    pub fn whole_stream(mut self, limit: u64) -> SizeLimit {
        self.whole_stream = limit;
        self
    }

    /// Sets size limit for each part.
    ///
    /// The limit bounds the header block of a part, counted in bytes including
    /// line endings, while it is being read. It also bounds the declared
    /// `Content-Length`, checked as soon as the header block is complete, so
    /// an oversized part is rejected before any of its body is buffered.
    pub fn per_part(mut self, limit: u64) -> SizeLimit {
        self.per_part = limit;
        self
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            whole_stream: constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT,
            per_part: constants::DEFAULT_PER_PART_SIZE_LIMIT,
        }
    }
}
