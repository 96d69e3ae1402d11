use crate::buffer::StreamBuffer;
use http::header::HeaderMap;

#[derive(Debug)]
pub(crate) struct MultipartState<'r> {
    pub(crate) buffer: StreamBuffer<'r>,
    pub(crate) delimiter: Vec<u8>,
    pub(crate) stage: DecodingStage,
    pub(crate) next_part_idx: usize,
    pub(crate) per_part_size_limit: u64,
    pub(crate) curr_header_size: u64,
}

#[derive(Debug)]
pub(crate) enum DecodingStage {
    AwaitingBoundary,
    AwaitingHeaders(HeaderMap),
    AwaitingBody { headers: HeaderMap, content_length: usize },
    Finished,
    Failed(crate::Error),
}

impl DecodingStage {
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, DecodingStage::Finished | DecodingStage::Failed(_))
    }
}
