#![no_main]

use std::convert::Infallible;

use futures_util::stream::iter;
use libfuzzer_sys::fuzz_target;
use multipart_mixed::bytes::Bytes;
use multipart_mixed::Multipart;
use tokio::runtime;

fuzz_target!(|data: &[u8]| {
    // The first byte picks the chunk size so chunk alignment is fuzzed too.
    let (chunk_size, data) = match data.split_first() {
        Some((size, rest)) => (usize::from(*size).max(1), rest),
        None => return,
    };
    let chunks: Vec<_> = data
        .chunks(chunk_size)
        .map(|chunk| Result::<Bytes, Infallible>::Ok(Bytes::copy_from_slice(chunk)))
        .collect();

    let mut multipart = Multipart::new(iter(chunks), "X-BOUNDARY");

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    rt.block_on(async {
        let mut breaks = 0;
        while breaks < 3 {
            let part = multipart.next_part().await;
            match part {
                Err(_) | Ok(None) => breaks += 1,
                Ok(Some(part)) => assert_eq!(part.body().len(), part.content_length()),
            }
        }
    })
});
