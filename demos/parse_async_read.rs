use tokio::io::AsyncRead;
// Import multipart_mixed types.
use multipart_mixed::Multipart;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the boundary from somewhere e.g. a camera feed response body.
    let (reader, boundary) = get_async_reader_from_somewhere().await;

    // Create a `Multipart` instance from that async reader and the boundary.
    let mut multipart = Multipart::with_reader(reader, boundary);

    // Iterate over the parts, use `next_part()` to get the next part.
    while let Some(part) = multipart.next_part().await? {
        // Get the part's content type if provided in the "Content-Type" header.
        let content_type = part.content_type();

        println!("Index: {}, Content Type: {:?}", part.index(), content_type);

        // Read part content as text.
        println!("Content: {:?}", part.text());
    }

    Ok(())
}

// Generate an `AsyncRead` and the boundary from somewhere e.g. a camera feed response body.
async fn get_async_reader_from_somewhere() -> (impl AsyncRead, &'static str) {
    let data = "--frame\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nHello world\r\n--frame\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: 13\r\n\r\nHello\r\nWorld\r\r\n";

    (data.as_bytes(), "frame")
}
