//! Bounded buffering of upstream bodies.

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, StreamExt};

use super::forward::BodyStream;

/// Result of trying to buffer a body under a size limit.
pub enum Buffered {
    /// The whole body fit.
    Complete(Bytes),
    /// The limit was crossed; yields the bytes read so far, then the rest.
    Overflow(BodyStream),
}

/// Read `body` into memory unless it grows past `limit` bytes.
pub async fn buffer_with_limit(mut body: BodyStream, limit: usize) -> Result<Buffered, reqwest::Error> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if buffer.len() + chunk.len() > limit {
            let head = stream::iter([Ok(buffer.freeze()), Ok(chunk)]);
            return Ok(Buffered::Overflow(head.chain(body).boxed()));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Buffered::Complete(buffer.freeze()))
}
