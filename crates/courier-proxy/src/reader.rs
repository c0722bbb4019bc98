//! Bounded capture of upstream response bodies

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// Response bytes captured from upstream, never longer than the ceiling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedBody {
    chunks: Vec<Bytes>,
    total: usize,
    capped: bool,
}

impl CapturedBody {
    /// Bytes captured so far
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Whether capture stopped because the ceiling was reached
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Captured chunks in arrival order
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Append a chunk, trimming it to the ceiling.
    /// Returns `true` once the ceiling is reached.
    fn push(&mut self, mut chunk: Bytes, limit: usize) -> bool {
        let remaining = limit.saturating_sub(self.total);
        if chunk.len() > remaining {
            chunk.truncate(remaining);
        }

        self.total += chunk.len();
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }

        if self.total >= limit {
            self.capped = true;
        }
        self.capped
    }

    /// Join the chunks into one buffer
    pub fn into_bytes(mut self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks.remove(0),
            _ => {
                let mut joined = BytesMut::with_capacity(self.total);
                for chunk in &self.chunks {
                    joined.extend_from_slice(chunk);
                }
                joined.freeze()
            }
        }
    }
}

impl From<Bytes> for CapturedBody {
    /// A complete, uncapped body
    fn from(bytes: Bytes) -> Self {
        let total = bytes.len();
        let chunks = if bytes.is_empty() { Vec::new() } else { vec![bytes] };
        Self {
            chunks,
            total,
            capped: false,
        }
    }
}

/// Read a chunk stream until it ends or `limit` bytes have been captured.
///
/// The stream is dropped as soon as the ceiling is hit; whatever upstream
/// still had to send is discarded. Reaching the ceiling is not an error.
pub async fn read_bounded<S, E>(stream: S, limit: usize) -> Result<CapturedBody, E>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    futures::pin_mut!(stream);

    let mut body = CapturedBody::default();
    while let Some(chunk) = stream.next().await {
        if body.push(chunk?, limit) {
            tracing::debug!(limit, "Response body reached ceiling, truncating");
            break;
        }
    }

    Ok(body)
}
