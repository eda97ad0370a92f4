use crate::cloudflare::requests::{Request, RequestBody};
use crate::progress::ProgressCounter;
use bytes::Bytes;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

/// Size of one streamed body chunk (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Upload payload of a fixed total size.
///
/// Holds a single chunk-sized buffer; every chunk sent on the wire is a
/// zero-copy slice of it, so streaming never allocates per chunk.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    size: u64,
    chunk: Bytes,
}

impl UploadPayload {
    pub fn new(size: u64) -> Self {
        let chunk_len = size.min(CHUNK_SIZE as u64) as usize;
        Self { size, chunk: Bytes::from(vec![b'0'; chunk_len]) }
    }

    /// Total number of bytes this payload uploads.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// A payload of a different total size sharing the same buffer.
    ///
    /// `size` must not need a larger chunk than this payload holds;
    /// used to split a payload across parallel connections.
    pub(crate) fn share(&self, size: u64) -> Self {
        let chunk_len = size.min(self.chunk.len() as u64) as usize;
        Self { size, chunk: self.chunk.slice(..chunk_len) }
    }
}

/// `POST /__up` with a streamed body.
pub(crate) struct Upload {
    pub payload: UploadPayload,
    pub deadline: Option<Instant>,
    pub progress: Arc<ProgressCounter>,
}

impl Request for Upload {
    type Response = ();

    const METHOD: Method = Method::POST;

    fn endpoint(&'_ self) -> Cow<'_, str> {
        "/__up".into()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain;charset=UTF-8"),
        );

        headers
    }

    fn body(&self) -> RequestBody {
        let chunks = UploadChunks {
            chunk: self.payload.chunk.clone(),
            remaining: self.payload.size,
            deadline: self.deadline,
            progress: self.progress.clone(),
        };

        RequestBody::Stream(Body::wrap_stream(futures::stream::iter(chunks)))
    }
}

/// Lazily produced body chunks.
///
/// The client pulls the next chunk only once the previous one has been
/// handed to the connection, so the deadline check here happens in real
/// time between chunk writes.
struct UploadChunks {
    chunk: Bytes,
    remaining: u64,
    deadline: Option<Instant>,
    progress: Arc<ProgressCounter>,
}

impl Iterator for UploadChunks {
    type Item = Result<Bytes, std::io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.chunk.is_empty() {
            return None;
        }

        if self.deadline.is_some_and(|deadline| Instant::now() > deadline) {
            debug!("Deadline reached with {} bytes left to upload", self.remaining);
            return None;
        }

        let len = self.remaining.min(self.chunk.len() as u64) as usize;
        self.remaining -= len as u64;
        self.progress.advance(len as u64);

        Some(Ok(self.chunk.slice(..len)))
    }
}
