#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The byte stream failed mid-read.
#[derive(Debug, PartialEq, Eq)]
pub struct Error;

/// A source of opaque byte chunks, normally an HTTP response body.
///
/// Tests can construct one from a scripted chunk sequence to exercise
/// arbitrary chunk boundaries.
pub struct Chunks {
    inner: Inner,
}

enum Inner {
    Response(Box<Response>),
    #[cfg(test)]
    Scripted(VecDeque<Bytes>),
}

impl Chunks {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Self {
            inner: Inner::Response(Box::new(response)),
        }
    }

    #[cfg(test)]
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        Self {
            inner: Inner::Scripted(chunks.into_iter().collect()),
        }
    }

    /// Pulls the next chunk, or `None` at end-of-stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match &mut self.inner {
            Inner::Response(response) => {
                response.chunk().await.map_err(|_| Error)
            }
            #[cfg(test)]
            Inner::Scripted(chunks) => Ok(chunks.pop_front()),
        }
    }
}
