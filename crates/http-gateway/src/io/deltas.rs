use std::mem;

use super::{Chunks, ChunksError};

/// The framing prefix of a text-delta line. Every other line kind in
/// the stream is ignored.
const TEXT_DELTA_PREFIX: &str = "0:";

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading text-delta lines from a chunk stream.
///
/// The stream is a sequence of `\n`-separated lines. A line may arrive
/// split across several chunks, so incoming text is buffered and only
/// complete lines are consumed; whatever remains after the last chunk
/// is treated as the final line.
pub struct DeltaLines {
    buf: String,
    chunks: Chunks,
    ended: bool,
}

impl DeltaLines {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            chunks,
            ended: false,
        }
    }

    /// Reads the next text-delta fragment, skipping all other line
    /// kinds. Returns `None` once the stream is exhausted.
    pub async fn next_delta(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain any complete lines already buffered.
            if let Some(delta) = self.take_buffered_delta() {
                return Ok(Some(delta));
            }

            if self.ended {
                // The unterminated tail is still a line.
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let tail = mem::take(&mut self.buf);
                return Ok(parse_delta_line(tail.trim_end_matches('\r')));
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            {
                Some(bytes) => {
                    let Ok(s) = str::from_utf8(&bytes) else {
                        return Err(Error::InvalidPayload);
                    };
                    self.buf.push_str(s);
                }
                None => self.ended = true,
            }
        }
    }

    fn take_buffered_delta(&mut self) -> Option<String> {
        while let Some(eol_idx) = self.buf.find('\n') {
            let line: String = self.buf[..eol_idx].to_owned();
            self.buf.drain(..=eol_idx);
            if let Some(delta) = parse_delta_line(line.trim_end_matches('\r'))
            {
                return Some(delta);
            }
        }
        None
    }
}

/// Extracts the fragment of a text-delta line: the framing prefix is
/// stripped, then one layer of surrounding quote characters. Fragments
/// are not otherwise unescaped.
fn parse_delta_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(TEXT_DELTA_PREFIX)?;
    let fragment = payload
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(payload);
    Some(fragment.to_owned())
}
