//! NDJSON stream parsing for streaming generate responses.
//!
//! The server writes one JSON object per line. HTTP chunk boundaries do not
//! line up with lines, so bytes are buffered until a newline arrives.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{trace, warn};

use notewise_core::{Error, Result};

use crate::ollama::GenerateResponse;

/// Stream of generation fragments, ending with the `done: true` fragment.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<GenerateResponse>> + Send>>;

/// Status reported for an `{"error": ...}` line sent after a 200 header.
const MID_STREAM_ERROR_STATUS: u16 = 500;

/// One NDJSON line: either a fragment or a server-side failure.
#[derive(Deserialize)]
#[serde(untagged)]
enum StreamLine {
    Failure { error: String },
    Fragment(GenerateResponse),
}

/// Incremental line splitter for NDJSON bodies.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line completed by it.
    ///
    /// An `{"error": ...}` line becomes `Err(Error::Server)`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<GenerateResponse>> {
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(fragment) = self.parse_line(&line) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    /// Parse whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<Result<GenerateResponse>> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Lines dropped because they were not valid JSON.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn parse_line(&mut self, line: &[u8]) -> Option<Result<GenerateResponse>> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<StreamLine>(line) {
            Ok(StreamLine::Fragment(fragment)) => {
                trace!(len = fragment.response.len(), done = fragment.done, "Stream fragment");
                Some(Ok(fragment))
            }
            Ok(StreamLine::Failure { error }) => {
                warn!(error = %error, "Server reported an error mid-stream");
                Some(Err(Error::Server {
                    status: MID_STREAM_ERROR_STATUS,
                    message: error,
                }))
            }
            Err(e) => {
                self.skipped += 1;
                warn!(error = %e, line_len = line.len(), "Skipping malformed stream line");
                None
            }
        }
    }
}

struct StreamState<S> {
    inner: Pin<Box<S>>,
    decoder: NdjsonDecoder,
    ready: VecDeque<Result<GenerateResponse>>,
    finished: bool,
}

/// Turn a byte stream into a stream of generate fragments.
///
/// The stream ends after the first `done: true` fragment, at the end of the
/// body, or after the first error (transport or reported by the server).
pub fn parse_ndjson_stream<S, E>(stream: S) -> GenerationStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = StreamState {
        inner: Box::pin(stream),
        decoder: NdjsonDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                if matches!(&item, Ok(fragment) if fragment.done) || item.is_err() {
                    state.ready.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    state
                        .ready
                        .extend(state.decoder.push(&bytes));
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.ready.push_back(Err(e.into()));
                }
                None => {
                    state.finished = true;
                    state.ready.extend(state.decoder.finish());
                }
            }
        }
    }))
}

/// Drain a stream into one response: fragments concatenated, timing taken
/// from the final fragment.
pub async fn collect_stream(mut stream: GenerationStream) -> Result<GenerateResponse> {
    let mut text = String::new();
    let mut last: Option<GenerateResponse> = None;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        text.push_str(&fragment.response);
        last = Some(fragment);
    }
    let mut response = last.ok_or_else(|| {
        Error::Serialization("stream ended without any fragment".to_string())
    })?;
    response.response = text;
    Ok(response)
}
