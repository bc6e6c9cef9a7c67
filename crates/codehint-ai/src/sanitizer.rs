//! Cleaning of streamed model output.
//!
//! Models in the code-hint family reason out loud inside a
//! `<think>...</think>` block before answering. The sanitizer removes those
//! blocks from the raw fragment stream while passing visible text through
//! as soon as it arrives.
//!
//! Markers may be split across fragments (`"<thi"`, `"nk>"`). Any tail of
//! a fragment that could still become a marker is held back and scanned
//! together with the next fragment, so a split marker is recognised the
//! same as an unsplit one.
//!
//! Whitespace following a closing marker is dropped when the visible text
//! before the block already ends in whitespace, so removing a block never
//! leaves a doubled separator behind.

use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::config::{THINK_END, THINK_START};
use crate::error::EngineError;

/// Incremental filter over raw output fragments.
#[derive(Debug, Clone)]
pub struct HintStreamSanitizer {
    start: String,
    end: String,
    in_reasoning: bool,
    /// Set once visible content has been produced.
    started: bool,
    /// Whitespace right after a closing marker belongs to the block.
    absorb_whitespace: bool,
    /// Last visible character was whitespace, or nothing is visible yet.
    trailing_space: bool,
    /// Unscanned tail that is a prefix of the marker we're looking for.
    pending: String,
}

/// Sink notified with each clean fragment.
pub type FragmentSink<'a> = &'a mut (dyn FnMut(&str) + Send);

impl HintStreamSanitizer {
    pub fn new() -> Self {
        Self::with_markers(THINK_START, THINK_END)
    }

    /// Use a custom marker pair. Empty markers never match.
    pub fn with_markers(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            in_reasoning: false,
            started: false,
            absorb_whitespace: false,
            trailing_space: true,
            pending: String::new(),
        }
    }

    /// Whether the scan is currently inside a reasoning block.
    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    /// Feed one raw fragment, returning the visible text it produced.
    ///
    /// The result may be empty.
    pub fn push(&mut self, raw: &str) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.push_str(raw);

        let mut clean = String::new();
        let mut i = 0;
        while i < buf.len() {
            let rest = &buf[i..];

            if !self.in_reasoning && !self.start.is_empty() && rest.starts_with(&self.start) {
                self.in_reasoning = true;
                i += self.start.len();
                continue;
            }
            if self.in_reasoning && !self.end.is_empty() && rest.starts_with(&self.end) {
                self.in_reasoning = false;
                self.absorb_whitespace = self.trailing_space;
                i += self.end.len();
                continue;
            }

            let marker = if self.in_reasoning { &self.end } else { &self.start };
            if rest.len() < marker.len() && marker.starts_with(rest) {
                self.pending = rest.to_string();
                break;
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            if !self.in_reasoning {
                if self.absorb_whitespace && ch.is_whitespace() {
                    // swallowed with the block
                } else {
                    self.absorb_whitespace = false;
                    self.trailing_space = ch.is_whitespace();
                    clean.push(ch);
                }
            }
            i += ch.len_utf8();
        }

        self.suppress_leading_newlines(clean)
    }

    /// End of input: flush a held-back tail.
    ///
    /// A partial opening marker that never completed is ordinary text. A
    /// partial closing marker is still inside the block and is dropped.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.pending);
        if self.in_reasoning || tail.is_empty() {
            return String::new();
        }
        self.absorb_whitespace = false;
        self.suppress_leading_newlines(tail)
    }

    /// Strip newlines at the very start of the response, once.
    fn suppress_leading_newlines(&mut self, clean: String) -> String {
        if self.started || clean.is_empty() {
            return clean;
        }
        let trimmed = clean.trim_start_matches('\n');
        if trimmed.is_empty() {
            return String::new();
        }
        self.started = true;
        trimmed.to_string()
    }

    /// Drain a raw fragment stream into the final hint.
    ///
    /// Each clean fragment is appended to the hint and, when a sink is
    /// given, handed to it before the next raw fragment is pulled, followed
    /// by a yield to the scheduler so a UI can repaint. A failing stream
    /// aborts with its error and no partial hint.
    pub async fn run<S>(
        mut self,
        mut raw: S,
        mut sink: Option<FragmentSink<'_>>,
    ) -> Result<String, EngineError>
    where
        S: Stream<Item = Result<String, EngineError>> + Unpin,
    {
        let mut hint = String::new();
        let mut fragments = 0usize;

        while let Some(fragment) = raw.next().await {
            let fragment = fragment?;
            fragments += 1;
            let clean = self.push(&fragment);
            emit(clean, &mut hint, &mut sink).await;
        }
        let tail = self.finish();
        emit(tail, &mut hint, &mut sink).await;

        debug!("Stream ended after {} fragments ({} chars)", fragments, hint.len());
        Ok(hint.trim().to_string())
    }
}

impl Default for HintStreamSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

async fn emit(clean: String, hint: &mut String, sink: &mut Option<FragmentSink<'_>>) {
    if clean.is_empty() {
        return;
    }
    hint.push_str(&clean);
    if let Some(sink) = sink {
        (*sink)(&clean);
        tokio::task::yield_now().await;
    }
}
