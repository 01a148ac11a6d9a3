//! Response highlighters: how streamed assistant text reaches the terminal.

use crate::config::HighlightMode;
use crate::render::{Segment, SegmentSink, StreamRenderer, TerminalSink};

/// Consumes the text deltas of one assistant response.
pub trait ResponseHighlighter {
    fn write(&mut self, chunk: &str);

    /// Flushes anything still pending. Must be called once per response,
    /// including when the stream was cancelled or failed.
    fn finish(&mut self);
}

impl<S: SegmentSink> ResponseHighlighter for StreamRenderer<S> {
    fn write(&mut self, chunk: &str) {
        self.feed(chunk);
    }

    fn finish(&mut self) {
        StreamRenderer::finish(self);
    }
}

/// Passes chunks through as undecorated text.
pub struct PlainHighlighter<S: SegmentSink> {
    sink: S,
}

impl<S: SegmentSink> PlainHighlighter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: SegmentSink> ResponseHighlighter for PlainHighlighter<S> {
    fn write(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if let Err(err) = self
            .sink
            .write_segment(&Segment::plain(chunk))
            .and_then(|_| self.sink.flush())
        {
            tracing::warn!(%err, "failed to write chunk");
        }
    }

    fn finish(&mut self) {}
}

/// Builds the stdout highlighter for a model's highlighting mode.
pub fn for_mode(mode: HighlightMode, decorations: bool) -> Box<dyn ResponseHighlighter> {
    let sink = TerminalSink::stdout(decorations);
    match mode {
        HighlightMode::Markdown => Box::new(StreamRenderer::new(sink)),
        HighlightMode::None => Box::new(PlainHighlighter::new(sink)),
    }
}
