//! Streaming block segmenter.
//!
//! Every chunk is appended to the buffer and the whole buffer is parsed
//! again. All blocks except the newest are final and get rendered; the newest
//! may still change shape as more text arrives, so it is held back until the
//! next block starts or the stream finishes.

use super::blocks::{self, Block};
use super::inline::Resolver;
use super::sink::SegmentSink;

/// Rendering session for one assistant response.
pub struct StreamRenderer<S: SegmentSink> {
    buffer: String,
    committed: usize,
    thinking: bool,
    finished: bool,
    sink: S,
}

impl<S: SegmentSink> StreamRenderer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            buffer: String::new(),
            committed: 0,
            thinking: false,
            finished: false,
            sink,
        }
    }

    /// Appends a chunk and renders every block that can no longer change.
    pub fn feed(&mut self, chunk: &str) {
        if self.finished {
            tracing::warn!("chunk received after finish; ignored");
            return;
        }
        if chunk.is_empty() {
            return;
        }
        self.buffer.push_str(chunk);
        let blocks = blocks::parse(&self.buffer);
        self.commit(&blocks, false);
    }

    /// Renders whatever is left, including the held-back last block.
    /// Calling it again is a no-op.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let blocks = blocks::parse(&self.buffer);
        self.commit(&blocks, true);
        self.thinking = false;
        tracing::debug!(blocks = self.committed, bytes = self.buffer.len(), "response finished");
    }

    fn commit(&mut self, blocks: &[Block], include_last: bool) {
        let ready = if include_last {
            blocks.len()
        } else {
            blocks.len().saturating_sub(1)
        };

        if ready < self.committed {
            tracing::warn!(
                parsed = blocks.len(),
                committed = self.committed,
                "reparse produced fewer blocks than already rendered; keeping watermark"
            );
            return;
        }

        for block in &blocks[self.committed..ready] {
            tracing::debug!(index = self.committed, kind = block.kind(), "committing block");
            let segments = Resolver::new(&mut self.thinking).render_block(block);
            for segment in &segments {
                if let Err(err) = self.sink.write_segment(segment) {
                    tracing::warn!(%err, "failed to write segment");
                }
            }
            self.committed += 1;
        }

        if let Err(err) = self.sink.flush() {
            tracing::warn!(%err, "failed to flush output");
        }
    }

    /// Number of blocks rendered so far.
    pub fn committed_blocks(&self) -> usize {
        self.committed
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
