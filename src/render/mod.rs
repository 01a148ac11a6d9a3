//! Incremental rendering of streamed model output.

pub mod blocks;
pub mod code;
pub mod inline;
pub mod rules;
pub mod segment;
pub mod sink;
pub mod stream;
pub mod tokens;

pub use blocks::{Block, Inline};
pub use segment::{plain_text, Decoration, Segment, Style};
pub use sink::{SegmentSink, TerminalSink};
pub use stream::StreamRenderer;
