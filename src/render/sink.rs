//! Destinations for rendered segments.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor};

use super::segment::{Decoration, Segment};

/// Receives segments in the order they are committed.
pub trait SegmentSink {
    fn write_segment(&mut self, segment: &Segment) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects segments in memory.
impl SegmentSink for Vec<Segment> {
    fn write_segment(&mut self, segment: &Segment) -> io::Result<()> {
        self.push(segment.clone());
        Ok(())
    }
}

/// Writes segments to a terminal using crossterm styling commands.
pub struct TerminalSink<W: Write> {
    out: W,
    decorations: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(decorations: bool) -> Self {
        Self::new(io::stdout(), decorations)
    }
}

impl<W: Write> TerminalSink<W> {
    /// With `decorations` off, only the text is written.
    pub fn new(out: W, decorations: bool) -> Self {
        Self { out, decorations }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SegmentSink for TerminalSink<W> {
    fn write_segment(&mut self, segment: &Segment) -> io::Result<()> {
        if !self.decorations || (segment.style.is_plain() && segment.link.is_none()) {
            return self.out.write_all(segment.text.as_bytes());
        }

        if let Some(fg) = segment.style.fg {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        for (flag, attribute) in [
            (Decoration::BOLD, Attribute::Bold),
            (Decoration::ITALIC, Attribute::Italic),
            (Decoration::UNDERLINE, Attribute::Underlined),
        ] {
            if segment.style.decoration.contains(flag) {
                queue!(self.out, SetAttribute(attribute))?;
            }
        }
        match &segment.link {
            // OSC 8 hyperlink
            Some(target) => write!(self.out, "\x1b]8;;{target}\x1b\\{}\x1b]8;;\x1b\\", segment.text)?,
            None => queue!(self.out, Print(&segment.text))?,
        }
        queue!(self.out, ResetColor, SetAttribute(Attribute::Reset))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
