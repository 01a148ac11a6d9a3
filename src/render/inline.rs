//! Inline and block rendering into styled segments.
//!
//! The resolver carries the session's "thinking" flag by reference so a
//! thinking section can open in one block and close several blocks later.

use super::blocks::{inlines_text, Block, Inline};
use super::code;
use super::segment::{Decoration, Segment, Style};
use crate::ui::theme;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

pub struct Resolver<'s> {
    thinking: &'s mut bool,
    out: Vec<Segment>,
}

impl<'s> Resolver<'s> {
    pub fn new(thinking: &'s mut bool) -> Self {
        Self { thinking, out: Vec::new() }
    }

    /// Renders one top-level block and returns its segments.
    pub fn render_block(mut self, block: &Block) -> Vec<Segment> {
        self.block(block, 0);
        self.out
    }

    fn block(&mut self, block: &Block, depth: usize) {
        match block {
            Block::Paragraph(inlines) => {
                self.inlines(inlines, Style::PLAIN);
                self.push(if depth == 0 { "\n\n" } else { "\n" }, Style::PLAIN);
            }
            Block::Heading { content, .. } => {
                let title = inlines_text(content);
                self.push(title.trim_end(), self.styled(theme::HEADING));
                self.push("\n\n", Style::PLAIN);
            }
            Block::FencedCode { language, body } => {
                let opening = match language {
                    Some(lang) => format!("--- {lang}\n"),
                    None => "---\n".to_string(),
                };
                self.push(&opening, self.styled(theme::DELIMITER));
                for segment in code::colorize(trim_code(body), language.as_deref()) {
                    self.push(&segment.text, self.styled(segment.style));
                }
                self.push("---\n", self.styled(theme::DELIMITER));
                self.push("\n", Style::PLAIN);
            }
            Block::IndentedCode { body } => {
                self.push("---\n", self.styled(theme::DELIMITER));
                self.push(&format!("{}\n", trim_code(body)), self.styled(theme::INDENTED_CODE));
                self.push("---\n", self.styled(theme::DELIMITER));
                self.push("\n", Style::PLAIN);
            }
            Block::HorizontalRule => self.push("---\n\n", self.styled(theme::RULE)),
            Block::List { ordered, start, items } => {
                let indent = "  ".repeat(depth);
                for (n, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{indent}{}. ", *start + n as u64)
                    } else {
                        format!("{indent}- ")
                    };
                    self.push(&marker, self.styled(Style::PLAIN));
                    self.block(item, depth + 1);
                }
                if depth == 0 {
                    self.push("\n", Style::PLAIN);
                }
            }
            Block::ListItem(children) => {
                for child in children {
                    self.block(child, depth);
                }
            }
            Block::BlockQuote(children) => {
                for child in children {
                    self.push("> ", self.styled(theme::QUOTE_PREFIX));
                    self.block(child, depth + 1);
                }
                if depth == 0 {
                    self.push("\n", Style::PLAIN);
                }
            }
            Block::RawBlock(body) => {
                self.text(body, Style::PLAIN);
                if depth == 0 {
                    self.push("\n", Style::PLAIN);
                }
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline], inherited: Style) {
        for inline in inlines {
            self.inline(inline, inherited);
        }
    }

    fn inline(&mut self, inline: &Inline, inherited: Style) {
        match inline {
            Inline::Text(text) => self.text(text, inherited),
            Inline::Strong(children) => self.inlines(children, inherited.with(Decoration::BOLD)),
            Inline::Emphasis(children) => {
                self.inlines(children, inherited.with(Decoration::ITALIC))
            }
            Inline::CodeSpan(code) => self.push(code, self.styled(theme::CODE_SPAN)),
            Inline::Link { target, label } | Inline::Image { target, alt: label } => {
                let label = inlines_text(label);
                self.out.push(Segment::link(label, self.styled(theme::LINK), target.as_str()));
            }
            Inline::SoftBreak => self.push("\n", Style::PLAIN),
            Inline::HardBreak => self.push("\n\n", Style::PLAIN),
        }
    }

    /// Styles a text node, splitting it at every sentinel. Sentinels are
    /// styled as thinking and toggle the flag for the text that follows.
    fn text(&mut self, text: &str, style: Style) {
        let mut rest = text;
        while let Some((at, sentinel)) = next_sentinel(rest) {
            self.push(&rest[..at], self.styled(style));
            *self.thinking = sentinel == THINK_OPEN;
            self.push(sentinel, theme::THINKING);
            rest = &rest[at + sentinel.len()..];
        }
        self.push(rest, self.styled(style));
    }

    fn styled(&self, style: Style) -> Style {
        if *self.thinking {
            theme::THINKING
        } else {
            style
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.out.push(Segment::new(text, style));
        }
    }
}

/// Position of the first thinking sentinel in `text`, if any.
fn next_sentinel(text: &str) -> Option<(usize, &'static str)> {
    [THINK_OPEN, THINK_CLOSE]
        .into_iter()
        .filter_map(|sentinel| text.find(sentinel).map(|at| (at, sentinel)))
        .min_by_key(|(at, _)| *at)
}

/// Drops blank lines around a code body.
fn trim_code(body: &str) -> &str {
    body.trim_end().trim_start_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::blocks::parse;
    use crate::render::segment::plain_text;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> (Vec<Segment>, bool) {
        let mut thinking = false;
        let mut out = Vec::new();
        for block in parse(source) {
            out.extend(Resolver::new(&mut thinking).render_block(&block));
        }
        (out, thinking)
    }

    #[test]
    fn test_heading_and_strong() {
        let (segments, _) = render("# Title\n\nHello **world**");
        assert_eq!(
            segments,
            vec![
                Segment::new("Title", theme::HEADING),
                Segment::plain("\n\n"),
                Segment::plain("Hello "),
                Segment::new("world", Style::decorated(Decoration::BOLD)),
                Segment::plain("\n\n"),
            ]
        );
    }

    #[test]
    fn test_nested_emphasis_combines() {
        let (segments, _) = render("***both***");
        let both = segments.iter().find(|s| s.text == "both").map(|s| s.style);
        assert_eq!(
            both,
            Some(Style::decorated(Decoration::BOLD | Decoration::ITALIC))
        );
    }

    #[test]
    fn test_code_span_and_link() {
        let (segments, _) = render("run `ls` or see [docs](https://x.dev)");
        assert!(segments.contains(&Segment::new("ls", theme::CODE_SPAN)));
        assert!(segments.contains(&Segment::link("docs", theme::LINK, "https://x.dev")));
    }

    #[test]
    fn test_image_renders_as_link() {
        let (segments, _) = render("![a cat](cat.png)");
        assert_eq!(segments[0], Segment::link("a cat", theme::LINK, "cat.png"));
    }

    #[test]
    fn test_breaks() {
        let (segments, _) = render("one\ntwo  \nthree");
        assert_eq!(plain_text(&segments), "one\ntwo\n\nthree\n\n");
    }

    #[test]
    fn test_fenced_code_unknown_language() {
        let (segments, _) = render("```brainfudge\nprint(1)\n```\n");
        assert_eq!(
            segments,
            vec![
                Segment::new("--- brainfudge\n", theme::DELIMITER),
                Segment::new("print(1)", theme::CODE_DEFAULT),
                Segment::plain("\n"),
                Segment::new("---\n", theme::DELIMITER),
                Segment::plain("\n"),
            ]
        );
    }

    #[test]
    fn test_indented_code() {
        let (segments, _) = render("    let x = 1;\n");
        assert_eq!(plain_text(&segments), "---\nlet x = 1;\n---\n\n");
        assert_eq!(segments[1].style, theme::INDENTED_CODE);
    }

    #[test]
    fn test_lists_and_quotes() {
        let (segments, _) = render("- a\n- b\n  1. c\n\n> q\n");
        assert_eq!(plain_text(&segments), "- a\n- b\n  1. c\n\n> q\n\n");
    }

    #[test]
    fn test_rule_and_raw() {
        let (segments, _) = render("---\n\n<div>\nx\n</div>\n");
        assert_eq!(plain_text(&segments), "---\n\n<div>\nx\n</div>\n\n");
        assert_eq!(segments[0].style, theme::RULE);
        assert_eq!(segments[1].style, Style::PLAIN);
    }

    #[test]
    fn test_thinking_inline() {
        let (segments, thinking) = render("<think>reasoning</think>answer");
        assert!(!thinking);
        assert_eq!(
            segments,
            vec![
                Segment::new("<think>", theme::THINKING),
                Segment::new("reasoning", theme::THINKING),
                Segment::new("</think>", theme::THINKING),
                Segment::plain("answer"),
                Segment::plain("\n\n"),
            ]
        );
    }

    #[test]
    fn test_thinking_spans_blocks() {
        let (segments, thinking) =
            render("<think>\n\nfirst **bold**\n\nsecond\n\n</think>\n\nanswer");
        assert!(!thinking);
        let bold = segments.iter().find(|s| s.text == "bold").map(|s| s.style);
        assert_eq!(bold, Some(theme::THINKING));
        let answer = segments.iter().find(|s| s.text == "answer").map(|s| s.style);
        assert_eq!(answer, Some(Style::PLAIN));
    }

    fn style_of<'a>(segments: &'a [Segment], needle: &str) -> Option<&'a Style> {
        segments.iter().find(|s| s.text.contains(needle)).map(|s| &s.style)
    }

    #[test]
    fn test_thinking_closes_inside_one_html_block() {
        let (segments, thinking) = render("<think>\nreasoning\n</think>\nThe answer.");
        assert!(!thinking);
        assert_eq!(style_of(&segments, "reasoning"), Some(&theme::THINKING));
        assert_eq!(style_of(&segments, "</think>"), Some(&theme::THINKING));
        assert_eq!(style_of(&segments, "The answer."), Some(&Style::PLAIN));
        assert!(plain_text(&segments).starts_with("<think>\nreasoning\n</think>\nThe answer."));
    }

    #[test]
    fn test_thinking_closes_at_start_of_html_block() {
        let (segments, thinking) = render("<think>\n\nr\n\n</think>\nThe answer.");
        assert!(!thinking);
        assert_eq!(style_of(&segments, "r"), Some(&theme::THINKING));
        assert_eq!(style_of(&segments, "The answer."), Some(&Style::PLAIN));
    }

    #[test]
    fn test_thinking_styles_code_and_markers() {
        let (segments, thinking) =
            render("<think>\n\n```python\nimport os\n```\n\n- step\n\n</think>\n\ndone");
        assert!(!thinking);
        let before_close: Vec<&Segment> = segments
            .iter()
            .take_while(|s| s.text != "</think>")
            .filter(|s| !s.text.trim().is_empty())
            .collect();
        assert!(before_close.iter().any(|s| s.text.contains("import")));
        assert!(before_close.iter().all(|s| s.style == theme::THINKING), "{before_close:?}");
        assert_eq!(style_of(&segments, "done"), Some(&Style::PLAIN));
    }

    #[test]
    fn test_unclosed_thinking_stays_open() {
        let (segments, thinking) = render("<think>still going\n\nmore");
        assert!(thinking);
        let more = segments.iter().find(|s| s.text == "more").map(|s| s.style);
        assert_eq!(more, Some(theme::THINKING));
    }
}
