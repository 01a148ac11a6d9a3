//! Block and inline document model, built from pulldown-cmark events.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// A top-level structural unit of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    FencedCode { language: Option<String>, body: String },
    IndentedCode { body: String },
    List { ordered: bool, start: u64, items: Vec<Block> },
    ListItem(Vec<Block>),
    BlockQuote(Vec<Block>),
    HorizontalRule,
    RawBlock(String),
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading { .. } => "heading",
            Block::FencedCode { .. } => "fenced-code",
            Block::IndentedCode { .. } => "indented-code",
            Block::List { .. } => "list",
            Block::ListItem(_) => "list-item",
            Block::BlockQuote(_) => "block-quote",
            Block::HorizontalRule => "rule",
            Block::RawBlock(_) => "raw",
        }
    }
}

/// Content-level node inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    CodeSpan(String),
    Link { target: String, label: Vec<Inline> },
    SoftBreak,
    HardBreak,
    Image { target: String, alt: Vec<Inline> },
}

impl Inline {
    /// Visible text of this node and its children.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::CodeSpan(text) => out.push_str(text),
            Inline::Strong(children) | Inline::Emphasis(children) => {
                children.iter().for_each(|c| c.collect_text(out))
            }
            Inline::Link { label: children, .. } | Inline::Image { alt: children, .. } => {
                children.iter().for_each(|c| c.collect_text(out))
            }
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
        }
    }
}

/// Text of a sequence of inlines, as used for headings and link labels.
pub fn inlines_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

/// Parses `source` into its top-level blocks.
pub fn parse(source: &str) -> Vec<Block> {
    let mut events = Parser::new_ext(source, Options::empty());
    parse_blocks(&mut events)
}

type Events<'a> = Parser<'a>;

/// Reads blocks until the end of the enclosing container (or of input).
/// Inline content that appears directly inside a container, as in tight
/// list items, is gathered into an implicit paragraph.
fn parse_blocks(events: &mut Events<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut loose = InlineBuf::default();

    while let Some(event) = events.next() {
        let block = match event {
            Event::End(_) => break,
            Event::Start(Tag::Paragraph) => Block::Paragraph(parse_inlines(events)),
            Event::Start(Tag::Heading { level, .. }) => Block::Heading {
                level: heading_level(level),
                content: parse_inlines(events),
            },
            Event::Start(Tag::CodeBlock(kind)) => {
                let body = collect_text(events);
                match kind {
                    CodeBlockKind::Fenced(info) => Block::FencedCode {
                        language: info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .find(|s| !s.is_empty())
                            .map(str::to_string),
                        body,
                    },
                    CodeBlockKind::Indented => Block::IndentedCode { body },
                }
            }
            Event::Start(Tag::List(start)) => Block::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
                items: parse_blocks(events),
            },
            Event::Start(Tag::Item) => Block::ListItem(parse_blocks(events)),
            Event::Start(Tag::BlockQuote(_)) => Block::BlockQuote(parse_blocks(events)),
            Event::Start(Tag::HtmlBlock) => Block::RawBlock(collect_text(events)),
            Event::Rule => Block::HorizontalRule,
            other => {
                parse_inline(other, events, &mut loose);
                continue;
            }
        };
        if let Some(paragraph) = loose.take_paragraph() {
            blocks.push(paragraph);
        }
        blocks.push(block);
    }

    if let Some(paragraph) = loose.take_paragraph() {
        blocks.push(paragraph);
    }
    blocks
}

/// Reads inline nodes until the end of the enclosing tag.
fn parse_inlines(events: &mut Events<'_>) -> Vec<Inline> {
    let mut buf = InlineBuf::default();
    while let Some(event) = events.next() {
        if let Event::End(_) = event {
            break;
        }
        parse_inline(event, events, &mut buf);
    }
    buf.nodes
}

fn parse_inline(event: Event<'_>, events: &mut Events<'_>, buf: &mut InlineBuf) {
    let inline = match event {
        Event::Text(text) => return buf.push_text(&text),
        // Raw HTML stays a node of its own so sentinels like `<think>` are
        // seen at the start of a text node.
        Event::Html(html) | Event::InlineHtml(html) => Inline::Text(html.into_string()),
        Event::Code(code) => Inline::CodeSpan(code.into_string()),
        Event::SoftBreak => Inline::SoftBreak,
        Event::HardBreak => Inline::HardBreak,
        Event::Start(Tag::Strong) => Inline::Strong(parse_inlines(events)),
        Event::Start(Tag::Emphasis) => Inline::Emphasis(parse_inlines(events)),
        Event::Start(Tag::Link { dest_url, .. }) => Inline::Link {
            target: dest_url.into_string(),
            label: parse_inlines(events),
        },
        Event::Start(Tag::Image { dest_url, .. }) => Inline::Image {
            target: dest_url.into_string(),
            alt: parse_inlines(events),
        },
        // Constructs outside the supported set keep their text.
        Event::Start(_) => return buf.push_text(&collect_text(events)),
        _ => return,
    };
    buf.push(inline);
}

/// Concatenates every text-bearing event up to the end of the current tag.
fn collect_text(events: &mut Events<'_>) -> String {
    let mut text = String::new();
    let mut depth = 0usize;
    for event in events.by_ref() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                text.push_str(&t)
            }
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Inline nodes under construction. Adjacent plain text events are merged
/// so that a run of text is one node.
#[derive(Default)]
struct InlineBuf {
    nodes: Vec<Inline>,
    open_text: bool,
}

impl InlineBuf {
    fn push(&mut self, inline: Inline) {
        self.nodes.push(inline);
        self.open_text = false;
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.nodes.last_mut() {
            Some(Inline::Text(last)) if self.open_text => last.push_str(text),
            _ => {
                self.nodes.push(Inline::Text(text.to_string()));
                self.open_text = true;
            }
        }
    }

    fn take_paragraph(&mut self) -> Option<Block> {
        self.open_text = false;
        if self.nodes.is_empty() {
            None
        } else {
            Some(Block::Paragraph(std::mem::take(&mut self.nodes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_heading_and_paragraph() {
        let blocks = parse("# Title\n\nHello **world**");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, content: vec![text("Title")] },
                Block::Paragraph(vec![text("Hello "), Inline::Strong(vec![text("world")])]),
            ]
        );
    }

    #[test]
    fn test_fenced_and_indented_code() {
        let blocks = parse("```rust,ignore\nfn main() {}\n```\n\n    indented\n");
        assert_eq!(
            blocks,
            vec![
                Block::FencedCode {
                    language: Some("rust".into()),
                    body: "fn main() {}\n".into(),
                },
                Block::IndentedCode { body: "indented\n".into() },
            ]
        );

        let blocks = parse("```\nplain\n```");
        assert_eq!(blocks, vec![Block::FencedCode { language: None, body: "plain\n".into() }]);
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        let blocks = parse("- one\n- two *it*\n");
        assert_eq!(
            blocks,
            vec![Block::List {
                ordered: false,
                start: 1,
                items: vec![
                    Block::ListItem(vec![Block::Paragraph(vec![text("one")])]),
                    Block::ListItem(vec![Block::Paragraph(vec![
                        text("two "),
                        Inline::Emphasis(vec![text("it")]),
                    ])]),
                ],
            }]
        );
    }

    #[test]
    fn test_ordered_list_start() {
        let blocks = parse("3. a\n4. b\n");
        match &blocks[..] {
            [Block::List { ordered, start, items }] => {
                assert!(*ordered);
                assert_eq!(*start, 3);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected blocks: {other:?}"),
        }
    }

    #[test]
    fn test_quote_rule_and_html() {
        let blocks = parse("> quoted\n\n---\n\n<div>\nraw\n</div>\n");
        assert_eq!(
            blocks,
            vec![
                Block::BlockQuote(vec![Block::Paragraph(vec![text("quoted")])]),
                Block::HorizontalRule,
                Block::RawBlock("<div>\nraw\n</div>\n".into()),
            ]
        );
    }

    #[test]
    fn test_think_sentinels_stay_separate_nodes() {
        let blocks = parse("<think>reasoning</think>answer");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("<think>"),
                text("reasoning"),
                text("</think>"),
                text("answer"),
            ])]
        );
    }

    #[test]
    fn test_links_and_images() {
        let blocks = parse("see [the docs](https://example.com) ![alt](img.png)");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("see "),
                Inline::Link {
                    target: "https://example.com".into(),
                    label: vec![text("the docs")],
                },
                text(" "),
                Inline::Image { target: "img.png".into(), alt: vec![text("alt")] },
            ])]
        );
        assert_eq!(inlines_text(&[Inline::Strong(vec![text("a"), Inline::CodeSpan("b".into())])]), "ab");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }
}
