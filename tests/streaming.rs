//! Integration tests for streamed rendering.

use pretty_assertions::assert_eq;

use termchat::render::blocks;
use termchat::render::{plain_text, Segment, StreamRenderer, Style, TerminalSink};
use termchat::ui::theme;

const FIXTURES: &[&str] = &[
    "# Title\n\nHello **world**",
    "Intro with `code` and [a link](https://example.com).\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n\nAfter the code.\n",
    "- one\n- two\n  - nested\n\n> quoted *text*\n\n---\n\n1. first\n2. second\n",
    "<think>\n\nplanning the answer\n\n</think>\n\nThe answer is **42**.",
    "Ünïcödé ✓ text\n\n## Second\n\nend",
    "<think>\nreasoning\n</think>\nThe answer.\n\nMore after.",
];

fn render(chunks: &[&str]) -> Vec<Segment> {
    let mut renderer = StreamRenderer::new(Vec::new());
    for chunk in chunks {
        renderer.feed(chunk);
    }
    renderer.finish();
    renderer.into_sink()
}

#[test]
fn test_chunking_invariance_two_chunks() {
    for fixture in FIXTURES {
        let whole = render(&[fixture]);
        for split in (1..fixture.len()).filter(|&i| fixture.is_char_boundary(i)) {
            let (head, tail) = fixture.split_at(split);
            assert_eq!(render(&[head, tail]), whole, "split at {split} of {fixture:?}");
        }
    }
}

#[test]
fn test_chunking_invariance_char_by_char() {
    for fixture in FIXTURES {
        let chars: Vec<String> = fixture.chars().map(String::from).collect();
        let chunks: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(render(&chunks), render(&[fixture]), "{fixture:?}");
    }
}

#[test]
fn test_commitment_reaches_block_total() {
    for fixture in FIXTURES {
        let mut renderer = StreamRenderer::new(Vec::new());
        let mut last = 0;
        for c in fixture.chars() {
            renderer.feed(c.encode_utf8(&mut [0; 4]));
            assert!(renderer.committed_blocks() >= last);
            last = renderer.committed_blocks();
        }
        renderer.finish();
        assert_eq!(renderer.committed_blocks(), blocks::parse(fixture).len());
    }
}

#[test]
fn test_text_round_trip() {
    let cases = [
        ("Hello *there* `code`", "Hello there code\n\n"),
        ("## Heading", "Heading\n\n"),
        ("```\nx = 1\n```", "---\nx = 1\n---\n\n"),
        ("- a\n- b", "- a\n- b\n\n"),
        ("> said", "> said\n\n"),
        ("see [docs](https://x.dev)", "see docs\n\n"),
    ];
    for (source, expected) in cases {
        assert_eq!(plain_text(&render(&[source])), expected, "{source:?}");
    }
}

#[test]
fn test_split_heading_scenario() {
    let whole = render(&["# Title\n\nHello **world**"]);
    let split = render(&["# Ti", "tle\n\nHello **wor", "ld**"]);
    assert_eq!(plain_text(&split), plain_text(&whole));
    assert_eq!(plain_text(&split), "Title\n\nHello world\n\n");
}

#[test]
fn test_unregistered_language_fence() {
    let segments = render(&["```not-a-language\nprint(1)\n```"]);
    let body: Vec<&Segment> = segments
        .iter()
        .filter(|s| s.style == theme::CODE_DEFAULT)
        .collect();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].text, "print(1)");
    assert_eq!(segments[0].style, theme::DELIMITER);
    assert!(segments.iter().rev().any(|s| s.text == "---\n" && s.style == theme::DELIMITER));
}

#[test]
fn test_thinking_section_styles_only_delimited_text() {
    let segments = render(&["Before.\n\n<think>\n\nhidden\n\n</think>\n\nAfter."]);
    let thinking: Vec<&str> = segments
        .iter()
        .filter(|s| s.style == theme::THINKING)
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect();
    assert_eq!(thinking, vec!["<think>", "hidden", "</think>"]);

    for word in ["Before.", "After."] {
        let style = segments.iter().find(|s| s.text == word).map(|s| s.style);
        assert_eq!(style, Some(Style::PLAIN), "{word}");
    }
}

#[test]
fn test_thinking_closed_without_blank_line() {
    for source in [
        "<think>\nreasoning\n</think>\nThe answer.",
        "<think>\n\nr\n\n</think>\nThe answer.",
    ] {
        let mut renderer = StreamRenderer::new(Vec::new());
        for chunk in source.split_inclusive('\n') {
            renderer.feed(chunk);
        }
        renderer.feed("\n\nNext paragraph.");
        renderer.finish();
        let segments = renderer.into_sink();
        for text in ["The answer.", "Next paragraph."] {
            let style = segments.iter().find(|s| s.text.contains(text)).map(|s| s.style);
            assert_eq!(style, Some(Style::PLAIN), "{text} in {source:?}");
        }
    }
}

#[test]
fn test_inline_thinking_scenario() {
    let segments = render(&["<think>reasoning</think>answer"]);
    let reasoning = segments.iter().find(|s| s.text == "reasoning").map(|s| s.style);
    let answer = segments.iter().find(|s| s.text == "answer").map(|s| s.style);
    assert_eq!(reasoning, Some(theme::THINKING));
    assert_eq!(answer, Some(Style::PLAIN));
}

#[test]
fn test_terminal_output_without_decorations_is_plain_text() {
    let source = "# Title\n\nsome **bold** and a [link](https://x.dev)\n";
    let mut renderer = StreamRenderer::new(TerminalSink::new(Vec::new(), false));
    for chunk in source.split_inclusive(' ') {
        renderer.feed(chunk);
    }
    renderer.finish();
    let bytes = renderer.into_sink().into_inner();
    assert_eq!(
        String::from_utf8_lossy(&bytes),
        "Title\n\nsome bold and a link\n\n"
    );
}
