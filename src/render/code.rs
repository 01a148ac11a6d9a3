//! Code block colorizing.

use super::rules;
use super::segment::Segment;
use super::tokens;
use crate::ui::theme;

/// Colorizes a code body, one segment per token, followed by a line break.
///
/// Missing or unregistered languages produce the whole body as a single
/// default-styled segment.
pub fn colorize(body: &str, language: Option<&str>) -> Vec<Segment> {
    let tokens = language
        .filter(|lang| !lang.trim().is_empty())
        .and_then(|lang| tokens::tokenize(body, lang));

    let mut segments: Vec<Segment> = match tokens {
        Some(tokens) => tokens
            .into_iter()
            .map(|token| Segment::new(token.text, rules::resolve(token.tags)))
            .collect(),
        None => {
            if let Some(lang) = language {
                tracing::debug!(language = lang, "no grammar; code passed through");
            }
            vec![Segment::new(body, theme::CODE_DEFAULT)]
        }
    };
    segments.push(Segment::plain("\n"));
    segments
}
