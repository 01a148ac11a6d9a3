//! Lexical token classification for code blocks.
//!
//! Grammars come from two-face's extended syntect bundle, keyed by language
//! name or file extension. Each syntect scope on the stack is mapped onto a small,
//! closed set of class tags that the style rule table understands.

use std::sync::OnceLock;

use bitflags::bitflags;
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

bitflags! {
    /// Semantic class tags attached to a token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassTags: u64 {
        const DOCTYPE = 1 << 0;
        const NAME = 1 << 1;
        const COMMENT = 1 << 2;
        const PROLOG = 1 << 3;
        const PROPERTY = 1 << 4;
        const NUMBER = 1 << 5;
        const CONSTANT = 1 << 6;
        const SYMBOL = 1 << 7;
        const INSERTED = 1 << 8;
        const UNIT = 1 << 9;
        const SELECTOR = 1 << 10;
        const ATTR_VALUE = 1 << 11;
        const STRING = 1 << 12;
        const INTERPOLATION_STRING = 1 << 13;
        const CHAR = 1 << 14;
        const BUILTIN = 1 << 15;
        const DELETED = 1 << 16;
        const OPERATOR = 1 << 17;
        const ENTITY = 1 << 18;
        const ATRULE = 1 << 19;
        const KEYWORD = 1 << 20;
        const BOOLEAN = 1 << 21;
        const MODULE = 1 << 22;
        const CONTROL_FLOW = 1 << 23;
        const FUNCTION = 1 << 24;
        const REGEX = 1 << 25;
        const IMPORTANT = 1 << 26;
        const CLASS_NAME = 1 << 27;
        const PARAMETER = 1 << 28;
        const ATTR_NAME = 1 << 29;
        const INTERPOLATION = 1 << 30;
        const VARIABLE = 1 << 31;
        const PUNCTUATION = 1 << 32;
        const TAG = 1 << 33;
    }
}

/// A slice of a code body with its class tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub tags: ClassTags,
}

/// Scope prefixes mapped to tags. For each scope on the stack the first
/// matching prefix wins, so more specific prefixes come first.
const SCOPE_TAGS: &[(&str, ClassTags)] = &[
    ("comment", ClassTags::COMMENT),
    ("meta.tag.sgml.doctype", ClassTags::DOCTYPE),
    ("meta.tag.preprocessor", ClassTags::PROLOG),
    ("meta.preprocessor", ClassTags::PROLOG),
    ("string.regexp", ClassTags::REGEX),
    ("string.interpolated", ClassTags::INTERPOLATION_STRING),
    ("string.unquoted.attribute-value", ClassTags::ATTR_VALUE),
    ("string", ClassTags::STRING),
    ("constant.numeric", ClassTags::NUMBER),
    ("constant.character.entity", ClassTags::ENTITY),
    ("constant.character", ClassTags::CHAR),
    ("constant.language", ClassTags::BOOLEAN),
    ("constant.other.symbol", ClassTags::SYMBOL),
    ("constant", ClassTags::CONSTANT),
    ("keyword.operator", ClassTags::OPERATOR),
    ("keyword.control.import", ClassTags::KEYWORD.union(ClassTags::MODULE)),
    ("keyword.other.import", ClassTags::KEYWORD.union(ClassTags::MODULE)),
    ("keyword.control.at-rule", ClassTags::ATRULE),
    ("keyword.other.important", ClassTags::IMPORTANT),
    ("keyword.other.unit", ClassTags::UNIT),
    ("keyword.control", ClassTags::KEYWORD.union(ClassTags::CONTROL_FLOW)),
    ("keyword", ClassTags::KEYWORD),
    ("storage", ClassTags::KEYWORD),
    ("entity.name.function", ClassTags::FUNCTION),
    ("support.function", ClassTags::FUNCTION),
    ("variable.function", ClassTags::FUNCTION),
    ("entity.name.class", ClassTags::CLASS_NAME),
    ("entity.name.struct", ClassTags::CLASS_NAME),
    ("entity.name.enum", ClassTags::CLASS_NAME),
    ("entity.name.type", ClassTags::CLASS_NAME),
    ("entity.name.trait", ClassTags::CLASS_NAME),
    ("entity.other.inherited-class", ClassTags::CLASS_NAME),
    ("support.class", ClassTags::CLASS_NAME),
    ("support.type.property-name", ClassTags::PROPERTY),
    ("support.type", ClassTags::CLASS_NAME),
    ("entity.name.tag", ClassTags::TAG),
    ("entity.other.attribute-name", ClassTags::ATTR_NAME),
    ("entity.name.constant", ClassTags::CONSTANT),
    ("entity.name", ClassTags::NAME),
    ("meta.selector", ClassTags::SELECTOR),
    ("meta.interpolation", ClassTags::INTERPOLATION),
    ("variable.parameter", ClassTags::PARAMETER),
    ("variable.language", ClassTags::KEYWORD),
    ("variable", ClassTags::VARIABLE),
    ("support.constant", ClassTags::BUILTIN),
    ("support", ClassTags::BUILTIN),
    ("markup.inserted", ClassTags::INSERTED),
    ("markup.deleted", ClassTags::DELETED),
    ("punctuation", ClassTags::PUNCTUATION),
];

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
}

/// Looks up a grammar by language name or extension (`python`, `rs`, `ts`).
pub fn find_grammar(language: &str) -> Option<&'static SyntaxReference> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    let set = syntax_set();

    // Aliases the bundle does not resolve on its own.
    let patched = match language {
        "csharp" | "c-sharp" => "c#",
        "golang" => "go",
        "python3" => "python",
        "shell" => "bash",
        _ => language,
    };

    let lower = patched.to_ascii_lowercase();
    set.find_syntax_by_token(patched)
        .or_else(|| set.find_syntax_by_token(&lower))
        .or_else(|| set.find_syntax_by_name(patched))
        .or_else(|| set.syntaxes().iter().find(|s| s.name.to_ascii_lowercase() == lower))
        .or_else(|| set.find_syntax_by_extension(language))
}

/// Whether a grammar is registered for `language`.
pub fn has_grammar(language: &str) -> bool {
    find_grammar(language).is_some()
}

/// Splits `body` into tokens using the grammar for `language`.
///
/// Returns `None` when no grammar is registered. Concatenating the returned
/// token texts always reproduces `body`; if the grammar engine fails midway
/// the rest of the body is emitted as one untagged token.
pub fn tokenize<'a>(body: &'a str, language: &str) -> Option<Vec<Token<'a>>> {
    let syntax = find_grammar(language)?;
    let set = syntax_set();
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut tokens = TokenList::new(body);
    let mut line_start = 0;

    for line in LinesWithEndings::from(body) {
        let ops = match state.parse_line(line, set) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::warn!(%err, language, "grammar failed; emitting remainder untagged");
                tokens.push(line_start, body.len(), ClassTags::empty());
                return Some(tokens.finish());
            }
        };

        let mut pos = 0;
        for (index, op) in ops {
            if index > pos {
                tokens.push(line_start + pos, line_start + index, tags_for_stack(&stack));
                pos = index;
            }
            if let Err(err) = stack.apply(&op) {
                tracing::warn!(?err, language, "scope stack rejected an operation");
            }
        }
        if pos < line.len() {
            tokens.push(line_start + pos, line_start + line.len(), tags_for_stack(&stack));
        }
        line_start += line.len();
    }

    Some(tokens.finish())
}

/// Collects token byte ranges, merging neighbours that carry identical tags.
struct TokenList<'a> {
    body: &'a str,
    spans: Vec<(usize, usize, ClassTags)>,
}

impl<'a> TokenList<'a> {
    fn new(body: &'a str) -> Self {
        Self { body, spans: Vec::new() }
    }

    fn push(&mut self, start: usize, end: usize, tags: ClassTags) {
        if start >= end {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.1 == start && last.2 == tags => last.1 = end,
            _ => self.spans.push((start, end, tags)),
        }
    }

    fn finish(self) -> Vec<Token<'a>> {
        let body = self.body;
        self.spans
            .into_iter()
            .map(|(start, end, tags)| Token { text: &body[start..end], tags })
            .collect()
    }
}

fn tags_for_stack(stack: &ScopeStack) -> ClassTags {
    stack
        .as_slice()
        .iter()
        .fold(ClassTags::empty(), |acc, scope| acc | tags_for_scope(*scope))
}

fn tags_for_scope(scope: Scope) -> ClassTags {
    let name = scope.build_string();
    SCOPE_TAGS
        .iter()
        .find(|(prefix, _)| scope_has_prefix(&name, prefix))
        .map(|(_, tags)| *tags)
        .unwrap_or_default()
}

fn scope_has_prefix(scope: &str, prefix: &str) -> bool {
    match scope.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(tokens: &[Token<'_>]) -> String {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_unknown_language_has_no_grammar() {
        assert!(tokenize("print(1)", "no-such-language").is_none());
        assert!(tokenize("print(1)", "").is_none());
        assert!(!has_grammar("   "));
    }

    #[test]
    fn test_known_languages_resolve() {
        assert!(has_grammar("python"));
        assert!(has_grammar("Python"));
        assert!(has_grammar("rust"));
        assert!(has_grammar("rs"));
        assert!(has_grammar("js"));
    }

    #[test]
    fn test_extended_languages_resolve() {
        for language in [
            "typescript", "ts", "tsx", "toml", "kotlin", "swift", "dockerfile", "csharp", "golang",
            "shell", "python3",
        ] {
            assert!(has_grammar(language), "no grammar for {language:?}");
        }
    }

    #[test]
    fn test_typescript_keyword_is_tagged() {
        let tokens = tokenize("const x: number = 1;\n", "ts").expect("typescript grammar");
        assert_eq!(joined(&tokens), "const x: number = 1;\n");
        assert!(tokens
            .iter()
            .any(|t| t.text.contains("const") && t.tags.contains(ClassTags::KEYWORD)));
    }

    #[test]
    fn test_token_coverage_is_byte_exact() {
        let samples = [
            ("python", "import os\n\ndef f(x):\n    return x + 1  # done\n"),
            ("rust", "fn main() {\n    let s = \"héllo\";\n    println!(\"{s}\");\n}"),
            ("js", "const re = /ab+c/g;\nif (a) { b(`t ${c}`) }\n"),
            ("html", "<!DOCTYPE html>\n<p class=\"x\">&amp; hi</p>"),
            ("css", "a > b { color: red !important; width: 10px; }"),
            ("python", ""),
            ("python", "\n\n\n"),
        ];
        for (language, body) in samples {
            let tokens = tokenize(body, language).unwrap_or_default();
            assert_eq!(joined(&tokens), body, "coverage for {language}");
            assert!(tokens.iter().all(|t| !t.text.is_empty()));
        }
    }

    #[test]
    fn test_python_tags() {
        let body = "import os\nif x:\n    print('hi')\n# note\n";
        let tokens = tokenize(body, "python").unwrap_or_default();

        let tags_of = |needle: &str| {
            tokens
                .iter()
                .filter(|t| t.text.contains(needle))
                .fold(ClassTags::empty(), |acc, t| acc | t.tags)
        };

        assert!(tags_of("import").contains(ClassTags::KEYWORD | ClassTags::MODULE));
        assert!(tags_of("if").contains(ClassTags::KEYWORD));
        assert!(tags_of("hi").contains(ClassTags::STRING));
        assert!(tags_of("note").contains(ClassTags::COMMENT));
    }

    #[test]
    fn test_scope_prefix_respects_atom_boundaries() {
        assert!(scope_has_prefix("keyword.control.flow", "keyword"));
        assert!(scope_has_prefix("keyword", "keyword"));
        assert!(!scope_has_prefix("keywords.other", "keyword"));
        assert!(!scope_has_prefix("string", "string.regexp"));
    }
}
