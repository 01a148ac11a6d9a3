//! Ordered style rules mapping token class tags to colors.

use super::segment::Style;
use super::tokens::ClassTags;
use crate::ui::theme;

/// A rule matches when the token carries at least one tag from `any_of` and,
/// if `and_any_of` is non-empty, at least one tag from it as well.
#[derive(Debug, Clone, Copy)]
pub struct StyleRule {
    pub any_of: ClassTags,
    pub and_any_of: ClassTags,
    pub style: Style,
}

impl StyleRule {
    const fn when(any_of: ClassTags, style: Style) -> Self {
        Self { any_of, and_any_of: ClassTags::empty(), style }
    }

    const fn when_both(any_of: ClassTags, and_any_of: ClassTags, style: Style) -> Self {
        Self { any_of, and_any_of, style }
    }

    pub fn matches(&self, tags: ClassTags) -> bool {
        tags.intersects(self.any_of)
            && (self.and_any_of.is_empty() || tags.intersects(self.and_any_of))
    }
}

const fn tags(list: &[ClassTags]) -> ClassTags {
    let mut acc = ClassTags::empty();
    let mut i = 0;
    while i < list.len() {
        acc = acc.union(list[i]);
        i += 1;
    }
    acc
}

pub const KEYWORD_ACCENT: Style = Style::rgb(0xc5, 0x86, 0xc0);
pub const KEYWORD: Style = Style::rgb(0x56, 0x9c, 0xd6);

/// First match wins.
pub static RULES: [StyleRule; 15] = [
    StyleRule::when(ClassTags::DOCTYPE, Style::rgb(0x56, 0x9c, 0xd6)),
    StyleRule::when(ClassTags::NAME, Style::rgb(0x9c, 0xdc, 0xfe)),
    StyleRule::when(
        tags(&[ClassTags::COMMENT, ClassTags::PROLOG]),
        Style::rgb(0x6a, 0x99, 0x55),
    ),
    StyleRule::when(
        tags(&[
            ClassTags::PROPERTY,
            ClassTags::NUMBER,
            ClassTags::CONSTANT,
            ClassTags::SYMBOL,
            ClassTags::INSERTED,
            ClassTags::UNIT,
        ]),
        Style::rgb(0xb5, 0xce, 0xa8),
    ),
    StyleRule::when(
        tags(&[
            ClassTags::SELECTOR,
            ClassTags::ATTR_VALUE,
            ClassTags::STRING,
            ClassTags::INTERPOLATION_STRING,
            ClassTags::CHAR,
            ClassTags::BUILTIN,
            ClassTags::DELETED,
        ]),
        Style::rgb(0xce, 0x91, 0x78),
    ),
    StyleRule::when(
        tags(&[ClassTags::OPERATOR, ClassTags::ENTITY]),
        Style::rgb(0xd4, 0xd4, 0xd4),
    ),
    StyleRule::when(ClassTags::ATRULE, Style::rgb(0xce, 0x91, 0x78)),
    StyleRule::when_both(
        tags(&[ClassTags::KEYWORD, ClassTags::BOOLEAN]),
        tags(&[ClassTags::MODULE, ClassTags::CONTROL_FLOW]),
        KEYWORD_ACCENT,
    ),
    StyleRule::when(tags(&[ClassTags::KEYWORD, ClassTags::BOOLEAN]), KEYWORD),
    StyleRule::when(ClassTags::FUNCTION, Style::rgb(0xdc, 0xdc, 0xaa)),
    StyleRule::when(ClassTags::REGEX, Style::rgb(0xd1, 0x69, 0x69)),
    StyleRule::when(ClassTags::IMPORTANT, Style::rgb(0x56, 0x9c, 0xd6)),
    StyleRule::when(ClassTags::CLASS_NAME, Style::rgb(0x4e, 0xc9, 0xb0)),
    StyleRule::when(
        tags(&[
            ClassTags::PARAMETER,
            ClassTags::ATTR_NAME,
            ClassTags::INTERPOLATION,
            ClassTags::VARIABLE,
        ]),
        Style::rgb(0x9c, 0xdc, 0xfe),
    ),
    StyleRule::when(
        tags(&[ClassTags::PUNCTUATION, ClassTags::TAG]),
        Style::rgb(0x80, 0x80, 0x80),
    ),
];

/// Resolves the style for a token's tags, falling back to the default
/// code foreground.
pub fn resolve(tags: ClassTags) -> Style {
    RULES
        .iter()
        .find(|rule| rule.matches(tags))
        .map(|rule| rule.style)
        .unwrap_or(theme::CODE_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_uses_default() {
        assert_eq!(resolve(ClassTags::empty()), theme::CODE_DEFAULT);
    }

    #[test]
    fn test_control_flow_keywords_get_accent() {
        assert_eq!(resolve(ClassTags::KEYWORD), KEYWORD);
        assert_eq!(resolve(ClassTags::KEYWORD | ClassTags::CONTROL_FLOW), KEYWORD_ACCENT);
        assert_eq!(resolve(ClassTags::KEYWORD | ClassTags::MODULE), KEYWORD_ACCENT);
        assert_eq!(resolve(ClassTags::BOOLEAN), KEYWORD);
        // Module alone is not a keyword.
        assert_eq!(resolve(ClassTags::MODULE), theme::CODE_DEFAULT);
    }

    #[test]
    fn test_priority_order() {
        // Strings outrank punctuation, so quotes take the string color.
        let string = resolve(ClassTags::STRING);
        assert_eq!(resolve(ClassTags::STRING | ClassTags::PUNCTUATION), string);
        // Comments outrank everything after them.
        let comment = resolve(ClassTags::COMMENT);
        assert_eq!(resolve(ClassTags::COMMENT | ClassTags::KEYWORD | ClassTags::STRING), comment);
        // Doctype comes first of all.
        assert_eq!(resolve(ClassTags::DOCTYPE | ClassTags::NAME), resolve(ClassTags::DOCTYPE));
        // Functions come before class names.
        assert_eq!(
            resolve(ClassTags::FUNCTION | ClassTags::CLASS_NAME),
            resolve(ClassTags::FUNCTION)
        );
        assert_ne!(resolve(ClassTags::FUNCTION), resolve(ClassTags::CLASS_NAME));
    }
}
