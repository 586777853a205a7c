/// Pattern tokenizer — classifies every character of a pattern.

/// Classification of a single pattern character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    OpenSlot,
    /// `}`
    CloseSlot,
    /// `(`
    OpenGroup,
    /// `)`
    CloseGroup,
    /// `|`
    Alt,
    /// `>`: requires-preceding.
    Requires,
    /// `~`: excludes-preceding.
    Excludes,
    /// `\`
    Escape,
    /// `?`
    Optional,
    Char(char),
}

impl TokenKind {
    pub fn classify(c: char) -> Self {
        match c {
            '{' => Self::OpenSlot,
            '}' => Self::CloseSlot,
            '(' => Self::OpenGroup,
            ')' => Self::CloseGroup,
            '|' => Self::Alt,
            '>' => Self::Requires,
            '~' => Self::Excludes,
            '\\' => Self::Escape,
            '?' => Self::Optional,
            other => Self::Char(other),
        }
    }

    /// The source character this token was produced from.
    pub fn as_char(self) -> char {
        match self {
            Self::OpenSlot => '{',
            Self::CloseSlot => '}',
            Self::OpenGroup => '(',
            Self::CloseGroup => ')',
            Self::Alt => '|',
            Self::Requires => '>',
            Self::Excludes => '~',
            Self::Escape => '\\',
            Self::Optional => '?',
            Self::Char(c) => c,
        }
    }

    pub fn is_operator(self) -> bool {
        matches!(self, Self::Requires | Self::Excludes)
    }
}

/// A classified character and its byte offset in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Tokenize a pattern. Never fails; structure is checked by the compiler.
pub fn tokenize(pattern: &str) -> Vec<Token> {
    pattern
        .char_indices()
        .map(|(offset, c)| Token {
            kind: TokenKind::classify(c),
            offset,
        })
        .collect()
}
