/// Pattern compiler — turns a token stream into a validated `CompiledPattern`.
///
/// Syntax:
/// - `{a|b|c}` → a slot choosing one of `a`, `b`, `c`
/// - `{(a|b)|c}` → a grouped option sharing one constraint
/// - `{a>c}` / `{a~c}` → `c` requires / excludes an earlier `a`
/// - `{a|?}` → `?` resolves the slot to nothing
/// - `\{` / `\}` → literal braces
/// - Everything else → literal text
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::core::lexer::{tokenize, Token, TokenKind};
use crate::schema::pattern::{CompiledPattern, Constraint, Segment, Slot, SlotOption, SlotValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated parameter slot")]
    UnterminatedSlot,
    #[error("unmatched closing brace")]
    UnmatchedBrace,
    #[error("empty group")]
    EmptyGroup,
    #[error("empty option")]
    EmptyOption,
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("the first slot of a pattern cannot contain a constraint")]
    ConstraintOnFirstSlot,
    #[error("constraint operators must be separated by a value")]
    ConflictingConstraintOperators,
    #[error("constraint operator is missing its source or its target")]
    DanglingConstraint,
    #[error("a backslash must be followed by a brace")]
    DanglingEscape,
    #[error("malformed group syntax")]
    MalformedGroupSyntax,
}

/// A compile error and the byte offset in the pattern where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl CompiledPattern {
    /// Compile a pattern string. Every structural error is reported here;
    /// a successfully compiled pattern can always be resolved.
    pub fn compile(pattern: &str) -> Result<CompiledPattern, ParseError> {
        let tokens = tokenize(pattern);
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let mut slot_count = 0usize;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            match token.kind {
                TokenKind::Escape => {
                    match tokens.get(i + 1).map(|t| t.kind) {
                        Some(TokenKind::OpenSlot) => literal_buf.push('{'),
                        Some(TokenKind::CloseSlot) => literal_buf.push('}'),
                        _ => {
                            return Err(ParseError::new(
                                ParseErrorKind::DanglingEscape,
                                token.offset,
                            ))
                        }
                    }
                    i += 2;
                }
                TokenKind::OpenSlot => {
                    // Find the closing brace; slots do not nest.
                    let start = i + 1;
                    let mut end = start;
                    loop {
                        match tokens.get(end).map(|t| t.kind) {
                            Some(TokenKind::CloseSlot) => break,
                            Some(TokenKind::OpenSlot) | None => {
                                return Err(ParseError::new(
                                    ParseErrorKind::UnterminatedSlot,
                                    token.offset,
                                ))
                            }
                            _ => end += 1,
                        }
                    }

                    if !literal_buf.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                    }

                    let parser = SlotParser {
                        tokens: &tokens[start..end],
                        pos: 0,
                        first_slot: slot_count == 0,
                        end_offset: tokens[end].offset,
                    };
                    segments.push(Segment::Slot(parser.parse()?));
                    slot_count += 1;
                    i = end + 1;
                }
                TokenKind::CloseSlot => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnmatchedBrace,
                        token.offset,
                    ));
                }
                other => {
                    literal_buf.push(other.as_char());
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        debug!(
            segments = segments.len(),
            slots = slot_count,
            "compiled pattern"
        );
        Ok(CompiledPattern::from_segments(segments))
    }
}

impl FromStr for CompiledPattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl TryFrom<String> for CompiledPattern {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::compile(&s)
    }
}

/// One parsed atom: a bare name, `?`, or a parenthesized group.
struct Atom {
    values: Vec<SlotValue>,
    offset: usize,
}

/// Recursive-descent parser over the tokens of one slot body.
struct SlotParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    first_slot: bool,
    /// Offset of the closing brace, reported for errors at the end of the body.
    end_offset: usize,
}

impl SlotParser<'_> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end_offset, |t| t.offset)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.offset())
    }

    fn parse(mut self) -> Result<Slot, ParseError> {
        let mut options = vec![self.parse_option()?];
        while self.peek() == Some(TokenKind::Alt) {
            self.pos += 1;
            options.push(self.parse_option()?);
        }
        Ok(Slot { options })
    }

    fn parse_option(&mut self) -> Result<SlotOption, ParseError> {
        if matches!(self.peek(), Some(kind) if kind.is_operator()) {
            return Err(self.operator_error(ParseErrorKind::DanglingConstraint));
        }

        let first = self.parse_atom()?;
        let option = match self.peek() {
            Some(op) if op.is_operator() => {
                if self.first_slot {
                    return Err(self.error(ParseErrorKind::ConstraintOnFirstSlot));
                }
                self.pos += 1;
                match self.peek() {
                    Some(kind) if kind.is_operator() => {
                        return Err(self.error(ParseErrorKind::ConflictingConstraintOperators))
                    }
                    None | Some(TokenKind::Alt) => {
                        return Err(self.error(ParseErrorKind::DanglingConstraint))
                    }
                    _ => {}
                }

                let sources = source_names(first)?;
                let target = self.parse_atom()?;
                let constraint = if op == TokenKind::Requires {
                    Constraint::RequiresPreceding(sources)
                } else {
                    Constraint::ExcludesPreceding(sources)
                };
                SlotOption {
                    values: target.values,
                    constraint,
                }
            }
            _ => SlotOption {
                values: first.values,
                constraint: Constraint::Unconstrained,
            },
        };

        match self.peek() {
            None | Some(TokenKind::Alt) => Ok(option),
            Some(kind) => Err(self.unexpected(kind)),
        }
    }

    fn parse_atom(&mut self) -> Result<Atom, ParseError> {
        let offset = self.offset();
        match self.peek() {
            Some(TokenKind::OpenGroup) => {
                self.pos += 1;
                self.parse_group(offset)
            }
            Some(TokenKind::Char(_) | TokenKind::Optional) => Ok(Atom {
                values: vec![self.parse_member()?],
                offset,
            }),
            None | Some(TokenKind::Alt) => Err(self.error(ParseErrorKind::EmptyOption)),
            Some(kind) => Err(self.unexpected(kind)),
        }
    }

    /// Parses the members of a group after its opening parenthesis.
    fn parse_group(&mut self, open_offset: usize) -> Result<Atom, ParseError> {
        let mut values = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::Char(_) | TokenKind::Optional) => {
                    let value = self.parse_member()?;
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
                Some(TokenKind::Alt | TokenKind::CloseGroup) => {
                    return Err(self.error(ParseErrorKind::EmptyGroup))
                }
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::MalformedGroupSyntax,
                        open_offset,
                    ))
                }
                Some(TokenKind::Escape) => return Err(self.error(ParseErrorKind::DanglingEscape)),
                Some(_) => return Err(self.error(ParseErrorKind::MalformedGroupSyntax)),
            }

            match self.peek() {
                Some(TokenKind::Alt) => self.pos += 1,
                Some(TokenKind::CloseGroup) => {
                    self.pos += 1;
                    return Ok(Atom {
                        values,
                        offset: open_offset,
                    });
                }
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::MalformedGroupSyntax,
                        open_offset,
                    ))
                }
                Some(TokenKind::Escape) => return Err(self.error(ParseErrorKind::DanglingEscape)),
                Some(_) => return Err(self.error(ParseErrorKind::MalformedGroupSyntax)),
            }
        }
    }

    /// Parses a single value: a name or the `?` marker.
    fn parse_member(&mut self) -> Result<SlotValue, ParseError> {
        let offset = self.offset();
        if self.peek() == Some(TokenKind::Optional) {
            self.pos += 1;
            if matches!(self.peek(), Some(TokenKind::Char(_))) {
                let rest = self.take_chars();
                return Err(ParseError::new(
                    ParseErrorKind::InvalidIdentifier(format!("?{rest}")),
                    offset,
                ));
            }
            return Ok(SlotValue::Nothing);
        }

        let mut name = self.take_chars();
        if self.peek() == Some(TokenKind::Optional) {
            self.pos += 1;
            name.push('?');
            return Err(ParseError::new(
                ParseErrorKind::InvalidIdentifier(name),
                offset,
            ));
        }
        if !is_value_name(&name) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidIdentifier(name),
                offset,
            ));
        }
        Ok(SlotValue::Name(name))
    }

    fn take_chars(&mut self) -> String {
        let mut out = String::new();
        while let Some(TokenKind::Char(c)) = self.peek() {
            out.push(c);
            self.pos += 1;
        }
        out
    }

    /// Operators are never allowed in the first slot, whatever else is wrong.
    fn operator_error(&self, otherwise: ParseErrorKind) -> ParseError {
        if self.first_slot {
            self.error(ParseErrorKind::ConstraintOnFirstSlot)
        } else {
            self.error(otherwise)
        }
    }

    fn unexpected(&self, kind: TokenKind) -> ParseError {
        match kind {
            TokenKind::Requires | TokenKind::Excludes => {
                self.operator_error(ParseErrorKind::ConflictingConstraintOperators)
            }
            TokenKind::Escape => self.error(ParseErrorKind::DanglingEscape),
            TokenKind::Optional => self.error(ParseErrorKind::InvalidIdentifier("?".to_string())),
            TokenKind::OpenSlot | TokenKind::CloseSlot => {
                self.error(ParseErrorKind::UnterminatedSlot)
            }
            TokenKind::OpenGroup | TokenKind::CloseGroup | TokenKind::Alt | TokenKind::Char(_) => {
                self.error(ParseErrorKind::MalformedGroupSyntax)
            }
        }
    }
}

/// Constraint sources must be plain identifiers: no `?`, no subscripts.
fn source_names(atom: Atom) -> Result<Vec<String>, ParseError> {
    atom.values
        .into_iter()
        .map(|value| match value {
            SlotValue::Name(name) if is_identifier(&name) => Ok(name),
            other => Err(ParseError::new(
                ParseErrorKind::InvalidIdentifier(other.to_string()),
                atom.offset,
            )),
        })
        .collect()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// An identifier optionally followed by bracket subscripts: `name[0][key]`.
fn is_value_name(s: &str) -> bool {
    let (ident, mut rest) = match s.find('[') {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    if !is_identifier(ident) {
        return false;
    }
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return false;
        };
        let Some((subscript, more)) = inner.split_once(']') else {
            return false;
        };
        if subscript.is_empty() || !subscript.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return false;
        }
        rest = more;
    }
    true
}
