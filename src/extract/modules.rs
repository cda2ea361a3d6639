use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::trace;

/// Failure to read the dependency array handed to `require([...])`.
///
/// Offsets are byte positions in the scanned source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayLiteralError {
    /// The opening `[` never gets a matching `]`.
    #[error("dependency array opened at byte {start} is never closed")]
    Unterminated {
        /// Position of the opening bracket.
        start: usize,
    },
    /// A string literal runs into a line break or the end of the array.
    #[error("unterminated string literal at byte {offset}")]
    UnterminatedString {
        /// Position of the opening quote.
        offset: usize,
    },
    /// A backslash escape that does not form a valid character.
    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape {
        /// Position of the backslash.
        offset: usize,
    },
    /// Anything outside the strings/commas/brackets grammar.
    #[error("unexpected `{found}` at byte {offset}, expected a string literal array")]
    Unexpected {
        /// Offending character.
        found: char,
        /// Position of the offending character.
        offset: usize,
    },
    /// The text ended before the array was complete.
    #[error("dependency array ends unexpectedly")]
    UnexpectedEnd,
}

impl ArrayLiteralError {
    fn shifted(self, by: usize) -> Self {
        match self {
            Self::Unterminated { start } => Self::Unterminated { start: start + by },
            Self::UnterminatedString { offset } => Self::UnterminatedString { offset: offset + by },
            Self::InvalidEscape { offset } => Self::InvalidEscape { offset: offset + by },
            Self::Unexpected { found, offset } => Self::Unexpected {
                found,
                offset: offset + by,
            },
            Self::UnexpectedEnd => Self::UnexpectedEnd,
        }
    }
}

fn require_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\brequire\s*\(\s*\[").expect("invalid require regex"))
}

/// Collect the module identifiers passed as dependency arrays to `require([...])` calls.
///
/// `require` must start a word, so `myrequire([...])` is skipped while `loader.require([...])`
/// is read. Calls whose first argument is not an array are ignored. An array that cannot be
/// read as a literal list of strings fails the whole extraction.
pub fn module_ids(content: &str) -> Result<Vec<String>, ArrayLiteralError> {
    let mut ids = Vec::new();
    let mut cursor = 0;

    while let Some(call) = require_call_pattern().find_at(content, cursor) {
        let open = call.end() - 1;
        let close = find_array_end(content, open)?;
        let literal = &content[open..close];
        let found = parse_array_literal(literal).map_err(|err| err.shifted(open))?;
        trace!("require call at byte {open} lists {} module(s)", found.len());
        ids.extend(found);
        cursor = close;
    }

    Ok(ids)
}

/// Locate the byte just past the `]` matching the `[` at `open`.
///
/// Brackets inside string literals do not count towards the depth.
fn find_array_end(content: &str, open: usize) -> Result<usize, ArrayLiteralError> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut index = open;

    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(_) if byte == b'\\' => index += 1,
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(index + 1);
                    }
                }
                _ => {}
            },
        }
        index += 1;
    }

    Err(ArrayLiteralError::Unterminated { start: open })
}

/// Parse a literal array of strings such as `["a", 'b/c', ["d"]]`.
///
/// Nested arrays are flattened into the result and a trailing comma is accepted.
pub fn parse_array_literal(text: &str) -> Result<Vec<String>, ArrayLiteralError> {
    let mut parser = LiteralParser { text, pos: 0 };
    let mut values = Vec::new();

    parser.skip_whitespace();
    parser.parse_array(&mut values)?;
    parser.skip_whitespace();

    match parser.peek() {
        None => Ok(values),
        Some(found) => Err(ArrayLiteralError::Unexpected {
            found,
            offset: parser.pos,
        }),
    }
}

struct LiteralParser<'a> {
    text: &'a str,
    pos: usize,
}

impl LiteralParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ArrayLiteralError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(ArrayLiteralError::Unexpected {
                found,
                offset: self.pos,
            }),
            None => Err(ArrayLiteralError::UnexpectedEnd),
        }
    }

    fn parse_array(&mut self, values: &mut Vec<String>) -> Result<(), ArrayLiteralError> {
        self.expect('[')?;
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(());
        }

        loop {
            self.parse_value(values)?;
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_whitespace();
                    if self.peek() == Some(']') {
                        self.bump();
                        return Ok(());
                    }
                }
                Some(']') => {
                    self.bump();
                    return Ok(());
                }
                Some(found) => {
                    return Err(ArrayLiteralError::Unexpected {
                        found,
                        offset: self.pos,
                    });
                }
                None => return Err(ArrayLiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_value(&mut self, values: &mut Vec<String>) -> Result<(), ArrayLiteralError> {
        match self.peek() {
            Some('"') | Some('\'') => {
                let value = self.parse_string()?;
                values.push(value);
                Ok(())
            }
            Some('[') => self.parse_array(values),
            Some(found) => Err(ArrayLiteralError::Unexpected {
                found,
                offset: self.pos,
            }),
            None => Err(ArrayLiteralError::UnexpectedEnd),
        }
    }

    fn parse_string(&mut self) -> Result<String, ArrayLiteralError> {
        let start = self.pos;
        let quote = self.bump().ok_or(ArrayLiteralError::UnexpectedEnd)?;
        let mut value = String::new();

        loop {
            let escape_at = self.pos;
            match self.bump() {
                None | Some('\n') | Some('\r') => {
                    return Err(ArrayLiteralError::UnterminatedString { offset: start });
                }
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => {
                    let escaped = self.parse_escape(escape_at)?;
                    value.push(escaped);
                }
                Some(ch) => value.push(ch),
            }
        }
    }

    fn parse_escape(&mut self, offset: usize) -> Result<char, ArrayLiteralError> {
        let invalid = ArrayLiteralError::InvalidEscape { offset };
        let ch = self.bump().ok_or_else(|| invalid.clone())?;
        let escaped = match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => self.parse_hex(2).ok_or(invalid)?,
            'u' => self.parse_hex(4).ok_or(invalid)?,
            '\n' | '\r' => return Err(invalid),
            other => other,
        };
        Ok(escaped)
    }

    fn parse_hex(&mut self, digits: usize) -> Option<char> {
        let end = self.pos + digits;
        let hex = self.text.get(self.pos..end)?;
        let code = u32::from_str_radix(hex, 16).ok()?;
        self.pos = end;
        char::from_u32(code)
    }
}
