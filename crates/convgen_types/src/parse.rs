//! Parser for the type-expression syntax.
//!
//! The grammar is the familiar one:
//!
//! ```text
//! type   := '*' type | '[' ']' type | '[' INT ']' type | 'map' '[' type ']' type
//!         | 'struct' '{' fields '}' | 'interface' '{' '}' | IDENT ('.' IDENT)?
//! fields := (field (';' | NEWLINE))* field?
//! field  := IDENT (',' IDENT)* type TAG? | '*'? IDENT ('.' IDENT)? TAG?
//! ```
//!
//! Tags are either raw (backquoted) or interpreted (double-quoted) string literals.

use crate::raw::{BasicKind, RawField, RawType};

/// Deepest nesting of type constructors a type expression may use.
pub const MAX_TYPE_DEPTH: usize = 128;

/// A type expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type expression at offset {offset}: {message}")]
pub struct ParseTypeError {
    pub offset: usize,
    pub message: String,
}

impl RawType {
    /// Parse a complete type expression. Trailing input is an error.
    #[tracing::instrument(level = "trace", skip_all, fields(len = input.len()))]
    pub fn parse(input: &str) -> Result<RawType, ParseTypeError> {
        let mut parser = TypeParser {
            src: input,
            pos: 0,
            depth: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos < input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, message: impl Into<String>) -> ParseTypeError {
        ParseTypeError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip spaces and tabs, leaving newlines in place.
    fn skip_inline_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.pos += 1;
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseTypeError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let first = rest.chars().next()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        Some(&rest[..len])
    }

    /// An identifier optionally followed by `.Name`.
    fn qualified_ident(&mut self, first: &str) -> Result<String, ParseTypeError> {
        if self.peek() == Some('.') {
            self.pos += 1;
            let name = self.ident().ok_or_else(|| self.error("expected identifier after '.'"))?;
            return Ok(format!("{first}.{name}"));
        }
        Ok(first.to_string())
    }

    fn number(&mut self) -> Result<usize, ParseTypeError> {
        let rest = &self.src[self.pos..];
        let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected array length"));
        }
        let value = rest[..len]
            .parse::<usize>()
            .map_err(|err| self.error(format!("invalid array length: {err}")))?;
        self.pos += len;
        Ok(value)
    }

    fn parse_type(&mut self) -> Result<RawType, ParseTypeError> {
        if self.depth == MAX_TYPE_DEPTH {
            return Err(self.error(format!("type is nested more than {MAX_TYPE_DEPTH} levels deep")));
        }
        self.depth += 1;
        let ty = self.parse_type_at_depth();
        self.depth -= 1;
        ty
    }

    fn parse_type_at_depth(&mut self) -> Result<RawType, ParseTypeError> {
        self.skip_ws();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(RawType::pointer(self.parse_type()?))
            }
            Some('[') => {
                self.pos += 1;
                self.skip_ws();
                if self.peek() == Some(']') {
                    self.pos += 1;
                    return Ok(RawType::slice(self.parse_type()?));
                }
                let len = self.number()?;
                self.expect(']')?;
                Ok(RawType::Array(len, Box::new(self.parse_type()?)))
            }
            Some(_) => {
                let word = self.ident().ok_or_else(|| self.error("expected a type"))?;
                match word {
                    "map" => {
                        self.expect('[')?;
                        let key = self.parse_type()?;
                        self.expect(']')?;
                        let value = self.parse_type()?;
                        Ok(RawType::map(key, value))
                    }
                    "struct" => self.parse_struct_body(),
                    "interface" => {
                        self.expect('{')?;
                        self.expect('}')?;
                        Ok(RawType::Interface)
                    }
                    _ => {
                        if let Some(kind) = BasicKind::from_name(word) {
                            return Ok(RawType::Basic(kind));
                        }
                        Ok(RawType::Named(self.qualified_ident(word)?))
                    }
                }
            }
            None => Err(self.error("expected a type, found end of input")),
        }
    }

    fn parse_struct_body(&mut self) -> Result<RawType, ParseTypeError> {
        self.expect('{')?;
        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(RawType::Struct(fields));
                }
                Some(';') => {
                    self.pos += 1;
                }
                Some(_) => {
                    self.parse_field_decl(&mut fields)?;
                    self.skip_inline_ws();
                    match self.peek() {
                        Some(';' | '\n') => self.pos += 1,
                        Some('}') => {}
                        Some(c) => return Err(self.error(format!("unexpected '{c}' after struct field"))),
                        None => return Err(self.error("unterminated struct type")),
                    }
                }
                None => return Err(self.error("unterminated struct type")),
            }
        }
    }

    fn parse_field_decl(&mut self, fields: &mut Vec<RawField>) -> Result<(), ParseTypeError> {
        if self.peek() == Some('*') {
            let ty = self.parse_type()?;
            let tag = self.parse_tag()?;
            fields.push(RawField::embedded(ty).with_tag(tag));
            return Ok(());
        }

        let first = self.ident().ok_or_else(|| self.error("expected field name"))?;
        if self.peek() == Some('.') {
            // `pkg.Name` can only be an embedded field.
            let name = self.qualified_ident(first)?;
            let tag = self.parse_tag()?;
            fields.push(RawField::embedded(RawType::Named(name)).with_tag(tag));
            return Ok(());
        }

        self.skip_inline_ws();
        if matches!(self.peek(), None | Some(';' | '\n' | '}' | '`' | '"')) {
            let ty = match BasicKind::from_name(first) {
                Some(kind) => RawType::Basic(kind),
                None => RawType::Named(first.to_string()),
            };
            let tag = self.parse_tag()?;
            fields.push(RawField::embedded(ty).with_tag(tag));
            return Ok(());
        }

        let mut names = vec![first.to_string()];
        while self.peek() == Some(',') {
            self.pos += 1;
            self.skip_ws();
            let name = self.ident().ok_or_else(|| self.error("expected field name after ','"))?;
            names.push(name.to_string());
            self.skip_inline_ws();
        }

        let ty = self.parse_type()?;
        let tag = self.parse_tag()?;
        for name in names {
            fields.push(RawField::new(name, ty.clone()).with_tag(tag.clone()));
        }
        Ok(())
    }

    fn parse_tag(&mut self) -> Result<String, ParseTypeError> {
        self.skip_inline_ws();
        match self.peek() {
            Some('`') => {
                self.pos += 1;
                let rest = &self.src[self.pos..];
                let end = rest.find('`').ok_or_else(|| self.error("unterminated raw tag"))?;
                let tag = rest[..end].to_string();
                self.pos += end + 1;
                Ok(tag)
            }
            Some('"') => {
                self.pos += 1;
                let mut tag = String::new();
                loop {
                    match self.bump() {
                        Some('"') => return Ok(tag),
                        Some('\\') => match self.bump() {
                            Some('n') => tag.push('\n'),
                            Some('t') => tag.push('\t'),
                            Some(c) => tag.push(c),
                            None => return Err(self.error("unterminated tag")),
                        },
                        Some(c) => tag.push(c),
                        None => return Err(self.error("unterminated tag")),
                    }
                }
            }
            _ => Ok(String::new()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
