//! Minimal S-expression reader for KiCad board files.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unexpected end of input (line {0})")]
    UnexpectedEof(usize),
    #[error("Unexpected token at line {line}: {message}")]
    UnexpectedToken { line: usize, message: String },
    #[error("Trailing input after root expression at line {0}")]
    TrailingInput(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    /// Double-quoted string; never a number or keyword, even if it reads like one.
    Str(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) | SExp::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, SExp::Str(_))
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Head atom of a list, e.g. `segment` for `(segment ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// Items after the head atom.
    pub fn children(&self) -> &[SExp] {
        match self {
            SExp::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// Element at `index` of a list (index 0 is the tag).
    pub fn item_at(&self, index: usize) -> Option<&SExp> {
        self.as_list()?.get(index)
    }

    /// Atom at `index` of a list (index 0 is the tag).
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.item_at(index)?.as_atom()
    }

    /// First direct child list tagged `key`.
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.children().iter().find(|c| c.tag() == Some(key))
    }

    /// Every direct child list tagged `key`.
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.children().iter().filter(move |c| c.tag() == Some(key))
    }

    /// First value of child `(key value ...)`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.find(key)?.atom_at(1)
    }

    /// `(key x y)` as a pair of floats.
    pub fn point(&self, key: &str) -> Option<(f64, f64)> {
        let node = self.find(key)?;
        let x = node.atom_at(1)?.parse().ok()?;
        let y = node.atom_at(2)?.parse().ok()?;
        Some((x, y))
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => {
                let needs_quotes = s.is_empty()
                    || s.chars()
                        .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"');
                if needs_quotes {
                    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    f.write_str(s)
                }
            }
            SExp::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            SExp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

pub struct SExpParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> SExpParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    /// Parse exactly one root expression.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        let root = self.parse_sexp()?;
        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(ParseError::TrailingInput(self.line));
        }
        Ok(root)
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof(self.line)),
            Some('(') => self.parse_list(),
            Some(')') => Err(ParseError::UnexpectedToken {
                line: self.line,
                message: "unbalanced ')'".to_string(),
            }),
            Some('"') => self.parse_string(),
            Some(_) => Ok(self.parse_symbol()),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof(self.line)),
                Some(')') => {
                    self.bump();
                    return Ok(SExp::List(items));
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        let start_line = self.line;
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnexpectedEof(start_line)),
                Some('"') => return Ok(SExp::Str(s)),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some(other) => s.push(other),
                    None => return Err(ParseError::UnexpectedEof(start_line)),
                },
                Some(ch) => s.push(ch),
            }
        }
    }

    fn parse_symbol(&mut self) -> SExp {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.bump();
        }
        SExp::Atom(self.input[start..self.pos].to_string())
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }
}
