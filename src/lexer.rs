//! Hand-written lexer for the expression language (component B, lexical half).
//!
//! No regex, no external tokenizer crate: a single forward scan over the
//! byte offsets of the source string, tracking offsets so the parser can
//! report precise `ParseError` locations (§4.B, §7).

use std::fmt;

/// A lexical token together with the byte span it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    /// `global.x` style dotted identifier, pre-split into qualifier/name.
    Qualified(String, String),
    Dollar,
    And,
    Or,
    Not,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    StarStar,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::Qualified(q, n) => write!(f, "{}.{}", q, n),
            TokenKind::Dollar => write!(f, "$"),
            TokenKind::And => write!(f, "and"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// A lexical error: the raw slice that could not be tokenized and its
/// starting byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub text: String,
    pub offset: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenizes the entire source, returning tokens including a trailing
    /// `Eof`, or the first lexical error encountered.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            // Line breaks separate statements like semicolons do (§4.B); the
            // caller (parser) treats newline tokens identically to ';' by
            // having the lexer fold them into Semicolon rather than
            // whitespace, so this only skips spaces/tabs/carriage returns.
            if b == b' ' || b == b'\t' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
                end: start,
            });
        };

        match b {
            b'\n' => {
                self.pos += 1;
                Ok(Token {
                    kind: TokenKind::Semicolon,
                    start,
                    end: self.pos,
                })
            }
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semicolon),
            b'$' => self.single(TokenKind::Dollar),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'/' => self.single(TokenKind::Slash),
            b'*' => {
                if self.peek_at(1) == Some(b'*') {
                    self.pos += 2;
                    Ok(Token {
                        kind: TokenKind::StarStar,
                        start,
                        end: self.pos,
                    })
                } else {
                    self.single(TokenKind::Star)
                }
            }
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    Ok(Token {
                        kind: TokenKind::EqEq,
                        start,
                        end: self.pos,
                    })
                } else {
                    self.single(TokenKind::Assign)
                }
            }
            b'!' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    Ok(Token {
                        kind: TokenKind::NotEq,
                        start,
                        end: self.pos,
                    })
                } else {
                    Err(self.error_at(start))
                }
            }
            b'<' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    Ok(Token {
                        kind: TokenKind::Le,
                        start,
                        end: self.pos,
                    })
                } else {
                    self.single(TokenKind::Lt)
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    Ok(Token {
                        kind: TokenKind::Ge,
                        start,
                        end: self.pos,
                    })
                } else {
                    self.single(TokenKind::Gt)
                }
            }
            b'0'..=b'9' | b'.' if b != b'.' || self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number()
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.ident_or_keyword(),
            _ => Err(self.error_at(start)),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        Ok(Token {
            kind,
            start,
            end: self.pos,
        })
    }

    fn error_at(&self, start: usize) -> LexError {
        let end = (start + 1).min(self.bytes.len());
        LexError {
            text: self.src[start..end].to_string(),
            offset: start,
        }
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }
        let text = &self.src[start..self.pos];
        let value: f64 = text.parse().map_err(|_| LexError {
            text: text.to_string(),
            offset: start,
        })?;
        Ok(Token {
            kind: TokenKind::Number(value),
            start,
            end: self.pos,
        })
    }

    fn ident_or_keyword(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        let first = self.src[start..self.pos].to_string();

        // Dotted qualified name: only a single `.segment` is recognised,
        // matching §3's `global.x` access-path form.
        if self.peek() == Some(b'.')
            && self
                .peek_at(1)
                .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
        {
            self.pos += 1;
            let seg_start = self.pos;
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.pos += 1;
            }
            let second = self.src[seg_start..self.pos].to_string();
            return Ok(Token {
                kind: TokenKind::Qualified(first, second),
                start,
                end: self.pos,
            });
        }

        let kind = match first.as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident(first),
        };
        Ok(Token {
            kind,
            start,
            end: self.pos,
        })
    }
}
