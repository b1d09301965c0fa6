//! Streaming lexer.
//!
//! [`Scanner`] walks the source as bytes and yields one `Result<Token>` per
//! call to `next`.  Whitespace and `//` comments produce nothing; a lexical
//! error is yielded in place of a token and scanning resumes right after the
//! offending input, so the caller sees every error in one pass.  The stream
//! always ends with exactly one `EOF` token.
//!
//! Lexemes are sliced out of the `&str` (never the byte view) and every cut
//! falls next to an ASCII byte, so no UTF‑8 re‑validation is needed.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    start: usize, // first byte of the lexeme being scanned
    curr: usize,  // next byte to examine
    line: usize,
    done: bool, // EOF already emitted
}

/// What one step of the scanner found.
enum Lexeme {
    Token(TokenType),
    Skip,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    // ── byte cursor ────────────────────────────────────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    /// Callers check `is_at_end` first.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` places ahead, or `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        let hit = self.peek_at(0) == expected && !self.is_at_end();
        if hit {
            self.curr += 1;
        }
        hit
    }

    /// `matched` if the next byte is `=`, otherwise `single`.
    #[inline]
    fn with_equals(&mut self, matched: TokenType, single: TokenType) -> Lexeme {
        Lexeme::Token(if self.match_byte(b'=') { matched } else { single })
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.curr]
    }

    // ── recognition ───────────────────────────────────────────────────────

    fn scan_lexeme(&mut self) -> Result<Lexeme> {
        let lexeme = match self.advance() {
            b'(' => Lexeme::Token(TokenType::LEFT_PAREN),
            b')' => Lexeme::Token(TokenType::RIGHT_PAREN),
            b'{' => Lexeme::Token(TokenType::LEFT_BRACE),
            b'}' => Lexeme::Token(TokenType::RIGHT_BRACE),
            b',' => Lexeme::Token(TokenType::COMMA),
            b'.' => Lexeme::Token(TokenType::DOT),
            b'-' => Lexeme::Token(TokenType::MINUS),
            b'+' => Lexeme::Token(TokenType::PLUS),
            b';' => Lexeme::Token(TokenType::SEMICOLON),
            b'*' => Lexeme::Token(TokenType::STAR),

            b'!' => self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.match_byte(b'/') => {
                // Comment: jump to the newline, which the next step counts.
                self.curr = memchr(b'\n', &self.bytes[self.curr..])
                    .map_or(self.bytes.len(), |pos| self.curr + pos);
                Lexeme::Skip
            }
            b'/' => Lexeme::Token(TokenType::SLASH),

            b' ' | b'\r' | b'\t' => Lexeme::Skip,
            b'\n' => {
                self.line += 1;
                Lexeme::Skip
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => return Err(self.unexpected_character()),
        };

        Ok(lexeme)
    }

    /// The opening quote is already consumed.  Strings may span lines.
    fn string(&mut self) -> Result<Lexeme> {
        while !self.is_at_end() && self.peek_at(0) != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1; // closing quote

        let text = &self.source[self.start + 1..self.curr - 1];
        Ok(Lexeme::Token(TokenType::STRING(text.to_owned())))
    }

    fn number(&mut self) -> Lexeme {
        self.skip_digits();

        // A trailing `.` without digits is left for the next token.
        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            self.skip_digits();
        }

        // Only ASCII digits and at most one dot were consumed.
        let value: f64 = self.lexeme().parse().unwrap_or(0.0);
        Lexeme::Token(TokenType::NUMBER(value))
    }

    fn skip_digits(&mut self) {
        while self.peek_at(0).is_ascii_digit() {
            self.curr += 1;
        }
    }

    fn identifier(&mut self) -> Lexeme {
        while matches!(self.peek_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        let word = &self.bytes[self.start..self.curr];
        let token_type = KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        Lexeme::Token(token_type)
    }

    fn unexpected_character(&mut self) -> LoxError {
        // Swallow UTF‑8 continuation bytes so one character is one error.
        while self.peek_at(0) & 0b1100_0000 == 0b1000_0000 {
            self.curr += 1;
        }

        let c = self
            .lexeme()
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);

        LoxError::lex(self.line, format!("Unexpected character: {}", c))
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_lexeme() {
                Ok(Lexeme::Skip) => continue,

                Ok(Lexeme::Token(token_type)) => {
                    debug!("Scanned {:?} on line {}", token_type, self.line);

                    return Some(Ok(Token::new(token_type, self.lexeme(), self.line)));
                }

                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl FusedIterator for Scanner<'_> {}
