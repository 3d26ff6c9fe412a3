// Ferrule lexer -- tokenizer for the Ferrule programming language.

mod cursor;

use cursor::Cursor;
use ferrule_common::token::{keyword_from_str, Token, TokenKind};

/// The Ferrule lexer. Converts source text into a stream of tokens.
///
/// Wraps a [`Cursor`] for byte-level iteration and implements
/// `Iterator<Item = Token>` so callers can consume tokens lazily or
/// collect them into a `Vec`. The lexer is total: malformed input yields
/// [`TokenKind::Invalid`] tokens rather than errors, and every stream
/// ends with exactly one [`TokenKind::Eof`].
///
/// Whitespace and both comment forms (`//` line, `/* */` block) are
/// skipped; Ferrule has no significant newlines, so nothing is emitted
/// for them.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Produce the next token.
    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            // ── Single-character delimiters and punctuation ────────────
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),
            ':' => self.single_char_token(TokenKind::Colon, start),
            '@' => self.single_char_token(TokenKind::At, start),
            '#' => self.single_char_token(TokenKind::Hash, start),
            '~' => self.single_char_token(TokenKind::Tilde, start),
            '?' => self.single_char_token(TokenKind::Question, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '%' => self.single_char_token(TokenKind::Percent, start),
            '^' => self.single_char_token(TokenKind::Caret, start),

            // ── Multi-character operators (maximal munch) ──────────────
            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.lex_lt(start),
            '>' => self.lex_gt(start),
            '&' => self.lex_amp(start),
            '|' => self.lex_pipe(start),
            '+' => self.lex_plus(start),
            '-' => self.lex_minus(start),
            '.' => self.lex_dot(start),

            // `/` is either division or the start of a comment; comments
            // were already consumed by skip_trivia, so this is division.
            '/' => self.single_char_token(TokenKind::Slash, start),

            // ── Literals ───────────────────────────────────────────────
            '0'..='9' => self.lex_number(start),
            '"' => self.lex_string(start),
            '\'' => self.lex_char(start),

            // ── Identifiers, keywords, and the bytes-literal prefix ────
            c if is_ident_start(c) => self.lex_ident_or_bytes(start),

            // ── Unknown byte ───────────────────────────────────────────
            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Invalid, start, self.cursor.pos())
            }
        }
    }

    // ── Trivia ─────────────────────────────────────────────────────────

    /// Skip whitespace and comments. Unterminated block comments stop at
    /// EOF; the next token will be `Eof` and the parser reports nothing
    /// (the comment simply swallows the rest of the file).
    fn skip_trivia(&mut self) {
        loop {
            self.cursor
                .eat_while(|c| c == ' ' || c == '\t' || c == '\n' || c == '\r');

            if self.cursor.peek() == Some('/') {
                match self.cursor.peek_next() {
                    Some('/') => {
                        self.cursor.eat_while(|c| c != '\n');
                        continue;
                    }
                    Some('*') => {
                        self.cursor.advance(); // /
                        self.cursor.advance(); // *
                        loop {
                            match self.cursor.advance() {
                                None => return,
                                Some('*') if self.cursor.peek() == Some('/') => {
                                    self.cursor.advance();
                                    break;
                                }
                                Some(_) => {}
                            }
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            break;
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Consume one character and return a token of the given kind.
    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    // ── Operator lexing ────────────────────────────────────────────────

    /// `=` -> `Eq`, `==` -> `EqEq`, `=>` -> `FatArrow`
    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::EqEq
        } else if self.cursor.eat('>') {
            TokenKind::FatArrow
        } else {
            TokenKind::Eq
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `!` -> `Bang`, `!=` -> `NotEq`
    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::NotEq
        } else {
            TokenKind::Bang
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `<` -> `Lt`, `<=` -> `LtEq`, `<<` -> `Shl`
    fn lex_lt(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::LtEq
        } else if self.cursor.eat('<') {
            TokenKind::Shl
        } else {
            TokenKind::Lt
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `>` -> `Gt`, `>=` -> `GtEq`, `>>` -> `Shr`
    fn lex_gt(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::GtEq
        } else if self.cursor.eat('>') {
            TokenKind::Shr
        } else {
            TokenKind::Gt
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `&` -> `Amp`, `&&` -> `AmpAmp`
    fn lex_amp(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('&') {
            TokenKind::AmpAmp
        } else {
            TokenKind::Amp
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `|` -> `Pipe`, `||` -> `PipePipe`
    fn lex_pipe(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('|') {
            TokenKind::PipePipe
        } else {
            TokenKind::Pipe
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `+` -> `Plus`, `++` -> `PlusPlus`
    fn lex_plus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('+') {
            TokenKind::PlusPlus
        } else {
            TokenKind::Plus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `-` -> `Minus`, `->` -> `Arrow`
    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Minus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `.` -> `Dot`, `..` -> `DotDot`, `..=` -> `DotDotEq`
    fn lex_dot(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('.') {
            if self.cursor.eat('=') {
                TokenKind::DotDotEq
            } else {
                TokenKind::DotDot
            }
        } else {
            TokenKind::Dot
        };
        Token::new(kind, start, self.cursor.pos())
    }

    // ── Number literals ───────────────────────────────────────────────

    /// Lex a number literal starting with a digit.
    ///
    /// Decimal digits with an optional single fractional part. No radix
    /// prefixes and no exponents in the current language version. A `.`
    /// not followed by a digit is left for the range operator.
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance(); // .
            self.cursor.eat_while(|c| c.is_ascii_digit());
            return Token::new(TokenKind::FloatLiteral, start, self.cursor.pos());
        }

        Token::new(TokenKind::IntLiteral, start, self.cursor.pos())
    }

    // ── String, bytes, and char literals ──────────────────────────────

    /// Lex a string literal starting at the opening `"`.
    ///
    /// Escapes are passed through verbatim: `\` consumes the next
    /// character without interpretation. Hitting EOF before the closing
    /// quote produces an `Invalid` token.
    fn lex_string(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening "
        self.lex_string_rest(start, TokenKind::StringLiteral)
    }

    /// Scan string content after the opening quote.
    fn lex_string_rest(&mut self, start: u32, kind: TokenKind) -> Token {
        loop {
            match self.cursor.advance() {
                None => return Token::new(TokenKind::Invalid, start, self.cursor.pos()),
                Some('"') => return Token::new(kind, start, self.cursor.pos()),
                Some('\\') => {
                    // Escape passthrough: consume whatever follows.
                    self.cursor.advance();
                }
                Some(_) => {}
            }
        }
    }

    /// Lex a character literal: `'x'` or `'\n'`.
    ///
    /// One character, optionally escaped. A missing closing quote or an
    /// empty literal produces an `Invalid` token.
    fn lex_char(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening '

        match self.cursor.advance() {
            None | Some('\'') => {
                return Token::new(TokenKind::Invalid, start, self.cursor.pos());
            }
            Some('\\') => {
                self.cursor.advance();
            }
            Some(_) => {}
        }

        if self.cursor.peek() == Some('\'') {
            self.cursor.advance();
            Token::new(TokenKind::CharLiteral, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Invalid, start, self.cursor.pos())
        }
    }

    // ── Identifiers and keywords ──────────────────────────────────────

    /// Lex an identifier, keyword, or bytes literal (`b"..."`).
    fn lex_ident_or_bytes(&mut self, start: u32) -> Token {
        let first = self.cursor.advance().expect("caller checked ident start");

        // b"..." is a bytes literal, not an identifier.
        if first == 'b' && self.cursor.peek() == Some('"') {
            self.cursor.advance(); // opening "
            return self.lex_string_rest(start, TokenKind::BytesLiteral);
        }

        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        match keyword_from_str(text) {
            Some(kind) => Token::new(kind, start, self.cursor.pos()),
            None => Token::new(TokenKind::Ident, start, self.cursor.pos()),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn maximal_munch_shifts_before_comparisons() {
        assert_eq!(
            kinds("<< <= <"),
            vec![TokenKind::Shl, TokenKind::LtEq, TokenKind::Lt, TokenKind::Eof]
        );
    }

    #[test]
    fn triple_equals_is_not_a_token() {
        // `===` lexes as `==` then `=`.
        assert_eq!(kinds("==="), vec![TokenKind::EqEq, TokenKind::Eq, TokenKind::Eof]);
    }

    #[test]
    fn range_operators() {
        assert_eq!(
            kinds("0 .. 10 ..= 11"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::DotDot,
                TokenKind::IntLiteral,
                TokenKind::DotDotEq,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_dot_dot_is_a_range() {
        // `1..2` must not lex the `.` into a float.
        assert_eq!(
            kinds("1..2"),
            vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_byte_is_invalid_not_fatal() {
        assert_eq!(kinds("$"), vec![TokenKind::Invalid, TokenKind::Eof]);
    }
}
