//! Event-based parser for Ferrule.
//!
//! The parser consumes a token stream and produces events (Open/Close/
//! Advance) that are later converted into a rowan green tree. This
//! decouples parsing logic from tree construction.
//!
//! # Architecture
//!
//! The parser uses matklad's event-based approach (as in rust-analyzer):
//!
//! 1. Parse functions call `open()` to start a node, `advance()` to
//!    consume tokens, and `close()` to finish a node with its actual kind.
//! 2. Events are collected into a flat `Vec<Event>`.
//! 3. `build_tree()` converts events into a rowan `GreenNode`.
//!
//! The `open_before()` method enables wrapping a previously completed
//! node (e.g., turning `ident` into `call_expr(ident, arg_list)`) using
//! the "forward parent" technique.
//!
//! Ferrule terminates statements with `;` and the lexer drops whitespace
//! and comments entirely, so the token stream contains no trivia and no
//! significant newlines. Lookahead is a plain index walk.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod patterns;
pub(crate) mod types;

use ferrule_common::span::Span;
use ferrule_common::token::Token;

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

/// A parser event. Events are collected during parsing and later
/// converted into a rowan green tree by [`Parser::build_tree`].
#[derive(Debug)]
enum Event {
    /// Start a new CST node. The `kind` is initially TOMBSTONE and gets
    /// patched by `close()` with the real node kind.
    ///
    /// `forward_parent` is used by `open_before()` to indicate that this
    /// node should be opened before the node at the specified event index.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    /// Finish the current CST node.
    Close,
    /// Consume the current token, advancing the token position.
    Advance,
}

/// An opaque marker for a started but not-yet-closed CST node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// An opaque marker for a completed (opened and closed) CST node.
/// Used by `open_before()` to wrap a previously completed node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

/// Event-based parser for Ferrule source code.
pub(crate) struct Parser<'src> {
    /// All tokens from the lexer (including Eof).
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Collected parser events.
    events: Vec<Event>,
    /// Original source text (for extracting token text via spans).
    source: &'src str,
    /// Collected parse errors.
    errors: Vec<ParseError>,
    /// Whether an error has been encountered (first-error-only strategy).
    has_error: bool,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source text.
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
            has_error: false,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Returns the SyntaxKind of the current token, or `EOF` past the end.
    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Returns the SyntaxKind of the Nth token ahead. `nth(0)` is
    /// equivalent to `current()`.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        match self.tokens.get(self.pos + n) {
            Some(token) => SyntaxKind::from(token.kind),
            None => SyntaxKind::EOF,
        }
    }

    /// Returns the text of the current token.
    pub(crate) fn current_text(&self) -> &str {
        self.nth_text(0)
    }

    /// Returns the text of the Nth token ahead.
    pub(crate) fn nth_text(&self, n: usize) -> &str {
        match self.tokens.get(self.pos + n) {
            Some(token) => {
                &self.source[token.span.start as usize..token.span.end as usize]
            }
            None => "",
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => {
                // Past end: zero-length span at end of source.
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }

    /// Check if the current token matches the given kind.
    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    // ── Mutation: node management ──────────────────────────────────────

    /// Start a new CST node. Returns a marker that must be passed to
    /// `close()` to finish the node.
    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a new CST node BEFORE a previously completed node.
    ///
    /// Used for postfix wrapping: after parsing `ident` we may discover it
    /// is actually `ident(args)`. Uses the "forward parent" technique so
    /// event indices stay stable.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    /// Close a CST node, patching its Open event with the actual kind.
    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open { kind: slot_kind, .. } = &mut self.events[m.index] {
            *slot_kind = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Mutation: token consumption ────────────────────────────────────

    /// Consume the current token.
    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// If the current token matches `kind`, consume it and return true.
    /// Otherwise, emit an error and return false. Sets the error flag.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!(
                "expected {}, found {}",
                describe(kind),
                describe(self.current())
            ));
            false
        }
    }

    /// If the current token matches `kind`, consume it and return true.
    /// Otherwise, return false (no error emitted).
    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Error reporting ────────────────────────────────────────────────

    /// Record a parse error at the current position. Sets the error flag;
    /// parse functions check `has_error()` and bail, so only the first
    /// syntactic failure is reported.
    pub(crate) fn error(&mut self, message: &str) {
        if self.has_error {
            return;
        }
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.has_error = true;
    }

    /// Record a parse error with a related span for additional context.
    pub(crate) fn error_with_related(
        &mut self,
        message: &str,
        related_span: Span,
        related_msg: &str,
    ) {
        if self.has_error {
            return;
        }
        let span = self.current_span();
        self.errors
            .push(ParseError::with_related(message, span, related_msg, related_span));
        self.has_error = true;
    }

    /// Whether the parser has encountered an error.
    pub(crate) fn has_error(&self) -> bool {
        self.has_error
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert collected events into a rowan `GreenNode` and errors.
    ///
    /// This consumes the parser. Forward parents are resolved by walking
    /// the chain, opening wrappers outermost-first, and tombstoning the
    /// chain entries so they are skipped when reached in order.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut token_pos: usize = 0;
        let mut forward_parents: Vec<(usize, SyntaxKind)> = Vec::new();

        let mut i = 0;
        while i < self.events.len() {
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent,
                } => {
                    if forward_parent.is_some() {
                        forward_parents.clear();
                        let mut current = i;
                        loop {
                            let (fk, fp) = match self.events[current] {
                                Event::Open {
                                    kind,
                                    forward_parent,
                                } => (kind, forward_parent),
                                _ => unreachable!(),
                            };
                            forward_parents.push((current, fk));
                            match fp {
                                Some(next) => current = next,
                                None => break,
                            }
                        }

                        // Tombstone the wrapper Open events so they are
                        // skipped when reached later in order.
                        for &(fp_idx, _) in forward_parents.iter().skip(1) {
                            if let Event::Open {
                                ref mut kind,
                                ref mut forward_parent,
                            } = self.events[fp_idx]
                            {
                                *kind = SyntaxKind::TOMBSTONE;
                                *forward_parent = None;
                            }
                        }
                        if let Event::Open {
                            ref mut forward_parent,
                            ..
                        } = self.events[i]
                        {
                            *forward_parent = None;
                        }

                        // Open nodes outermost wrapper first.
                        for &(_, fk) in forward_parents.iter().rev() {
                            if fk != SyntaxKind::TOMBSTONE {
                                builder.start_node(rowan::SyntaxKind(fk as u16));
                            }
                        }
                    } else if kind != SyntaxKind::TOMBSTONE {
                        builder.start_node(rowan::SyntaxKind(kind as u16));
                    }
                }
                Event::Close => {
                    builder.finish_node();
                }
                Event::Advance => {
                    if token_pos < self.tokens.len() {
                        let token = &self.tokens[token_pos];
                        let syntax_kind = SyntaxKind::from(token.kind);
                        let text =
                            &self.source[token.span.start as usize..token.span.end as usize];
                        builder.token(rowan::SyntaxKind(syntax_kind as u16), text);
                        token_pos += 1;
                    }
                }
            }
            i += 1;
        }

        (builder.finish(), self.errors)
    }
}

/// Human-readable description of a syntax kind for error messages.
fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::IDENT => "an identifier",
        SyntaxKind::EOF => "end of file",
        SyntaxKind::L_PAREN => "`(`",
        SyntaxKind::R_PAREN => "`)`",
        SyntaxKind::L_BRACE => "`{`",
        SyntaxKind::R_BRACE => "`}`",
        SyntaxKind::L_BRACKET => "`[`",
        SyntaxKind::R_BRACKET => "`]`",
        SyntaxKind::COMMA => "`,`",
        SyntaxKind::SEMICOLON => "`;`",
        SyntaxKind::COLON => "`:`",
        SyntaxKind::DOT => "`.`",
        SyntaxKind::EQ => "`=`",
        SyntaxKind::ARROW => "`->`",
        SyntaxKind::FAT_ARROW => "`=>`",
        SyntaxKind::LT => "`<`",
        SyntaxKind::GT => "`>`",
        SyntaxKind::PIPE => "`|`",
        SyntaxKind::INT_LITERAL => "an integer literal",
        SyntaxKind::STRING_LITERAL => "a string literal",
        SyntaxKind::ELSE_KW => "`else`",
        SyntaxKind::ERR_KW => "`err`",
        SyntaxKind::IN_KW => "`in`",
        SyntaxKind::USING_KW => "`using`",
        SyntaxKind::CAPABILITY_KW => "`capability`",
        SyntaxKind::INVALID => "invalid input",
        _ => "a different token",
    }
}

// ── Top-level parsing ──────────────────────────────────────────────────

/// Parse a complete source file.
///
/// Module = [PackageDecl] { ImportDecl } { TopDecl }. The parser stops at
/// the first syntactic failure; remaining tokens are consumed unparsed so
/// the green tree still covers the whole input.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();

    if p.at(SyntaxKind::PACKAGE_KW) {
        items::parse_package_decl(p);
    }

    while p.at(SyntaxKind::IMPORT_KW) && !p.has_error() {
        items::parse_import_decl(p);
    }

    while !p.at(SyntaxKind::EOF) && !p.has_error() {
        items::parse_top_decl(p);
    }

    // Consume remaining tokens (including EOF) so spans stay intact.
    while !p.at(SyntaxKind::EOF) {
        p.advance();
    }
    p.advance(); // EOF

    p.close(root, SyntaxKind::SOURCE_FILE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrule_lexer::Lexer;

    #[test]
    fn smoke_test_parser_produces_green_node() {
        let source = "var x: i32 = 5;";
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens, source);

        let root = parser.open();
        let decl = parser.open();
        for _ in 0..6 {
            parser.advance(); // var x : i32 = 5
        }
        parser.advance(); // ;
        parser.close(decl, SyntaxKind::VAR_DECL);
        parser.advance(); // Eof
        parser.close(root, SyntaxKind::SOURCE_FILE);

        let (green, errors) = parser.build_tree();
        assert!(errors.is_empty(), "expected no errors: {errors:?}");

        let root_node = crate::cst::SyntaxNode::new_root(green);
        assert_eq!(root_node.kind(), SyntaxKind::SOURCE_FILE);

        let children: Vec<_> = root_node.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), SyntaxKind::VAR_DECL);
    }

    #[test]
    fn parser_expect_success_and_failure() {
        let source = "const x";
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens, source);

        let root = parser.open();
        assert!(parser.expect(SyntaxKind::CONST_KW));
        assert!(!parser.has_error());

        assert!(!parser.expect(SyntaxKind::CONST_KW));
        assert!(parser.has_error());

        parser.advance(); // x
        parser.advance(); // Eof
        parser.close(root, SyntaxKind::SOURCE_FILE);

        let (_green, errors) = parser.build_tree();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn parser_only_first_error_is_recorded() {
        let source = "@ @";
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens, source);

        parser.error("first");
        parser.error("second");
        assert_eq!(parser.errors.len(), 1);
        assert_eq!(parser.errors[0].message, "first");
    }

    #[test]
    fn parser_open_before_wraps_completed_node() {
        let source = "f(42)";
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens, source);

        let root = parser.open();

        let name = parser.open();
        parser.advance(); // f
        let name_closed = parser.close(name, SyntaxKind::NAME_REF);

        let call = parser.open_before(name_closed);
        parser.advance(); // (
        parser.advance(); // 42
        parser.advance(); // )
        parser.close(call, SyntaxKind::CALL_EXPR);

        parser.advance(); // Eof
        parser.close(root, SyntaxKind::SOURCE_FILE);

        let (green, errors) = parser.build_tree();
        assert!(errors.is_empty());

        let root_node = crate::cst::SyntaxNode::new_root(green);
        let call_node = root_node.children().next().unwrap();
        assert_eq!(call_node.kind(), SyntaxKind::CALL_EXPR);
        let name_ref = call_node.children().next().unwrap();
        assert_eq!(name_ref.kind(), SyntaxKind::NAME_REF);
    }

    #[test]
    fn parser_lookahead_and_text() {
        let source = "import io;";
        let tokens = Lexer::tokenize(source);
        let parser = Parser::new(tokens, source);

        assert_eq!(parser.current(), SyntaxKind::IMPORT_KW);
        assert_eq!(parser.nth(1), SyntaxKind::IDENT);
        assert_eq!(parser.nth_text(1), "io");
        assert_eq!(parser.nth(2), SyntaxKind::SEMICOLON);
        assert_eq!(parser.nth(99), SyntaxKind::EOF);
    }
}
