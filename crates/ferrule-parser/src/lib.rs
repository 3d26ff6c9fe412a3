//! Ferrule parser: recursive descent parser producing a rowan-based CST.
//!
//! This crate transforms the token stream from `ferrule-lexer` into a
//! lossless concrete syntax tree (CST) using the `rowan` library, then
//! exposes a typed AST layer over it. The parser is fail-fast: the first
//! syntactic failure ends the parse, and `errors` holds at most one
//! [`ParseError`]. All events produced up to the failure still fold into
//! a green tree, so every allocation stays owned by the tree.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Ferrule source file.
///
/// Contains the green tree (the immutable, cheap-to-clone CST) and any
/// parse errors encountered.
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// The typed view of the root node.
    pub fn source_file(&self) -> ast::item::SourceFile {
        ast::item::SourceFile::cast_root(self.syntax())
    }

    /// Parse errors encountered during parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Ferrule source file into a CST.
///
/// This is the main entry point for the parser. It lexes the source,
/// parses the token stream, and returns a [`Parse`] result containing
/// the syntax tree and any errors.
pub fn parse(source: &str) -> Parse {
    let tokens = ferrule_lexer::Lexer::tokenize(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, errors) = p.build_tree();
    Parse { green, errors }
}
