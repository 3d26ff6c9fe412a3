//! Small shared helpers for the analysis passes.

use ferrule_common::span::Span;
use ferrule_parser::{SyntaxNode, SyntaxToken};
use rowan::TextRange;

/// Convert a rowan text range to a byte-offset span.
pub fn range_span(range: TextRange) -> Span {
    Span::new(range.start().into(), range.end().into())
}

/// The span of a CST node.
pub fn node_span(node: &SyntaxNode) -> Span {
    range_span(node.text_range())
}

/// The span of a CST token.
pub fn token_span(token: &SyntaxToken) -> Span {
    range_span(token.text_range())
}
