//! Rowan-based concrete syntax tree types for Ferrule.
//!
//! Defines the `FerruleLanguage` marker type that connects [`SyntaxKind`]
//! to rowan's generic tree infrastructure, plus type aliases for
//! convenience.

use crate::syntax_kind::SyntaxKind;

/// Marker type for Ferrule's language in rowan's generic tree system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FerruleLanguage {}

impl rowan::Language for FerruleLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Safety: SyntaxKind is #[repr(u16)] and rowan only stores kinds
        // we previously gave it via kind_to_raw.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

/// A CST node (interior node with children).
pub type SyntaxNode = rowan::SyntaxNode<FerruleLanguage>;

/// A CST token (leaf node with text).
pub type SyntaxToken = rowan::SyntaxToken<FerruleLanguage>;

/// Either a node or a token in the CST.
pub type SyntaxElement = rowan::SyntaxElement<FerruleLanguage>;
