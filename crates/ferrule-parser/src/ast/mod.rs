//! Typed AST layer on top of the rowan CST.
//!
//! The typed AST provides zero-cost wrappers around `SyntaxNode` with
//! typed accessor methods. Each wrapper holds a `SyntaxNode` and provides
//! methods to navigate to children by their kind, following the
//! rust-analyzer pattern.
//!
//! - [`AstNode`] trait: every typed wrapper implements `cast()` and
//!   `syntax()`.
//! - `ast_node!` macro: generates boilerplate for each wrapper type.
//! - `child_node()` / `child_nodes()` / `child_token()`: navigation
//!   helpers.
//!
//! The wrappers are newtype structs around `SyntaxNode`; `cast()` is a
//! single kind check and accessors walk the rowan tree directly. The
//! tree is immutable once built, and dropping the last wrapper releases
//! it in one refcounted teardown.

pub mod expr;
pub mod item;
pub mod pat;
pub mod ty;

use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Trait for typed AST nodes that wrap a rowan `SyntaxNode`.
pub trait AstNode: Sized {
    /// Try to cast a generic `SyntaxNode` into this typed AST node.
    ///
    /// Returns `Some(Self)` if the node's kind matches, `None` otherwise.
    fn cast(node: SyntaxNode) -> Option<Self>;

    /// Access the underlying `SyntaxNode`.
    fn syntax(&self) -> &SyntaxNode;
}

/// Generate boilerplate for a typed AST node wrapper.
macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub(crate) syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == SyntaxKind::$kind {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

pub(crate) use ast_node;

/// Find the first child node that can be cast to type `N`.
pub fn child_node<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

/// Find all child nodes that can be cast to type `N`.
pub fn child_nodes<'a, N: AstNode + 'a>(parent: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
    parent.children().filter_map(N::cast)
}

/// Find the first child token with the given kind.
pub fn child_token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|it| it.kind() == kind)
}

/// Find all child tokens with the given kind.
pub fn child_tokens(parent: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|it| it.kind() == kind)
        .collect()
}
