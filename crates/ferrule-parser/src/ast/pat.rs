//! Typed AST nodes for match patterns.

use crate::ast::item::Name;
use crate::ast::{ast_node, child_node, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any pattern node.
#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(WildcardPat),
    Ident(IdentPat),
    Literal(LiteralPat),
    Variant(VariantPat),
    Ok(OkPat),
    Err(ErrPat),
    Some(SomePat),
    None(NonePat),
}

impl Pattern {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::WILDCARD_PAT => Some(Pattern::Wildcard(WildcardPat { syntax: node })),
            SyntaxKind::IDENT_PAT => Some(Pattern::Ident(IdentPat { syntax: node })),
            SyntaxKind::LITERAL_PAT => Some(Pattern::Literal(LiteralPat { syntax: node })),
            SyntaxKind::VARIANT_PAT => Some(Pattern::Variant(VariantPat { syntax: node })),
            SyntaxKind::OK_PAT => Some(Pattern::Ok(OkPat { syntax: node })),
            SyntaxKind::ERR_PAT => Some(Pattern::Err(ErrPat { syntax: node })),
            SyntaxKind::SOME_PAT => Some(Pattern::Some(SomePat { syntax: node })),
            SyntaxKind::NONE_PAT => Some(Pattern::None(NonePat { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Pattern::Wildcard(n) => &n.syntax,
            Pattern::Ident(n) => &n.syntax,
            Pattern::Literal(n) => &n.syntax,
            Pattern::Variant(n) => &n.syntax,
            Pattern::Ok(n) => &n.syntax,
            Pattern::Err(n) => &n.syntax,
            Pattern::Some(n) => &n.syntax,
            Pattern::None(n) => &n.syntax,
        }
    }
}

ast_node!(WildcardPat, WILDCARD_PAT);

ast_node!(IdentPat, IDENT_PAT);

impl IdentPat {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::IDENT)
    }

    pub fn text(&self) -> String {
        self.ident_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

ast_node!(LiteralPat, LITERAL_PAT);

impl LiteralPat {
    /// The literal's token(s) rendered as text (covers `-42`).
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

ast_node!(VariantPat, VARIANT_PAT);

impl VariantPat {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// Field binding names inside `{ ... }`, in order.
    pub fn field_bindings(&self) -> Vec<SyntaxToken> {
        child_node::<PatFieldList>(&self.syntax)
            .map(|list| {
                list.syntax
                    .children()
                    .filter(|n| n.kind() == SyntaxKind::PAT_FIELD)
                    .filter_map(|n| {
                        n.children_with_tokens()
                            .filter_map(|it| it.into_token())
                            .find(|t| t.kind() == SyntaxKind::IDENT)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

ast_node!(PatFieldList, PAT_FIELD_LIST);

ast_node!(OkPat, OK_PAT);

impl OkPat {
    /// The bound name, if any (`ok v`).
    pub fn binding(&self) -> Option<Name> {
        child_node(&self.syntax)
    }
}

ast_node!(ErrPat, ERR_PAT);

impl ErrPat {
    /// The bound name, if any (`err e`).
    pub fn binding(&self) -> Option<Name> {
        child_node(&self.syntax)
    }
}

ast_node!(SomePat, SOME_PAT);

impl SomePat {
    /// The bound name, if any (`Some x`).
    pub fn binding(&self) -> Option<Name> {
        child_node(&self.syntax)
    }
}

ast_node!(NonePat, NONE_PAT);
