//! Typed AST nodes for type expressions.
//!
//! Type expressions are the syntactic form; the semantic crate resolves
//! them into interned resolved types.

use crate::ast::item::{Name, VariantDef, VariantField};
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any type expression node.
#[derive(Debug, Clone)]
pub enum Type {
    Simple(SimpleType),
    Generic(GenericType),
    Record(RecordType),
    Union(UnionType),
    Nullable(NullableType),
    Unit(UnitType),
}

impl Type {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::SIMPLE_TYPE => Some(Type::Simple(SimpleType { syntax: node })),
            SyntaxKind::GENERIC_TYPE => Some(Type::Generic(GenericType { syntax: node })),
            SyntaxKind::RECORD_TYPE => Some(Type::Record(RecordType { syntax: node })),
            SyntaxKind::UNION_TYPE => Some(Type::Union(UnionType { syntax: node })),
            SyntaxKind::NULLABLE_TYPE => Some(Type::Nullable(NullableType { syntax: node })),
            SyntaxKind::UNIT_TYPE => Some(Type::Unit(UnitType { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Type::Simple(n) => &n.syntax,
            Type::Generic(n) => &n.syntax,
            Type::Record(n) => &n.syntax,
            Type::Union(n) => &n.syntax,
            Type::Nullable(n) => &n.syntax,
            Type::Unit(n) => &n.syntax,
        }
    }
}

ast_node!(SimpleType, SIMPLE_TYPE);

impl SimpleType {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn text(&self) -> String {
        self.ident_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

ast_node!(GenericType, GENERIC_TYPE);

impl GenericType {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn args(&self) -> Vec<TypeArg> {
        child_node::<TypeArgList>(&self.syntax)
            .map(|list| list.syntax.children().filter_map(TypeArg::cast).collect())
            .unwrap_or_default()
    }
}

ast_node!(TypeArgList, TYPE_ARG_LIST);

ast_node!(TypeArg, TYPE_ARG);

impl TypeArg {
    /// Whether the argument carries the contextual `mut` marker
    /// (`View<mut u8>`).
    pub fn is_mut(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::IDENT && t.text() == "mut")
    }

    /// The const-generic integer value, for arguments like `8` in
    /// `Array<i32, 8>`.
    pub fn const_value(&self) -> Option<u64> {
        child_token(&self.syntax, SyntaxKind::INT_LITERAL)
            .and_then(|t| t.text().parse().ok())
    }

    /// The argument's type expression, when it is not a const value.
    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

ast_node!(RecordType, RECORD_TYPE);

impl RecordType {
    pub fn fields(&self) -> impl Iterator<Item = VariantField> + '_ {
        self.syntax
            .children()
            .flat_map(|n| n.children().collect::<Vec<_>>())
            .filter_map(VariantField::cast)
    }
}

ast_node!(UnionType, UNION_TYPE);

impl UnionType {
    pub fn variants(&self) -> impl Iterator<Item = VariantDef> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(NullableType, NULLABLE_TYPE);

impl NullableType {
    /// The wrapped type.
    pub fn inner(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

ast_node!(UnitType, UNIT_TYPE);
