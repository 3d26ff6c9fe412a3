//! Typed AST nodes for expressions.
//!
//! Covers all expression forms: literals, name references, binary/unary
//! operators, calls, field access, indexing, array and record literals,
//! variant constructors, ranges, the error-handling forms (`ok`, `err`,
//! `check`, `ensure`, `map_error`), match expressions, anonymous
//! functions, `unsafe_cast`, `comptime`, `context` blocks, parenthesized
//! expressions, and blocks.

use crate::ast::item::{Block, Name, ParamList, RetType};
use crate::ast::pat::Pattern;
use crate::ast::ty::Type;
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Expr enum ────────────────────────────────────────────────────────────

/// Any expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    FieldAccess(FieldAccess),
    Index(IndexExpr),
    ArrayLiteral(ArrayLiteral),
    RecordLiteral(RecordLiteral),
    VariantCtor(VariantCtor),
    Range(RangeExpr),
    Ok(OkExpr),
    Err(ErrExpr),
    Check(CheckExpr),
    Ensure(EnsureExpr),
    MapError(MapErrorExpr),
    Match(MatchExpr),
    AnonFn(AnonFnExpr),
    UnsafeCast(UnsafeCastExpr),
    Comptime(ComptimeExpr),
    Context(ContextExpr),
    Paren(ParenExpr),
    Block(Block),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::LITERAL => Some(Expr::Literal(Literal { syntax: node })),
            SyntaxKind::NAME_REF => Some(Expr::NameRef(NameRef { syntax: node })),
            SyntaxKind::BINARY_EXPR => Some(Expr::Binary(BinaryExpr { syntax: node })),
            SyntaxKind::UNARY_EXPR => Some(Expr::Unary(UnaryExpr { syntax: node })),
            SyntaxKind::CALL_EXPR => Some(Expr::Call(CallExpr { syntax: node })),
            SyntaxKind::FIELD_ACCESS => Some(Expr::FieldAccess(FieldAccess { syntax: node })),
            SyntaxKind::INDEX_EXPR => Some(Expr::Index(IndexExpr { syntax: node })),
            SyntaxKind::ARRAY_LITERAL => {
                Some(Expr::ArrayLiteral(ArrayLiteral { syntax: node }))
            }
            SyntaxKind::RECORD_LITERAL => {
                Some(Expr::RecordLiteral(RecordLiteral { syntax: node }))
            }
            SyntaxKind::VARIANT_CTOR => Some(Expr::VariantCtor(VariantCtor { syntax: node })),
            SyntaxKind::RANGE_EXPR => Some(Expr::Range(RangeExpr { syntax: node })),
            SyntaxKind::OK_EXPR => Some(Expr::Ok(OkExpr { syntax: node })),
            SyntaxKind::ERR_EXPR => Some(Expr::Err(ErrExpr { syntax: node })),
            SyntaxKind::CHECK_EXPR => Some(Expr::Check(CheckExpr { syntax: node })),
            SyntaxKind::ENSURE_EXPR => Some(Expr::Ensure(EnsureExpr { syntax: node })),
            SyntaxKind::MAP_ERROR_EXPR => {
                Some(Expr::MapError(MapErrorExpr { syntax: node }))
            }
            SyntaxKind::MATCH_EXPR => Some(Expr::Match(MatchExpr { syntax: node })),
            SyntaxKind::ANON_FN_EXPR => Some(Expr::AnonFn(AnonFnExpr { syntax: node })),
            SyntaxKind::UNSAFE_CAST_EXPR => {
                Some(Expr::UnsafeCast(UnsafeCastExpr { syntax: node }))
            }
            SyntaxKind::COMPTIME_EXPR => Some(Expr::Comptime(ComptimeExpr { syntax: node })),
            SyntaxKind::CONTEXT_EXPR => Some(Expr::Context(ContextExpr { syntax: node })),
            SyntaxKind::PAREN_EXPR => Some(Expr::Paren(ParenExpr { syntax: node })),
            SyntaxKind::BLOCK => Some(Expr::Block(Block { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => &n.syntax,
            Expr::NameRef(n) => &n.syntax,
            Expr::Binary(n) => &n.syntax,
            Expr::Unary(n) => &n.syntax,
            Expr::Call(n) => &n.syntax,
            Expr::FieldAccess(n) => &n.syntax,
            Expr::Index(n) => &n.syntax,
            Expr::ArrayLiteral(n) => &n.syntax,
            Expr::RecordLiteral(n) => &n.syntax,
            Expr::VariantCtor(n) => &n.syntax,
            Expr::Range(n) => &n.syntax,
            Expr::Ok(n) => &n.syntax,
            Expr::Err(n) => &n.syntax,
            Expr::Check(n) => &n.syntax,
            Expr::Ensure(n) => &n.syntax,
            Expr::MapError(n) => &n.syntax,
            Expr::Match(n) => &n.syntax,
            Expr::AnonFn(n) => &n.syntax,
            Expr::UnsafeCast(n) => &n.syntax,
            Expr::Comptime(n) => &n.syntax,
            Expr::Context(n) => &n.syntax,
            Expr::Paren(n) => &n.syntax,
            Expr::Block(n) => AstNode::syntax(n),
        }
    }

    /// The best source range for error reporting on this expression.
    pub fn text_range(&self) -> rowan::TextRange {
        self.syntax().text_range()
    }
}

// ── Literal ──────────────────────────────────────────────────────────────

/// What a literal expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    String,
    Bytes,
    Char,
    Bool,
    Null,
    Unit,
}

ast_node!(Literal, LITERAL);

impl Literal {
    /// The literal's token (absent only for the `()` unit form, which
    /// holds two paren tokens).
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .next()
    }

    /// Classify the literal.
    pub fn kind(&self) -> LiteralKind {
        match self.token().map(|t| t.kind()) {
            Some(SyntaxKind::INT_LITERAL) => LiteralKind::Int,
            Some(SyntaxKind::FLOAT_LITERAL) => LiteralKind::Float,
            Some(SyntaxKind::STRING_LITERAL) => LiteralKind::String,
            Some(SyntaxKind::BYTES_LITERAL) => LiteralKind::Bytes,
            Some(SyntaxKind::CHAR_LITERAL) => LiteralKind::Char,
            Some(SyntaxKind::TRUE_KW) | Some(SyntaxKind::FALSE_KW) => LiteralKind::Bool,
            Some(SyntaxKind::NULL_KW) => LiteralKind::Null,
            // `unit` keyword or the `(` of a `()` literal.
            _ => LiteralKind::Unit,
        }
    }
}

// ── Name Reference ───────────────────────────────────────────────────────

ast_node!(NameRef, NAME_REF);

impl NameRef {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn text(&self) -> String {
        self.ident_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

// ── Binary and unary ─────────────────────────────────────────────────────

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    /// The operator token.
    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| is_binary_op(t.kind()))
    }
}

/// Whether a kind is a binary operator token.
fn is_binary_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PLUS
            | SyntaxKind::MINUS
            | SyntaxKind::STAR
            | SyntaxKind::SLASH
            | SyntaxKind::PERCENT
            | SyntaxKind::PLUS_PLUS
            | SyntaxKind::EQ_EQ
            | SyntaxKind::NOT_EQ
            | SyntaxKind::LT
            | SyntaxKind::GT
            | SyntaxKind::LT_EQ
            | SyntaxKind::GT_EQ
            | SyntaxKind::AMP_AMP
            | SyntaxKind::PIPE_PIPE
            | SyntaxKind::AMP
            | SyntaxKind::PIPE
            | SyntaxKind::CARET
            | SyntaxKind::SHL
            | SyntaxKind::SHR
    )
}

ast_node!(UnaryExpr, UNARY_EXPR);

impl UnaryExpr {
    /// The operator token (`-`, `!`, or `~`).
    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::MINUS | SyntaxKind::BANG | SyntaxKind::TILDE
                )
            })
    }

    pub fn operand(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Calls, field access, indexing ────────────────────────────────────────

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    /// The called expression.
    pub fn callee(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The call arguments, in order.
    pub fn args(&self) -> Vec<Expr> {
        child_node::<ArgList>(&self.syntax)
            .map(|list| list.syntax.children().filter_map(Expr::cast).collect())
            .unwrap_or_default()
    }
}

ast_node!(ArgList, ARG_LIST);

ast_node!(FieldAccess, FIELD_ACCESS);

impl FieldAccess {
    pub fn base(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The accessed field name.
    pub fn field_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    pub fn base(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn index(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }
}

// ── Aggregate literals ───────────────────────────────────────────────────

ast_node!(ArrayLiteral, ARRAY_LITERAL);

impl ArrayLiteral {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(RecordLiteral, RECORD_LITERAL);

impl RecordLiteral {
    pub fn fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(RecordField, RECORD_FIELD);

impl RecordField {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(VariantCtor, VARIANT_CTOR);

impl VariantCtor {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        child_nodes(&self.syntax)
    }
}

// ── Ranges ───────────────────────────────────────────────────────────────

ast_node!(RangeExpr, RANGE_EXPR);

impl RangeExpr {
    pub fn start(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn end(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    /// Whether the range is inclusive (`..=`).
    pub fn is_inclusive(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::DOT_DOT_EQ).is_some()
    }
}

// ── Error-handling forms ─────────────────────────────────────────────────

ast_node!(OkExpr, OK_EXPR);

impl OkExpr {
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ErrExpr, ERR_EXPR);

impl ErrExpr {
    /// The error variant constructor.
    pub fn ctor(&self) -> Option<VariantCtor> {
        child_node(&self.syntax)
    }
}

ast_node!(CheckExpr, CHECK_EXPR);

impl CheckExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(EnsureExpr, ENSURE_EXPR);

impl EnsureExpr {
    /// The guarded condition.
    pub fn condition(&self) -> Option<Expr> {
        self.syntax
            .children()
            .filter(|n| n.kind() != SyntaxKind::ERR_EXPR)
            .find_map(Expr::cast)
    }

    /// The `err ...` expression after `else`.
    pub fn err_expr(&self) -> Option<ErrExpr> {
        child_node(&self.syntax)
    }
}

ast_node!(MapErrorExpr, MAP_ERROR_EXPR);

impl MapErrorExpr {
    /// The mapped expression.
    pub fn inner(&self) -> Option<Expr> {
        self.syntax
            .children()
            .filter(|n| n.kind() != SyntaxKind::ANON_FN_EXPR)
            .find_map(Expr::cast)
    }

    /// The `x => expr` transform.
    pub fn transform(&self) -> Option<AnonFnExpr> {
        child_node(&self.syntax)
    }
}

// ── Match ────────────────────────────────────────────────────────────────

ast_node!(MatchExpr, MATCH_EXPR);

impl MatchExpr {
    pub fn scrutinee(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn arms(&self) -> impl Iterator<Item = MatchArm> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(MatchArm, MATCH_ARM);

impl MatchArm {
    pub fn pattern(&self) -> Option<Pattern> {
        self.syntax.children().find_map(Pattern::cast)
    }

    /// The arm body expression (right of `->`).
    pub fn body(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Anonymous functions ──────────────────────────────────────────────────

ast_node!(AnonFnExpr, ANON_FN_EXPR);

impl AnonFnExpr {
    /// The parameter list of the keyword-led form
    /// (`function (a: i32) -> i32 { ... }`).
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    /// The single parameter of the arrow form (`x => expr`).
    pub fn arrow_param(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn ret_type(&self) -> Option<RetType> {
        child_node(&self.syntax)
    }

    /// The block body of the keyword-led form.
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The expression body of the arrow form.
    pub fn arrow_body(&self) -> Option<Expr> {
        self.syntax
            .children()
            .filter(|n| n.kind() != SyntaxKind::BLOCK)
            .find_map(Expr::cast)
    }
}

// ── Casts and staged evaluation ──────────────────────────────────────────

ast_node!(UnsafeCastExpr, UNSAFE_CAST_EXPR);

impl UnsafeCastExpr {
    /// The target type between the angle brackets.
    pub fn target_ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }

    pub fn inner(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ComptimeExpr, COMPTIME_EXPR);

impl ComptimeExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(ContextExpr, CONTEXT_EXPR);

impl ContextExpr {
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}
