//! Typed AST nodes for module structure, declarations, and statements.
//!
//! Covers: SourceFile, PackageDecl, ImportDecl, FnDecl and its clause
//! nodes, TypeDecl, ErrorDecl, DomainDecl, ConstDecl, VarDecl,
//! UseErrorDecl, Block, and every statement form.

use crate::ast::expr::Expr;
use crate::ast::ty::Type;
use crate::ast::{ast_node, child_node, child_nodes, child_token, child_tokens, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Source File ──────────────────────────────────────────────────────────

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    /// Cast the root node; panics if the root is not a SOURCE_FILE.
    pub fn cast_root(node: SyntaxNode) -> SourceFile {
        Self::cast(node).expect("parse root must be a SOURCE_FILE")
    }

    /// The package declaration, if present.
    pub fn package_decl(&self) -> Option<PackageDecl> {
        child_node(&self.syntax)
    }

    /// All import declarations, in order.
    pub fn imports(&self) -> impl Iterator<Item = ImportDecl> + '_ {
        child_nodes(&self.syntax)
    }

    /// All top-level declarations, in order.
    pub fn decls(&self) -> impl Iterator<Item = Item> + '_ {
        self.syntax.children().filter_map(Item::cast)
    }
}

// ── Item enum ────────────────────────────────────────────────────────────

/// Any top-level declaration.
#[derive(Debug, Clone)]
pub enum Item {
    FnDecl(FnDecl),
    TypeDecl(TypeDecl),
    ErrorDecl(ErrorDecl),
    DomainDecl(DomainDecl),
    ConstDecl(ConstDecl),
    UseErrorDecl(UseErrorDecl),
}

impl Item {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::FN_DECL => Some(Item::FnDecl(FnDecl { syntax: node })),
            SyntaxKind::TYPE_DECL => Some(Item::TypeDecl(TypeDecl { syntax: node })),
            SyntaxKind::ERROR_DECL => Some(Item::ErrorDecl(ErrorDecl { syntax: node })),
            SyntaxKind::DOMAIN_DECL => Some(Item::DomainDecl(DomainDecl { syntax: node })),
            SyntaxKind::CONST_DECL => Some(Item::ConstDecl(ConstDecl { syntax: node })),
            SyntaxKind::USE_ERROR_DECL => {
                Some(Item::UseErrorDecl(UseErrorDecl { syntax: node }))
            }
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Item::FnDecl(n) => &n.syntax,
            Item::TypeDecl(n) => &n.syntax,
            Item::ErrorDecl(n) => &n.syntax,
            Item::DomainDecl(n) => &n.syntax,
            Item::ConstDecl(n) => &n.syntax,
            Item::UseErrorDecl(n) => &n.syntax,
        }
    }
}

// ── Names ────────────────────────────────────────────────────────────────

ast_node!(Name, NAME);

impl Name {
    /// The identifier token.
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The name as text; empty if the identifier is missing.
    pub fn text(&self) -> String {
        self.ident_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

// ── Module header ────────────────────────────────────────────────────────

ast_node!(PackageDecl, PACKAGE_DECL);

impl PackageDecl {
    pub fn dotted_name(&self) -> Option<DottedName> {
        child_node(&self.syntax)
    }
}

ast_node!(DottedName, DOTTED_NAME);

impl DottedName {
    /// The full dotted path as written, e.g. `app.core`.
    pub fn text(&self) -> String {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .map(|t| t.text().to_string())
            .collect()
    }
}

ast_node!(ImportDecl, IMPORT_DECL);

impl ImportDecl {
    /// The imported module path.
    pub fn source(&self) -> Option<DottedName> {
        child_node(&self.syntax)
    }

    /// The imported names.
    pub fn items(&self) -> impl Iterator<Item = ImportItem> + '_ {
        child_node::<ImportList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.syntax.children().collect::<Vec<_>>())
            .filter_map(ImportItem::cast)
    }

    /// The capability named in a `using capability C` clause.
    pub fn capability_token(&self) -> Option<SyntaxToken> {
        child_node::<CapabilityClause>(&self.syntax)
            .and_then(|c| child_token(&c.syntax, SyntaxKind::IDENT))
    }
}

ast_node!(ImportList, IMPORT_LIST);

ast_node!(ImportItem, IMPORT_ITEM);

impl ImportItem {
    /// The imported name.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The rename after `as`, if present.
    pub fn alias_token(&self) -> Option<SyntaxToken> {
        child_tokens(&self.syntax, SyntaxKind::IDENT).into_iter().nth(1)
    }
}

ast_node!(CapabilityClause, CAPABILITY_CLAUSE);

// ── Function declaration ─────────────────────────────────────────────────

ast_node!(FnDecl, FN_DECL);

impl FnDecl {
    /// The function name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// Generic type parameter identifiers, in order.
    pub fn type_params(&self) -> Vec<SyntaxToken> {
        child_node::<TypeParamList>(&self.syntax)
            .map(|list| {
                list.syntax
                    .children()
                    .filter_map(TypeParam::cast)
                    .filter_map(|tp| tp.ident_token())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The parameter list node.
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    /// All parameters, in order.
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        self.param_list()
            .into_iter()
            .flat_map(|list| list.syntax.children().collect::<Vec<_>>())
            .filter_map(Param::cast)
    }

    /// The declared return type.
    pub fn ret_type(&self) -> Option<RetType> {
        child_node(&self.syntax)
    }

    /// The `error D` clause, if present.
    pub fn error_clause(&self) -> Option<ErrorClause> {
        child_node(&self.syntax)
    }

    /// The `effects [..]` clause, if present.
    pub fn effects_clause(&self) -> Option<EffectsClause> {
        child_node(&self.syntax)
    }

    /// The function body.
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// Whether the declaration carries `pub`.
    pub fn is_pub(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::PUB_KW).is_some()
    }
}

ast_node!(TypeParamList, TYPE_PARAM_LIST);
ast_node!(TypeParam, TYPE_PARAM);

impl TypeParam {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

ast_node!(ParamList, PARAM_LIST);

ast_node!(Param, PARAM);

impl Param {
    /// Whether the parameter is `inout`-qualified.
    pub fn is_inout(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::INOUT_KW).is_some()
    }

    /// Whether the parameter is `cap`-qualified (a capability parameter).
    pub fn is_cap(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::CAP_KW).is_some()
    }

    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

ast_node!(RetType, RET_TYPE);

impl RetType {
    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

ast_node!(ErrorClause, ERROR_CLAUSE);

impl ErrorClause {
    /// The named error domain.
    pub fn domain_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

ast_node!(EffectsClause, EFFECTS_CLAUSE);

impl EffectsClause {
    /// The declared effect names, in order.
    pub fn effect_tokens(&self) -> Vec<SyntaxToken> {
        child_tokens(&self.syntax, SyntaxKind::IDENT)
    }
}

// ── Type, error, domain declarations ─────────────────────────────────────

ast_node!(TypeDecl, TYPE_DECL);

impl TypeDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// Generic type parameter identifiers, in order.
    pub fn type_params(&self) -> Vec<SyntaxToken> {
        child_node::<TypeParamList>(&self.syntax)
            .map(|list| {
                list.syntax
                    .children()
                    .filter_map(TypeParam::cast)
                    .filter_map(|tp| tp.ident_token())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The right-hand-side type expression.
    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

ast_node!(ErrorDecl, ERROR_DECL);

impl ErrorDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn fields(&self) -> impl Iterator<Item = VariantField> + '_ {
        child_node::<VariantFieldList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.syntax.children().collect::<Vec<_>>())
            .filter_map(VariantField::cast)
    }
}

ast_node!(DomainDecl, DOMAIN_DECL);

impl DomainDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The domain's variants, in declaration order (both the union and
    /// the inline form produce VARIANT_DEF children).
    pub fn variants(&self) -> impl Iterator<Item = VariantDef> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(VariantDef, VARIANT_DEF);

impl VariantDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn fields(&self) -> impl Iterator<Item = VariantField> + '_ {
        child_node::<VariantFieldList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.syntax.children().collect::<Vec<_>>())
            .filter_map(VariantField::cast)
    }
}

ast_node!(VariantFieldList, VARIANT_FIELD_LIST);

ast_node!(VariantField, VARIANT_FIELD);

impl VariantField {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }
}

// ── Const, var, use-error ────────────────────────────────────────────────

ast_node!(ConstDecl, CONST_DECL);

impl ConstDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The explicit type annotation, if written.
    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(VarDecl, VAR_DECL);

impl VarDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn ty(&self) -> Option<Type> {
        self.syntax.children().find_map(Type::cast)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(UseErrorDecl, USE_ERROR_DECL);

impl UseErrorDecl {
    /// The referenced error type name.
    pub fn error_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

// ── Blocks and statements ────────────────────────────────────────────────

ast_node!(Block, BLOCK);

impl Block {
    /// All statements in the block, in order.
    pub fn statements(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.syntax.children().filter_map(Stmt::cast)
    }
}

/// Any statement inside a block.
#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl(VarDecl),
    ConstDecl(ConstDecl),
    Return(ReturnStmt),
    Defer(DeferStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Expr(ExprStmt),
    Assign(AssignStmt),
}

impl Stmt {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::VAR_DECL => Some(Stmt::VarDecl(VarDecl { syntax: node })),
            SyntaxKind::CONST_DECL => Some(Stmt::ConstDecl(ConstDecl { syntax: node })),
            SyntaxKind::RETURN_STMT => Some(Stmt::Return(ReturnStmt { syntax: node })),
            SyntaxKind::DEFER_STMT => Some(Stmt::Defer(DeferStmt { syntax: node })),
            SyntaxKind::IF_STMT => Some(Stmt::If(IfStmt { syntax: node })),
            SyntaxKind::WHILE_STMT => Some(Stmt::While(WhileStmt { syntax: node })),
            SyntaxKind::FOR_STMT => Some(Stmt::For(ForStmt { syntax: node })),
            SyntaxKind::BREAK_STMT => Some(Stmt::Break(BreakStmt { syntax: node })),
            SyntaxKind::CONTINUE_STMT => Some(Stmt::Continue(ContinueStmt { syntax: node })),
            SyntaxKind::EXPR_STMT => Some(Stmt::Expr(ExprStmt { syntax: node })),
            SyntaxKind::ASSIGN_STMT => Some(Stmt::Assign(AssignStmt { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::VarDecl(n) => &n.syntax,
            Stmt::ConstDecl(n) => &n.syntax,
            Stmt::Return(n) => &n.syntax,
            Stmt::Defer(n) => &n.syntax,
            Stmt::If(n) => &n.syntax,
            Stmt::While(n) => &n.syntax,
            Stmt::For(n) => &n.syntax,
            Stmt::Break(n) => &n.syntax,
            Stmt::Continue(n) => &n.syntax,
            Stmt::Expr(n) => &n.syntax,
            Stmt::Assign(n) => &n.syntax,
        }
    }
}

ast_node!(ReturnStmt, RETURN_STMT);

impl ReturnStmt {
    /// The returned value; `None` for a bare `return;`.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(DeferStmt, DEFER_STMT);

impl DeferStmt {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(IfStmt, IF_STMT);

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn then_block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    pub fn else_branch(&self) -> Option<ElseBranch> {
        child_node(&self.syntax)
    }
}

ast_node!(ElseBranch, ELSE_BRANCH);

impl ElseBranch {
    /// `else { ... }` form.
    pub fn block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// `else if ...` form.
    pub fn if_stmt(&self) -> Option<IfStmt> {
        child_node(&self.syntax)
    }
}

ast_node!(WhileStmt, WHILE_STMT);

impl WhileStmt {
    pub fn condition(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(ForStmt, FOR_STMT);

impl ForStmt {
    /// The loop variable.
    pub fn binding(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The iterated expression.
    pub fn iterable(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

ast_node!(BreakStmt, BREAK_STMT);
ast_node!(ContinueStmt, CONTINUE_STMT);

ast_node!(ExprStmt, EXPR_STMT);

impl ExprStmt {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

ast_node!(AssignStmt, ASSIGN_STMT);

impl AssignStmt {
    /// The assignment target (left of `=`).
    pub fn target(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The assigned value (right of `=`).
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }
}
