//! Error domains: the domain table and the error-checking pass.
//!
//! A domain is a named, closed set of error variants. The declaration
//! pass registers domain names and variant names; the resolver fills in
//! variant field types; this pass then validates every `err`, `check`,
//! `ensure`, and `map_error` site against the enclosing function's
//! declared domain.

use ferrule_common::diagnostics::Diagnostics;
use ferrule_common::span::Span;
use rowan::TextRange;
use rustc_hash::FxHashMap;

use ferrule_parser::ast::expr::Expr;
use ferrule_parser::ast::item::{Block, Item, SourceFile, Stmt};
use ferrule_parser::ast::AstNode;

use crate::context::Context;
use crate::symbols::{ScopeStack, Symbol};
use crate::ty::{Ty, TyId};
use crate::util::node_span;

// ── Domain table ───────────────────────────────────────────────────────

/// One variant of an error domain.
#[derive(Debug, Clone)]
pub struct DomainVariant {
    pub name: String,
    pub fields: Vec<(String, TyId)>,
    pub span: Span,
}

/// A declared error domain.
#[derive(Debug, Clone)]
pub struct DomainInfo {
    pub name: String,
    pub variants: Vec<DomainVariant>,
    pub span: Span,
}

impl DomainInfo {
    pub fn variant(&self, name: &str) -> Option<&DomainVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name.as_str())
    }
}

/// Name → domain mapping for one compilation unit.
#[derive(Debug, Default)]
pub struct DomainTable {
    domains: FxHashMap<String, DomainInfo>,
}

impl DomainTable {
    pub fn new() -> DomainTable {
        DomainTable::default()
    }

    pub fn insert(&mut self, info: DomainInfo) {
        self.domains.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&DomainInfo> {
        self.domains.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DomainInfo> {
        self.domains.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.domains.contains_key(name)
    }

    /// Whether domain `a` is a subset of domain `b`: every variant name
    /// of `a` appears in `b`. Unknown domains are never subsets.
    pub fn is_subset(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let (Some(sub), Some(sup)) = (self.domains.get(a), self.domains.get(b)) else {
            return false;
        };
        sub.variant_names()
            .all(|name| sup.variant(name).is_some())
    }
}

// ── Error-checking pass ────────────────────────────────────────────────

/// Validate error-domain usage across every function body.
pub fn run(
    file: &SourceFile,
    ctx: &Context,
    scopes: &ScopeStack,
    domains: &DomainTable,
    types: &FxHashMap<TextRange, TyId>,
    diags: &mut Diagnostics,
) {
    for decl in file.decls() {
        match decl {
            Item::FnDecl(f) => {
                let domain = f
                    .error_clause()
                    .and_then(|c| c.domain_token())
                    .map(|t| t.text().to_string());

                // An `error D` clause must name a declared domain.
                if let Some(name) = &domain {
                    if !domains.contains(name) {
                        if let Some(clause) = f.error_clause() {
                            diags.error(
                                format!("unknown error domain '{name}'"),
                                node_span(clause.syntax()),
                            );
                        }
                    }
                }

                if let Some(body) = f.body() {
                    let mut pass = ErrorCheck {
                        ctx,
                        domains,
                        types,
                        diags,
                        current_domain: domain,
                    };
                    pass.check_block(&body);
                }
            }
            Item::UseErrorDecl(u) => {
                if let Some(token) = u.error_token() {
                    let name = token.text();
                    let known = domains.contains(name)
                        || matches!(scopes.lookup_global(name), Some(Symbol::ErrorType { .. }));
                    if !known {
                        let range = token.text_range();
                        diags.error(
                            format!("unknown error type '{name}'"),
                            Span::new(range.start().into(), range.end().into()),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

struct ErrorCheck<'a> {
    ctx: &'a Context,
    domains: &'a DomainTable,
    types: &'a FxHashMap<TextRange, TyId>,
    diags: &'a mut Diagnostics,
    current_domain: Option<String>,
}

impl ErrorCheck<'_> {
    fn check_block(&mut self, block: &Block) {
        for stmt in block.statements() {
            self.check_stmt(&stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(v) => {
                if let Some(value) = v.value() {
                    self.check_expr(&value);
                }
            }
            Stmt::ConstDecl(c) => {
                if let Some(value) = c.value() {
                    self.check_expr(&value);
                }
            }
            Stmt::Return(r) => {
                if let Some(value) = r.value() {
                    self.check_expr(&value);
                }
            }
            Stmt::Defer(d) => {
                if let Some(expr) = d.expr() {
                    self.check_expr(&expr);
                }
            }
            Stmt::If(i) => {
                if let Some(cond) = i.condition() {
                    self.check_expr(&cond);
                }
                if let Some(block) = i.then_block() {
                    self.check_block(&block);
                }
                if let Some(else_branch) = i.else_branch() {
                    if let Some(block) = else_branch.block() {
                        self.check_block(&block);
                    }
                    if let Some(nested) = else_branch.if_stmt() {
                        self.check_stmt(&Stmt::If(nested));
                    }
                }
            }
            Stmt::While(w) => {
                if let Some(cond) = w.condition() {
                    self.check_expr(&cond);
                }
                if let Some(body) = w.body() {
                    self.check_block(&body);
                }
            }
            Stmt::For(f) => {
                if let Some(iterable) = f.iterable() {
                    self.check_expr(&iterable);
                }
                if let Some(body) = f.body() {
                    self.check_block(&body);
                }
            }
            Stmt::Expr(e) => {
                if let Some(expr) = e.expr() {
                    self.check_expr(&expr);
                }
            }
            Stmt::Assign(a) => {
                if let Some(target) = a.target() {
                    self.check_expr(&target);
                }
                if let Some(value) = a.value() {
                    self.check_expr(&value);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    /// Report a use of `ok`/`err`/`check`/`ensure`/`map_error` outside a
    /// function with a declared error domain. Returns the domain when
    /// one is declared.
    fn require_domain(&mut self, form: &str, span: Span) -> Option<String> {
        match &self.current_domain {
            Some(domain) => Some(domain.clone()),
            None => {
                self.diags.error(
                    format!("`{form}` is only allowed in a function with a declared error domain"),
                    span,
                );
                None
            }
        }
    }

    /// Validate that a variant constructor names a variant of the
    /// current domain.
    fn check_err_variant(&mut self, err: &ferrule_parser::ast::expr::ErrExpr) {
        let span = node_span(err.syntax());
        let Some(domain_name) = self.require_domain("err", span) else {
            return;
        };
        let Some(domain) = self.domains.get(&domain_name) else {
            return;
        };
        let Some(ctor) = err.ctor() else {
            return;
        };
        let Some(name) = ctor.name() else {
            return;
        };
        let variant = name.text();
        if domain.variant(&variant).is_none() {
            let names: Vec<&str> = domain.variant_names().collect();
            self.diags
                .push(
                    ferrule_common::diagnostics::Diagnostic::error(
                        format!(
                            "error domain '{domain_name}' has no variant '{variant}'"
                        ),
                        node_span(name.syntax()),
                    )
                    .with_hint(format!("declared variants: {}", names.join(", "))),
                );
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ok(ok) => {
                let span = node_span(ok.syntax());
                self.require_domain("ok", span);
                if let Some(value) = ok.value() {
                    self.check_expr(&value);
                }
            }

            Expr::Err(err) => {
                self.check_err_variant(err);
                if let Some(ctor) = err.ctor() {
                    for field in ctor.fields() {
                        if let Some(value) = field.value() {
                            self.check_expr(&value);
                        }
                    }
                }
            }

            Expr::Check(check) => {
                let span = node_span(check.syntax());
                let current = self.require_domain("check", span);

                if let Some(inner) = check.inner() {
                    // The checked expression's domain must be a subset of
                    // the enclosing function's domain.
                    if let (Some(current), Some(ty)) =
                        (current, self.types.get(&inner.syntax().text_range()))
                    {
                        if let Ty::Result { domain, .. } = self.ctx.ty(*ty) {
                            let checked = self.ctx.str(*domain).to_string();
                            if !self.domains.is_subset(&checked, &current) {
                                self.diags.error(
                                    format!(
                                        "error domain '{checked}' is not compatible with \
                                         function's error domain '{current}'"
                                    ),
                                    node_span(inner.syntax()),
                                );
                            }
                        }
                    }
                    self.check_expr(&inner);
                }
            }

            Expr::Ensure(ensure) => {
                let span = node_span(ensure.syntax());
                let in_domain = self.require_domain("ensure", span).is_some();
                if let Some(cond) = ensure.condition() {
                    self.check_expr(&cond);
                }
                // Only validate the variant when a domain exists, so an
                // ensure outside a domain function reports once.
                if in_domain {
                    if let Some(err) = ensure.err_expr() {
                        self.check_err_variant(&err);
                    }
                }
            }

            Expr::MapError(me) => {
                let span = node_span(me.syntax());
                self.require_domain("map_error", span);
                if let Some(inner) = me.inner() {
                    self.check_expr(&inner);
                }
                if let Some(transform) = me.transform() {
                    if let Some(body) = transform.arrow_body() {
                        self.check_expr(&body);
                    }
                }
            }

            // Everything else just recurses.
            Expr::Binary(b) => {
                if let Some(lhs) = b.lhs() {
                    self.check_expr(&lhs);
                }
                if let Some(rhs) = b.rhs() {
                    self.check_expr(&rhs);
                }
            }
            Expr::Unary(u) => {
                if let Some(operand) = u.operand() {
                    self.check_expr(&operand);
                }
            }
            Expr::Call(call) => {
                if let Some(callee) = call.callee() {
                    self.check_expr(&callee);
                }
                for arg in call.args() {
                    self.check_expr(&arg);
                }
            }
            Expr::FieldAccess(f) => {
                if let Some(base) = f.base() {
                    self.check_expr(&base);
                }
            }
            Expr::Index(i) => {
                if let Some(base) = i.base() {
                    self.check_expr(&base);
                }
                if let Some(index) = i.index() {
                    self.check_expr(&index);
                }
            }
            Expr::ArrayLiteral(a) => {
                for element in a.elements() {
                    self.check_expr(&element);
                }
            }
            Expr::RecordLiteral(r) => {
                for field in r.fields() {
                    if let Some(value) = field.value() {
                        self.check_expr(&value);
                    }
                }
            }
            Expr::VariantCtor(v) => {
                for field in v.fields() {
                    if let Some(value) = field.value() {
                        self.check_expr(&value);
                    }
                }
            }
            Expr::Range(r) => {
                if let Some(start) = r.start() {
                    self.check_expr(&start);
                }
                if let Some(end) = r.end() {
                    self.check_expr(&end);
                }
            }
            Expr::Match(m) => {
                if let Some(scrutinee) = m.scrutinee() {
                    self.check_expr(&scrutinee);
                }
                for arm in m.arms() {
                    if let Some(body) = arm.body() {
                        self.check_expr(&body);
                    }
                }
            }
            Expr::AnonFn(f) => {
                if let Some(body) = f.body() {
                    self.check_block(&body);
                }
                if let Some(body) = f.arrow_body() {
                    self.check_expr(&body);
                }
            }
            Expr::UnsafeCast(c) => {
                if let Some(inner) = c.inner() {
                    self.check_expr(&inner);
                }
            }
            Expr::Comptime(c) => {
                if let Some(inner) = c.inner() {
                    self.check_expr(&inner);
                }
            }
            Expr::Context(c) => {
                if let Some(body) = c.body() {
                    self.check_block(&body);
                }
            }
            Expr::Paren(p) => {
                if let Some(inner) = p.inner() {
                    self.check_expr(&inner);
                }
            }
            Expr::Block(b) => self.check_block(b),
            Expr::Literal(_) | Expr::NameRef(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(domains: &[(&str, &[&str])]) -> DomainTable {
        let mut table = DomainTable::new();
        for (name, variants) in domains {
            table.insert(DomainInfo {
                name: name.to_string(),
                variants: variants
                    .iter()
                    .map(|v| DomainVariant {
                        name: v.to_string(),
                        fields: Vec::new(),
                        span: Span::new(0, 0),
                    })
                    .collect(),
                span: Span::new(0, 0),
            });
        }
        table
    }

    #[test]
    fn subset_relation() {
        let table = table_with(&[
            ("Small", &["NotFound"]),
            ("Big", &["NotFound", "Denied"]),
            ("Other", &["Timeout"]),
        ]);

        assert!(table.is_subset("Small", "Big"));
        assert!(!table.is_subset("Big", "Small"));
        assert!(!table.is_subset("Other", "Big"));
        // Reflexive.
        assert!(table.is_subset("Big", "Big"));
        // Unknown domains never qualify.
        assert!(!table.is_subset("Missing", "Big"));
        assert!(!table.is_subset("Small", "Missing"));
    }

    #[test]
    fn variant_lookup() {
        let table = table_with(&[("Io", &["NotFound", "Denied"])]);
        let io = table.get("Io").unwrap();
        assert!(io.variant("NotFound").is_some());
        assert!(io.variant("Timeout").is_none());
        let names: Vec<&str> = io.variant_names().collect();
        assert_eq!(names, vec!["NotFound", "Denied"]);
    }
}
