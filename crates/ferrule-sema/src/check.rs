//! Pass 3: the type checker.
//!
//! A full recursive walk of every function body and top-level constant.
//! Every expression yields a resolved type, recorded in a span-keyed
//! table for the later passes and the hover/location tables; every
//! statement validates its sub-expressions. Failed checks substitute the
//! error placeholder and keep going, so one run reports as many issues
//! as possible.
//!
//! Numeric literals are given pseudo-types (`{integer}`, `{float}`) that
//! unify with any adjacent numeric type at use sites; a binding site
//! without an annotation rejects them.

use ferrule_common::diagnostics::Diagnostics;
use ferrule_common::span::{LineIndex, Span};
use rowan::TextRange;
use rustc_hash::FxHashMap;

use ferrule_parser::ast::expr::{
    BinaryExpr, CallExpr, Expr, FieldAccess, LiteralKind, MatchExpr, UnaryExpr, VariantCtor,
};
use ferrule_parser::ast::item::{Block, ConstDecl, FnDecl, Item, SourceFile, Stmt};
use ferrule_parser::ast::pat::Pattern;
use ferrule_parser::ast::AstNode;
use ferrule_parser::SyntaxKind;

use crate::context::{Context, StrId};
use crate::domains::DomainTable;
use crate::resolve::{self, TypeParamCtx};
use crate::symbols::{FunctionSymbol, ScopeStack, Symbol};
use crate::tables::{HoverEntry, HoverKind, HoverTable, SymbolLocations};
use crate::ty::{EffectSet, FnTy, Ty, TyId};
use crate::util::{node_span, token_span};

/// Run the type checker over the whole module.
///
/// Returns the span-keyed expression type table consumed by the error
/// checker, the exhaustiveness pass, and hover queries.
#[allow(clippy::too_many_arguments)]
pub fn run(
    file: &SourceFile,
    ctx: &mut Context,
    scopes: &mut ScopeStack,
    domains: &DomainTable,
    line_index: &LineIndex,
    diags: &mut Diagnostics,
    hover: &mut HoverTable,
    locs: &mut SymbolLocations,
) -> FxHashMap<TextRange, TyId> {
    let mut checker = Checker {
        ctx,
        scopes,
        domains,
        line_index,
        diags,
        hover,
        locs,
        types: FxHashMap::default(),
        current_fn: None,
    };

    // Top-level declaration hover entries.
    for decl in file.decls() {
        checker.record_decl_hover(&decl);
    }

    for decl in file.decls() {
        match decl {
            Item::ConstDecl(c) => checker.check_top_const(&c),
            Item::FnDecl(f) => checker.check_fn(&f),
            _ => {}
        }
    }

    checker.types
}

/// The enclosing function while its body is being checked.
struct CurrentFn {
    ret: TyId,
    error_domain: Option<String>,
    /// The function's generic parameters, so local annotations can
    /// reference them.
    tpctx: TypeParamCtx,
}

struct Checker<'a> {
    ctx: &'a mut Context,
    scopes: &'a mut ScopeStack,
    domains: &'a DomainTable,
    line_index: &'a LineIndex,
    diags: &'a mut Diagnostics,
    hover: &'a mut HoverTable,
    locs: &'a mut SymbolLocations,
    types: FxHashMap<TextRange, TyId>,
    current_fn: Option<CurrentFn>,
}

impl Checker<'_> {
    // ── Hover helpers ──────────────────────────────────────────────────

    fn add_hover(&mut self, span: Span, name: &str, kind: HoverKind, ty: TyId, detail: Option<String>) {
        let (line, column, length) = self.line_index.span_position(span);
        self.hover.add(HoverEntry {
            line,
            column,
            length,
            name: name.to_string(),
            kind,
            ty,
            detail,
        });
    }

    /// Hover entries for a top-level declaration site.
    fn record_decl_hover(&mut self, decl: &Item) {
        match decl {
            Item::FnDecl(f) => {
                let Some(name) = f.name() else { return };
                let name_text = name.text();
                let Some(Symbol::Function(sym)) = self.scopes.lookup_global(&name_text) else {
                    return;
                };
                let sym = sym.clone();
                let detail = self.fn_detail(&sym);
                let ty = resolve::fn_ty(self.ctx, &sym);
                self.add_hover(
                    node_span(name.syntax()),
                    &name_text,
                    HoverKind::Function,
                    ty,
                    Some(detail),
                );
            }
            Item::TypeDecl(t) => {
                let Some(name) = t.name() else { return };
                let name_text = name.text();
                if let Some(Symbol::TypeDef { underlying, .. }) =
                    self.scopes.lookup_global(&name_text)
                {
                    let underlying = *underlying;
                    self.add_hover(
                        node_span(name.syntax()),
                        &name_text,
                        HoverKind::Type,
                        underlying,
                        None,
                    );
                }
            }
            Item::ErrorDecl(e) => {
                let Some(name) = e.name() else { return };
                let name_text = name.text();
                if let Some(Symbol::ErrorType { ty }) = self.scopes.lookup_global(&name_text) {
                    let ty = *ty;
                    self.add_hover(
                        node_span(name.syntax()),
                        &name_text,
                        HoverKind::ErrorType,
                        ty,
                        None,
                    );
                }
            }
            Item::DomainDecl(d) => {
                let Some(name) = d.name() else { return };
                let name_text = name.text();
                let detail = self.domains.get(&name_text).map(|info| {
                    let names: Vec<&str> = info.variant_names().collect();
                    format!("domain {} = {}", name_text, names.join(" | "))
                });
                let unit = self.ctx.prims.unit;
                self.add_hover(
                    node_span(name.syntax()),
                    &name_text,
                    HoverKind::Domain,
                    unit,
                    detail,
                );
            }
            Item::ConstDecl(c) => {
                let Some(name) = c.name() else { return };
                let name_text = name.text();
                if let Some(Symbol::Constant { ty, .. }) = self.scopes.lookup_global(&name_text) {
                    let ty = *ty;
                    self.add_hover(
                        node_span(name.syntax()),
                        &name_text,
                        HoverKind::Constant,
                        ty,
                        None,
                    );
                }
            }
            Item::UseErrorDecl(_) => {}
        }
    }

    /// Rich hover text for a function: signature with parameter names,
    /// effects, and error domain.
    fn fn_detail(&self, sym: &FunctionSymbol) -> String {
        let params: Vec<String> = sym
            .param_names
            .iter()
            .zip(&sym.param_tys)
            .map(|(name, ty)| format!("{}: {}", name, self.ctx.display_ty(*ty)))
            .collect();
        let mut detail = format!(
            "function {}({}) -> {}",
            sym.name,
            params.join(", "),
            self.ctx.display_ty(sym.ret)
        );
        if let Some(domain) = &sym.error_domain {
            detail.push_str(&format!(" error {domain}"));
        }
        if !sym.effects.is_empty() {
            detail.push_str(&format!(" effects {}", sym.effects.display()));
        }
        detail
    }

    // ── Unification ────────────────────────────────────────────────────

    /// Literal-aware type unification. Returns the merged type, or
    /// `None` when the two types are incompatible.
    fn unify(&mut self, expected: TyId, found: TyId) -> Option<TyId> {
        if expected == found {
            return Some(expected);
        }
        let e = self.ctx.ty(expected).clone();
        let f = self.ctx.ty(found).clone();

        // The error placeholder unifies with anything so one failure does
        // not cascade.
        if matches!(e, Ty::Error) {
            return Some(found);
        }
        if matches!(f, Ty::Error) {
            return Some(expected);
        }

        match (&e, &f) {
            (Ty::Int(_), Ty::IntLit) | (Ty::Float(_), Ty::IntLit) | (Ty::Float(_), Ty::FloatLit) => {
                Some(expected)
            }
            (Ty::IntLit, Ty::Int(_)) | (Ty::IntLit, Ty::Float(_)) | (Ty::FloatLit, Ty::Float(_)) => {
                Some(found)
            }
            (Ty::IntLit, Ty::FloatLit) | (Ty::FloatLit, Ty::IntLit) => {
                Some(self.ctx.prims.float_lit)
            }
            // `null` types as `Nullable(<error>)` and adopts any nullable.
            (Ty::Nullable(_), Ty::Nullable(inner)) if *self.ctx.ty(*inner) == Ty::Error => {
                Some(expected)
            }
            (Ty::Nullable(inner), Ty::Nullable(_)) if *self.ctx.ty(*inner) == Ty::Error => {
                Some(found)
            }
            _ => None,
        }
    }

    /// Follow `Named` indirections to the structural type.
    fn unwrap_named(&self, ty: TyId) -> TyId {
        match self.ctx.ty(ty) {
            Ty::Named { underlying, .. } => self.unwrap_named(*underlying),
            _ => ty,
        }
    }

    fn mismatch(&mut self, expected: TyId, found: TyId, span: Span) {
        let msg = format!(
            "type mismatch: expected {}, found {}",
            self.ctx.display_ty(expected),
            self.ctx.display_ty(found)
        );
        self.diags.error(msg, span);
    }

    // ── Declarations and statements ────────────────────────────────────

    fn check_top_const(&mut self, c: &ConstDecl) {
        let Some(name) = c.name() else { return };
        let annotated = c.ty().is_some();
        let declared = match self.scopes.lookup_global(&name.text()) {
            Some(Symbol::Constant { ty, .. }) => *ty,
            _ => self.ctx.prims.error,
        };

        let Some(value) = c.value() else { return };
        let value_ty = self.check_expr(&value);

        if annotated {
            if self.unify(declared, value_ty).is_none() {
                self.mismatch(declared, value_ty, node_span(value.syntax()));
            }
        } else if self.ctx.ty(value_ty).is_literal() {
            self.diags.error(
                "numeric literal requires explicit type annotation",
                node_span(name.syntax()),
            );
        } else {
            // Adopt the initializer's type.
            self.scopes.replace(
                name.text(),
                Symbol::Constant {
                    ty: value_ty,
                    depth: 0,
                },
            );
        }
    }

    fn check_fn(&mut self, f: &FnDecl) {
        let Some(name) = f.name() else { return };
        let Some(Symbol::Function(sym)) = self.scopes.lookup_global(&name.text()) else {
            return;
        };
        let sym = sym.clone();

        self.scopes.push();
        let params: Vec<_> = f.params().collect();
        for (i, param) in params.iter().enumerate() {
            let ty = sym.param_tys.get(i).copied().unwrap_or(self.ctx.prims.error);
            let Some(pname) = param.name() else { continue };
            let pname_text = pname.text();
            if !self.scopes.insert(
                pname_text.clone(),
                Symbol::Parameter {
                    ty,
                    inout: param.is_inout(),
                    capability: param.is_cap(),
                },
            ) {
                self.diags.error(
                    format!("duplicate parameter '{pname_text}'"),
                    node_span(pname.syntax()),
                );
            }
            self.add_hover(
                node_span(pname.syntax()),
                &pname_text,
                HoverKind::Parameter,
                ty,
                None,
            );
        }

        self.current_fn = Some(CurrentFn {
            ret: sym.ret,
            error_domain: sym.error_domain.clone(),
            tpctx: TypeParamCtx::new(&sym.type_params),
        });

        if let Some(body) = f.body() {
            self.check_block(&body);
        }

        self.current_fn = None;
        self.scopes.pop();
    }

    /// The enclosing function's type-parameter context, for resolving
    /// type annotations that appear inside the body.
    fn local_tpctx(&self) -> TypeParamCtx {
        self.current_fn
            .as_ref()
            .map(|f| f.tpctx.clone())
            .unwrap_or_else(TypeParamCtx::empty)
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push();
        for stmt in block.statements() {
            self.check_stmt(&stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(v) => self.check_binding(v.name(), v.ty(), v.value(), true),
            Stmt::ConstDecl(c) => self.check_binding(c.name(), c.ty(), c.value(), false),

            Stmt::Return(r) => self.check_return(r.value(), node_span(r.syntax())),

            Stmt::Defer(d) => {
                if let Some(expr) = d.expr() {
                    self.check_expr(&expr);
                }
            }

            Stmt::If(i) => {
                if let Some(cond) = i.condition() {
                    self.check_condition(&cond);
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
                    self.check_condition(&cond);
                }
                if let Some(body) = w.body() {
                    self.check_block(&body);
                }
            }

            Stmt::For(f) => self.check_for(f),

            Stmt::Expr(e) => {
                if let Some(expr) = e.expr() {
                    self.check_expr(&expr);
                }
            }

            Stmt::Assign(a) => self.check_assign(a),

            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    /// Shared var/const binding check.
    fn check_binding(
        &mut self,
        name: Option<ferrule_parser::ast::item::Name>,
        annotation: Option<ferrule_parser::ast::ty::Type>,
        value: Option<Expr>,
        mutable: bool,
    ) {
        let Some(name) = name else { return };
        let name_text = name.text();

        let declared = annotation.as_ref().map(|ty| {
            let mut tpctx = self.local_tpctx();
            resolve::resolve_type(ty, self.ctx, self.scopes, &mut tpctx, self.diags)
        });

        let value_ty = value.as_ref().map(|v| (self.check_expr(v), node_span(v.syntax())));

        let binding_ty = match (declared, value_ty) {
            (Some(declared), Some((found, span))) => {
                if self.unify(declared, found).is_none() {
                    self.mismatch(declared, found, span);
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some((found, _))) => {
                if self.ctx.ty(found).is_literal() {
                    self.diags.error(
                        "numeric literal requires explicit type annotation",
                        node_span(name.syntax()),
                    );
                    self.ctx.prims.error
                } else {
                    found
                }
            }
            (None, None) => self.ctx.prims.error,
        };

        let depth = self.scopes.depth();
        let symbol = if mutable {
            Symbol::Variable {
                ty: binding_ty,
                mutable: true,
                depth,
            }
        } else {
            Symbol::Constant {
                ty: binding_ty,
                depth,
            }
        };
        if !self.scopes.insert(name_text.clone(), symbol) {
            self.diags.error(
                format!("duplicate declaration of '{name_text}'"),
                node_span(name.syntax()),
            );
        }

        let kind = if mutable {
            HoverKind::Variable
        } else {
            HoverKind::Constant
        };
        self.add_hover(node_span(name.syntax()), &name_text, kind, binding_ty, None);
    }

    fn check_condition(&mut self, cond: &Expr) {
        let ty = self.check_expr(cond);
        let bool_ = self.ctx.prims.bool_;
        if self.unify(bool_, ty).is_none() {
            self.diags.error(
                format!("condition must be a bool, found {}", self.ctx.display_ty(ty)),
                node_span(cond.syntax()),
            );
        }
    }

    fn check_for(&mut self, f: &ferrule_parser::ast::item::ForStmt) {
        let elem = match f.iterable() {
            Some(iterable) => {
                let ty = self.check_expr(&iterable);
                let structural = self.unwrap_named(ty);
                match self.ctx.ty(structural).clone() {
                    Ty::Array { elem, .. } | Ty::Vector { elem, .. } | Ty::View { elem, .. } => elem,
                    Ty::Range(elem) => elem,
                    Ty::Error => self.ctx.prims.error,
                    _ => {
                        self.diags.error(
                            format!(
                                "for loop requires an array, view, or range, found {}",
                                self.ctx.display_ty(ty)
                            ),
                            node_span(iterable.syntax()),
                        );
                        self.ctx.prims.error
                    }
                }
            }
            None => self.ctx.prims.error,
        };

        self.scopes.push();
        if let Some(binding) = f.binding() {
            let name = binding.text();
            // Range elements may still be literal-typed; iterate as i64.
            let elem = if self.ctx.ty(elem).is_literal() {
                self.ctx.prims.i64
            } else {
                elem
            };
            self.scopes.insert(
                name.clone(),
                Symbol::Variable {
                    ty: elem,
                    mutable: false,
                    depth: self.scopes.depth(),
                },
            );
            self.add_hover(node_span(binding.syntax()), &name, HoverKind::Variable, elem, None);
        }
        if let Some(body) = f.body() {
            self.check_block(&body);
        }
        self.scopes.pop();
    }

    fn check_return(&mut self, value: Option<Expr>, stmt_span: Span) {
        let Some(current) = &self.current_fn else { return };
        let ret = current.ret;
        let has_domain = current.error_domain.is_some();

        let Some(value) = value else {
            if !has_domain {
                let unit = self.ctx.prims.unit;
                if self.unify(ret, unit).is_none() {
                    self.diags.error(
                        format!(
                            "return type mismatch: expected {}, found ()",
                            self.ctx.display_ty(ret)
                        ),
                        stmt_span,
                    );
                }
            } else {
                self.diags.error(
                    "return in an error-domain function must use `ok` or `err`",
                    stmt_span,
                );
            }
            return;
        };

        let value_ty = self.check_expr(&value);
        let value_span = node_span(value.syntax());

        if has_domain {
            match &value {
                Expr::Ok(_) => {
                    // `ok e` produced Result<T, D>; T must match the
                    // declared return type.
                    if let Ty::Result { ok, .. } = self.ctx.ty(value_ty).clone() {
                        if self.unify(ret, ok).is_none() {
                            self.mismatch(ret, ok, value_span);
                        }
                    }
                }
                // `err V { ... }` wraps as Result<Unit, D>; the error
                // path intentionally matches any declared ok type.
                Expr::Err(_) => {}
                _ => {
                    self.diags.error(
                        "return in an error-domain function must use `ok` or `err`",
                        value_span,
                    );
                }
            }
        } else if self.unify(ret, value_ty).is_none() {
            self.diags.error(
                format!(
                    "return type mismatch: expected {}, found {}",
                    self.ctx.display_ty(ret),
                    self.ctx.display_ty(value_ty)
                ),
                value_span,
            );
        }
    }

    fn check_assign(&mut self, a: &ferrule_parser::ast::item::AssignStmt) {
        let value_ty = a.value().map(|v| (self.check_expr(&v), node_span(v.syntax())));

        let Some(target) = a.target() else { return };
        let target_ty = self.check_expr(&target);

        match &target {
            Expr::NameRef(name) => {
                let name_text = name.text();
                match self.scopes.lookup(&name_text) {
                    Some(Symbol::Variable { mutable: true, .. })
                    | Some(Symbol::Parameter { inout: true, .. }) => {}
                    Some(Symbol::Variable { mutable: false, .. }) => {
                        self.diags.error(
                            format!("cannot assign to immutable variable '{name_text}'"),
                            node_span(name.syntax()),
                        );
                    }
                    Some(Symbol::Constant { .. }) => {
                        self.diags.error(
                            format!("cannot assign to constant '{name_text}'"),
                            node_span(name.syntax()),
                        );
                    }
                    Some(Symbol::Parameter { inout: false, .. }) => {
                        self.diags.error(
                            format!("cannot assign to parameter '{name_text}' (missing `inout`)"),
                            node_span(name.syntax()),
                        );
                    }
                    Some(_) | None => {
                        self.diags.error(
                            format!("cannot assign to '{name_text}'"),
                            node_span(name.syntax()),
                        );
                    }
                }
            }
            _ => {
                self.diags.error(
                    "assignment target must be a mutable variable",
                    node_span(target.syntax()),
                );
            }
        }

        if let Some((found, span)) = value_ty {
            if self.unify(target_ty, found).is_none() {
                self.mismatch(target_ty, found, span);
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &Expr) -> TyId {
        let ty = self.check_expr_inner(expr);
        self.types.insert(expr.syntax().text_range(), ty);
        ty
    }

    fn check_expr_inner(&mut self, expr: &Expr) -> TyId {
        match expr {
            Expr::Literal(lit) => match lit.kind() {
                LiteralKind::Int => self.ctx.prims.int_lit,
                LiteralKind::Float => self.ctx.prims.float_lit,
                LiteralKind::String => self.ctx.prims.string,
                LiteralKind::Bytes => self.ctx.prims.bytes,
                LiteralKind::Char => self.ctx.prims.char_,
                LiteralKind::Bool => self.ctx.prims.bool_,
                LiteralKind::Unit => self.ctx.prims.unit,
                LiteralKind::Null => {
                    let error = self.ctx.prims.error;
                    self.ctx.nullable_ty(error)
                }
            },

            Expr::NameRef(name) => self.check_name_ref(name),

            Expr::Binary(b) => self.check_binary(b),
            Expr::Unary(u) => self.check_unary(u),
            Expr::Call(call) => self.check_call(call),
            Expr::FieldAccess(f) => self.check_field_access(f),

            Expr::Index(index) => {
                let base_ty = match index.base() {
                    Some(base) => self.check_expr(&base),
                    None => self.ctx.prims.error,
                };
                if let Some(idx) = index.index() {
                    let idx_ty = self.check_expr(&idx);
                    if !self.ctx.ty(idx_ty).is_integer() && !matches!(self.ctx.ty(idx_ty), Ty::Error) {
                        self.diags.error(
                            format!("index must be an integer, found {}", self.ctx.display_ty(idx_ty)),
                            node_span(idx.syntax()),
                        );
                    }
                }
                let structural = self.unwrap_named(base_ty);
                match self.ctx.ty(structural).clone() {
                    Ty::Array { elem, .. } | Ty::Vector { elem, .. } | Ty::View { elem, .. } => elem,
                    Ty::Error => self.ctx.prims.error,
                    _ => {
                        self.diags.error(
                            format!("cannot index {}", self.ctx.display_ty(base_ty)),
                            node_span(index.syntax()),
                        );
                        self.ctx.prims.error
                    }
                }
            }

            Expr::ArrayLiteral(array) => {
                let mut elem: Option<TyId> = None;
                let mut len = 0u64;
                for element in array.elements() {
                    len += 1;
                    let ty = self.check_expr(&element);
                    elem = match elem {
                        None => Some(ty),
                        Some(previous) => match self.unify(previous, ty) {
                            Some(merged) => Some(merged),
                            None => {
                                self.mismatch(previous, ty, node_span(element.syntax()));
                                Some(previous)
                            }
                        },
                    };
                }
                let elem = elem.unwrap_or(self.ctx.prims.error);
                // A homogeneous literal array defaults its elements to i64.
                let elem = if self.ctx.ty(elem).is_literal() {
                    self.ctx.prims.i64
                } else {
                    elem
                };
                self.ctx.intern_ty(Ty::Array { elem, len })
            }

            Expr::RecordLiteral(record) => {
                let mut fields: Vec<(StrId, TyId)> = Vec::new();
                for field in record.fields() {
                    let Some(name) = field.name() else { continue };
                    let ty = match field.value() {
                        Some(value) => self.check_expr(&value),
                        None => self.ctx.prims.error,
                    };
                    let name = self.ctx.intern_str(&name.text());
                    fields.push((name, ty));
                }
                self.ctx.intern_ty(Ty::Record { fields })
            }

            Expr::VariantCtor(ctor) => self.check_variant_ctor(ctor),

            Expr::Range(range) => {
                let start_ty = range.start().map(|s| (self.check_expr(&s), node_span(s.syntax())));
                let end_ty = range.end().map(|e| (self.check_expr(&e), node_span(e.syntax())));
                let elem = match (start_ty, end_ty) {
                    (Some((start, _)), Some((end, end_span))) => match self.unify(start, end) {
                        Some(merged) => merged,
                        None => {
                            self.mismatch(start, end, end_span);
                            start
                        }
                    },
                    (Some((start, _)), None) => start,
                    (None, Some((end, _))) => end,
                    (None, None) => self.ctx.prims.error,
                };
                if !self.ctx.ty(elem).is_numeric() && !matches!(self.ctx.ty(elem), Ty::Error) {
                    self.diags.error(
                        format!("range bounds must be numeric, found {}", self.ctx.display_ty(elem)),
                        node_span(range.syntax()),
                    );
                }
                self.ctx.intern_ty(Ty::Range(elem))
            }

            Expr::Ok(ok) => {
                let value_ty = match ok.value() {
                    Some(value) => self.check_expr(&value),
                    None => self.ctx.prims.unit,
                };
                match self.current_domain() {
                    Some(domain) => self.ctx.result_ty(value_ty, &domain),
                    // Misuse outside a domain function is diagnosed by
                    // the error checker; keep checking with placeholders.
                    None => self.ctx.prims.error,
                }
            }

            Expr::Err(err) => {
                if let Some(ctor) = err.ctor() {
                    self.check_err_fields(&ctor);
                }
                match self.current_domain() {
                    Some(domain) => {
                        let unit = self.ctx.prims.unit;
                        self.ctx.result_ty(unit, &domain)
                    }
                    None => self.ctx.prims.error,
                }
            }

            Expr::Check(check) => {
                let Some(inner) = check.inner() else {
                    return self.ctx.prims.error;
                };
                let inner_ty = self.check_expr(&inner);
                let structural = self.unwrap_named(inner_ty);
                match self.ctx.ty(structural).clone() {
                    Ty::Result { ok, .. } => ok,
                    Ty::Error => self.ctx.prims.error,
                    _ => {
                        self.diags.error(
                            format!(
                                "check requires a Result value, found {}",
                                self.ctx.display_ty(inner_ty)
                            ),
                            node_span(inner.syntax()),
                        );
                        self.ctx.prims.error
                    }
                }
            }

            Expr::Ensure(ensure) => {
                if let Some(cond) = ensure.condition() {
                    self.check_condition(&cond);
                }
                if let Some(err) = ensure.err_expr() {
                    if let Some(ctor) = err.ctor() {
                        self.check_err_fields(&ctor);
                    }
                }
                self.ctx.prims.unit
            }

            Expr::MapError(me) => {
                let inner_ty = match me.inner() {
                    Some(inner) => self.check_expr(&inner),
                    None => self.ctx.prims.error,
                };

                if let Some(transform) = me.transform() {
                    self.scopes.push();
                    if let Some(param) = transform.arrow_param() {
                        // The error value is opaque to the transform; it
                        // rebuilds a variant of the target domain.
                        let error = self.ctx.prims.error;
                        self.scopes.insert(
                            param.text(),
                            Symbol::Variable {
                                ty: error,
                                mutable: false,
                                depth: self.scopes.depth(),
                            },
                        );
                    }
                    if let Some(body) = transform.arrow_body() {
                        self.check_expr(&body);
                    }
                    self.scopes.pop();
                }

                let structural = self.unwrap_named(inner_ty);
                let ok = match self.ctx.ty(structural).clone() {
                    Ty::Result { ok, .. } => ok,
                    Ty::Error => self.ctx.prims.error,
                    _ => {
                        if let Some(inner) = me.inner() {
                            self.diags.error(
                                format!(
                                    "map_error requires a Result value, found {}",
                                    self.ctx.display_ty(inner_ty)
                                ),
                                node_span(inner.syntax()),
                            );
                        }
                        self.ctx.prims.error
                    }
                };
                match self.current_domain() {
                    Some(domain) => self.ctx.result_ty(ok, &domain),
                    None => self.ctx.prims.error,
                }
            }

            Expr::Match(m) => self.check_match(m),

            Expr::AnonFn(f) => self.check_anon_fn(f),

            Expr::UnsafeCast(cast) => {
                if let Some(inner) = cast.inner() {
                    self.check_expr(&inner);
                }
                match cast.target_ty() {
                    Some(ty) => {
                        let mut tpctx = self.local_tpctx();
                        resolve::resolve_type(&ty, self.ctx, self.scopes, &mut tpctx, self.diags)
                    }
                    None => self.ctx.prims.error,
                }
            }

            Expr::Comptime(c) => match c.inner() {
                Some(inner) => self.check_expr(&inner),
                None => self.ctx.prims.unit,
            },

            Expr::Context(c) => {
                // Accepted but not analyzed further in this version.
                self.diags.note(
                    "context blocks are accepted but not analyzed",
                    node_span(c.syntax()),
                );
                if let Some(body) = c.body() {
                    self.check_block(&body);
                }
                self.ctx.prims.unit
            }

            Expr::Paren(p) => match p.inner() {
                Some(inner) => self.check_expr(&inner),
                None => self.ctx.prims.error,
            },

            Expr::Block(b) => {
                self.check_block(b);
                self.ctx.prims.unit
            }
        }
    }

    fn current_domain(&self) -> Option<String> {
        self.current_fn
            .as_ref()
            .and_then(|f| f.error_domain.clone())
    }

    fn check_name_ref(&mut self, name: &ferrule_parser::ast::expr::NameRef) -> TyId {
        let name_text = name.text();
        let span = node_span(name.syntax());

        let Some(symbol) = self.scopes.lookup(&name_text) else {
            self.diags.error(format!("undefined name '{name_text}'"), span);
            return self.ctx.prims.error;
        };

        let (ty, kind, detail) = match symbol {
            Symbol::Function(f) => {
                let f = f.clone();
                let detail = self.fn_detail(&f);
                let ty = resolve::fn_ty(self.ctx, &f);
                (ty, HoverKind::Function, Some(detail))
            }
            Symbol::Variable { ty, .. } => (*ty, HoverKind::Variable, None),
            Symbol::Constant { ty, .. } => (*ty, HoverKind::Constant, None),
            Symbol::Parameter { ty, .. } => (*ty, HoverKind::Parameter, None),
            Symbol::TypeDef { underlying, .. } => (*underlying, HoverKind::Type, None),
            Symbol::Domain => (self.ctx.prims.unit, HoverKind::Domain, None),
            Symbol::ErrorType { ty } => (*ty, HoverKind::ErrorType, None),
        };

        self.add_hover(span, &name_text, kind, ty, detail);
        self.locs.add_reference(&name_text, span);
        ty
    }

    fn check_binary(&mut self, b: &BinaryExpr) -> TyId {
        let lhs = b.lhs().map(|l| (self.check_expr(&l), node_span(l.syntax())));
        let rhs = b.rhs().map(|r| (self.check_expr(&r), node_span(r.syntax())));
        let Some(op) = b.op_token() else {
            return self.ctx.prims.error;
        };
        let op_span = token_span(&op);
        let op_text = op.text().to_string();

        let (Some((lhs_ty, _)), Some((rhs_ty, rhs_span))) = (lhs, rhs) else {
            return self.ctx.prims.error;
        };

        let merged = match self.unify(lhs_ty, rhs_ty) {
            Some(merged) => merged,
            None => {
                self.diags.error(
                    format!(
                        "operator '{}' requires matching operand types: {} vs {}",
                        op_text,
                        self.ctx.display_ty(lhs_ty),
                        self.ctx.display_ty(rhs_ty)
                    ),
                    rhs_span,
                );
                return self.ctx.prims.error;
            }
        };

        match op.kind() {
            SyntaxKind::PLUS | SyntaxKind::MINUS | SyntaxKind::STAR | SyntaxKind::SLASH
            | SyntaxKind::PERCENT => {
                if !self.ctx.ty(merged).is_numeric() && !matches!(self.ctx.ty(merged), Ty::Error) {
                    self.diags.error(
                        format!(
                            "operator '{}' requires numeric operands, found {}",
                            op_text,
                            self.ctx.display_ty(merged)
                        ),
                        op_span,
                    );
                    return self.ctx.prims.error;
                }
                merged
            }

            SyntaxKind::PLUS_PLUS => {
                let string = self.ctx.prims.string;
                if self.unify(string, merged).is_none() {
                    self.diags.error(
                        format!("'++' requires string operands, found {}", self.ctx.display_ty(merged)),
                        op_span,
                    );
                    return self.ctx.prims.error;
                }
                string
            }

            SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ => self.ctx.prims.bool_,

            SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => {
                let comparable = self.ctx.ty(merged).is_numeric()
                    || matches!(self.ctx.ty(merged), Ty::Char | Ty::Str | Ty::Error);
                if !comparable {
                    self.diags.error(
                        format!(
                            "operator '{}' cannot compare {}",
                            op_text,
                            self.ctx.display_ty(merged)
                        ),
                        op_span,
                    );
                }
                self.ctx.prims.bool_
            }

            SyntaxKind::AMP_AMP | SyntaxKind::PIPE_PIPE => {
                let bool_ = self.ctx.prims.bool_;
                if self.unify(bool_, merged).is_none() {
                    self.diags.error(
                        format!(
                            "logical operator requires bool operands, found {}",
                            self.ctx.display_ty(merged)
                        ),
                        op_span,
                    );
                }
                bool_
            }

            SyntaxKind::AMP | SyntaxKind::PIPE | SyntaxKind::CARET | SyntaxKind::SHL
            | SyntaxKind::SHR => {
                if !self.ctx.ty(merged).is_integer() && !matches!(self.ctx.ty(merged), Ty::Error) {
                    self.diags.error(
                        format!(
                            "operator '{}' requires integer operands, found {}",
                            op_text,
                            self.ctx.display_ty(merged)
                        ),
                        op_span,
                    );
                    return self.ctx.prims.error;
                }
                merged
            }

            _ => self.ctx.prims.error,
        }
    }

    fn check_unary(&mut self, u: &UnaryExpr) -> TyId {
        let operand_ty = match u.operand() {
            Some(operand) => self.check_expr(&operand),
            None => self.ctx.prims.error,
        };
        let Some(op) = u.op_token() else {
            return operand_ty;
        };

        match op.kind() {
            SyntaxKind::MINUS => {
                if !self.ctx.ty(operand_ty).is_numeric()
                    && !matches!(self.ctx.ty(operand_ty), Ty::Error)
                {
                    self.diags.error(
                        format!(
                            "unary '-' requires a numeric operand, found {}",
                            self.ctx.display_ty(operand_ty)
                        ),
                        token_span(&op),
                    );
                    return self.ctx.prims.error;
                }
                operand_ty
            }
            SyntaxKind::BANG => {
                let bool_ = self.ctx.prims.bool_;
                if self.unify(bool_, operand_ty).is_none() {
                    self.diags.error(
                        format!(
                            "unary '!' requires a bool operand, found {}",
                            self.ctx.display_ty(operand_ty)
                        ),
                        token_span(&op),
                    );
                }
                bool_
            }
            SyntaxKind::TILDE => {
                if !self.ctx.ty(operand_ty).is_integer()
                    && !matches!(self.ctx.ty(operand_ty), Ty::Error)
                {
                    self.diags.error(
                        format!(
                            "unary '~' requires an integer operand, found {}",
                            self.ctx.display_ty(operand_ty)
                        ),
                        token_span(&op),
                    );
                    return self.ctx.prims.error;
                }
                operand_ty
            }
            _ => operand_ty,
        }
    }

    // ── Calls ──────────────────────────────────────────────────────────

    fn check_call(&mut self, call: &CallExpr) -> TyId {
        let args: Vec<Expr> = call.args();

        // Direct call of a named function resolves through the symbol
        // table so generics, effects, and domains are visible.
        if let Some(Expr::NameRef(name)) = call.callee() {
            let name_text = name.text();
            if let Some(Symbol::Function(sym)) = self.scopes.lookup(&name_text) {
                let sym = sym.clone();
                // Record the callee use site.
                let callee = Expr::NameRef(name.clone());
                self.check_expr(&callee);
                return self.check_direct_call(&sym, call, &args);
            }
        }

        // Anything else: evaluate the callee and require a function type.
        let Some(callee) = call.callee() else {
            return self.ctx.prims.error;
        };
        let callee_ty = self.check_expr(&callee);
        let structural = self.unwrap_named(callee_ty);
        match self.ctx.ty(structural).clone() {
            Ty::Fn(f) => self.check_fn_ty_call(&f, call, &args),
            Ty::Error => {
                for arg in &args {
                    self.check_expr(arg);
                }
                self.ctx.prims.error
            }
            _ => {
                for arg in &args {
                    self.check_expr(arg);
                }
                self.diags.error(
                    format!("{} is not callable", self.ctx.display_ty(callee_ty)),
                    node_span(callee.syntax()),
                );
                self.ctx.prims.error
            }
        }
    }

    /// Check a call against a resolved function symbol, including
    /// type-argument inference for generic functions.
    fn check_direct_call(&mut self, sym: &FunctionSymbol, call: &CallExpr, args: &[Expr]) -> TyId {
        let call_span = node_span(call.syntax());

        if args.len() != sym.param_tys.len() {
            self.diags.error(
                format!(
                    "function '{}' expects {} argument(s), found {}",
                    sym.name,
                    sym.param_tys.len(),
                    args.len()
                ),
                call_span,
            );
            for arg in args {
                self.check_expr(arg);
            }
            return self.ctx.prims.error;
        }

        let arg_tys: Vec<(TyId, Span)> = args
            .iter()
            .map(|arg| (self.check_expr(arg), node_span(arg.syntax())))
            .collect();

        // Infer type arguments structurally from the actual arguments.
        let mut bindings: FxHashMap<StrId, TyId> = FxHashMap::default();
        if !sym.type_params.is_empty() {
            for (param_ty, (arg_ty, _)) in sym.param_tys.iter().zip(&arg_tys) {
                self.infer_type_args(*param_ty, *arg_ty, &mut bindings);
            }
            for param in &sym.type_params {
                let id = self.ctx.intern_str(param);
                if !bindings.contains_key(&id) {
                    self.diags.error(
                        format!(
                            "cannot infer type parameter '{}' of '{}'",
                            param, sym.name
                        ),
                        call_span,
                    );
                    return self.ctx.prims.error;
                }
            }
        }

        for (i, (param_ty, (arg_ty, arg_span))) in
            sym.param_tys.iter().zip(&arg_tys).enumerate()
        {
            let expected = self.substitute(*param_ty, &bindings);
            if self.unify(expected, *arg_ty).is_none() {
                self.diags.error(
                    format!(
                        "argument {} of '{}' expects {}, found {}",
                        i + 1,
                        sym.name,
                        self.ctx.display_ty(expected),
                        self.ctx.display_ty(*arg_ty)
                    ),
                    *arg_span,
                );
            }
        }

        let ret = self.substitute(sym.ret, &bindings);
        match &sym.error_domain {
            Some(domain) => {
                let domain = domain.clone();
                self.ctx.result_ty(ret, &domain)
            }
            None => ret,
        }
    }

    /// Check a call through a function-typed value (no generics).
    fn check_fn_ty_call(&mut self, f: &FnTy, call: &CallExpr, args: &[Expr]) -> TyId {
        if args.len() != f.params.len() {
            self.diags.error(
                format!(
                    "function expects {} argument(s), found {}",
                    f.params.len(),
                    args.len()
                ),
                node_span(call.syntax()),
            );
            for arg in args {
                self.check_expr(arg);
            }
            return self.ctx.prims.error;
        }

        let params = f.params.clone();
        for (param_ty, arg) in params.iter().zip(args) {
            let arg_ty = self.check_expr(arg);
            if self.unify(*param_ty, arg_ty).is_none() {
                self.mismatch(*param_ty, arg_ty, node_span(arg.syntax()));
            }
        }

        match f.error_domain {
            Some(domain) => {
                let domain = self.ctx.str(domain).to_string();
                self.ctx.result_ty(f.ret, &domain)
            }
            None => f.ret,
        }
    }

    /// Bind type-parameter occurrences in `param` to the corresponding
    /// pieces of `arg`. First binding wins; a later conflict surfaces as
    /// an argument mismatch after substitution.
    fn infer_type_args(&mut self, param: TyId, arg: TyId, bindings: &mut FxHashMap<StrId, TyId>) {
        let param_ty = self.ctx.ty(param).clone();
        let arg_ty = self.ctx.ty(arg).clone();

        match (param_ty, arg_ty) {
            (Ty::TypeParam(name), _) => {
                // Don't bind a parameter to a bare literal pseudo-type;
                // default it to i64 so the instantiation is concrete.
                let bound = if self.ctx.ty(arg).is_literal() {
                    self.ctx.prims.i64
                } else {
                    arg
                };
                bindings.entry(name).or_insert(bound);
            }
            (Ty::Array { elem: p, .. }, Ty::Array { elem: a, .. })
            | (Ty::Vector { elem: p, .. }, Ty::Vector { elem: a, .. })
            | (Ty::View { elem: p, .. }, Ty::View { elem: a, .. })
            | (Ty::Nullable(p), Ty::Nullable(a))
            | (Ty::Range(p), Ty::Range(a)) => {
                self.infer_type_args(p, a, bindings);
            }
            (Ty::Result { ok: p, .. }, Ty::Result { ok: a, .. }) => {
                self.infer_type_args(p, a, bindings);
            }
            (Ty::Fn(p), Ty::Fn(a)) if p.params.len() == a.params.len() => {
                for (pp, ap) in p.params.iter().zip(&a.params) {
                    self.infer_type_args(*pp, *ap, bindings);
                }
                self.infer_type_args(p.ret, a.ret, bindings);
            }
            (Ty::Named { underlying: p, .. }, Ty::Named { underlying: a, .. }) => {
                self.infer_type_args(p, a, bindings);
            }
            _ => {}
        }
    }

    /// Rebuild a type with type parameters replaced by their bindings.
    fn substitute(&mut self, ty: TyId, bindings: &FxHashMap<StrId, TyId>) -> TyId {
        if bindings.is_empty() {
            return ty;
        }
        match self.ctx.ty(ty).clone() {
            Ty::TypeParam(name) => bindings.get(&name).copied().unwrap_or(ty),
            Ty::Array { elem, len } => {
                let elem = self.substitute(elem, bindings);
                self.ctx.intern_ty(Ty::Array { elem, len })
            }
            Ty::Vector { elem, len } => {
                let elem = self.substitute(elem, bindings);
                self.ctx.intern_ty(Ty::Vector { elem, len })
            }
            Ty::View { elem, mutable } => {
                let elem = self.substitute(elem, bindings);
                self.ctx.intern_ty(Ty::View { elem, mutable })
            }
            Ty::Nullable(inner) => {
                let inner = self.substitute(inner, bindings);
                self.ctx.intern_ty(Ty::Nullable(inner))
            }
            Ty::Range(elem) => {
                let elem = self.substitute(elem, bindings);
                self.ctx.intern_ty(Ty::Range(elem))
            }
            Ty::Result { ok, domain } => {
                let ok = self.substitute(ok, bindings);
                self.ctx.intern_ty(Ty::Result { ok, domain })
            }
            Ty::Fn(f) => {
                let params = f
                    .params
                    .iter()
                    .map(|p| self.substitute(*p, bindings))
                    .collect();
                let ret = self.substitute(f.ret, bindings);
                self.ctx.intern_ty(Ty::Fn(FnTy {
                    params,
                    ret,
                    effects: f.effects,
                    error_domain: f.error_domain,
                    type_params: f.type_params,
                }))
            }
            Ty::Record { fields } => {
                let fields = fields
                    .into_iter()
                    .map(|(name, ty)| (name, self.substitute(ty, bindings)))
                    .collect();
                self.ctx.intern_ty(Ty::Record { fields })
            }
            _ => ty,
        }
    }

    // ── Field access ───────────────────────────────────────────────────

    fn check_field_access(&mut self, f: &FieldAccess) -> TyId {
        let base_ty = match f.base() {
            Some(base) => self.check_expr(&base),
            None => self.ctx.prims.error,
        };
        let Some(field) = f.field_token() else {
            return self.ctx.prims.error;
        };
        let field_name = field.text().to_string();
        let field_span = token_span(&field);

        let structural = self.unwrap_named(base_ty);
        let ty = match self.ctx.ty(structural).clone() {
            Ty::Record { fields } => {
                let found = fields
                    .iter()
                    .find(|(name, _)| self.ctx.str(*name) == field_name)
                    .map(|(_, ty)| *ty);
                match found {
                    Some(ty) => ty,
                    None => {
                        self.diags.error(
                            format!(
                                "type {} has no field '{}'",
                                self.ctx.display_ty(base_ty),
                                field_name
                            ),
                            field_span,
                        );
                        self.ctx.prims.error
                    }
                }
            }

            // Results expose their discriminant and payloads.
            Ty::Result { ok, .. } => match field_name.as_str() {
                "tag" => self.ctx.prims.i8,
                "value" => ok,
                "error_code" => self.ctx.prims.i64,
                _ => {
                    self.diags.error(
                        format!("Result has no field '{field_name}'"),
                        field_span,
                    );
                    self.ctx.prims.error
                }
            },

            Ty::Nullable(inner) => match field_name.as_str() {
                "has_value" => self.ctx.prims.bool_,
                "value" => inner,
                _ => {
                    self.diags.error(
                        format!("nullable type has no field '{field_name}'"),
                        field_span,
                    );
                    self.ctx.prims.error
                }
            },

            Ty::Str => match field_name.as_str() {
                "len" => self.ctx.prims.i64,
                "ptr" => self.ctx.prims.usize,
                _ => {
                    self.diags.error(
                        format!("string has no field '{field_name}'"),
                        field_span,
                    );
                    self.ctx.prims.error
                }
            },

            Ty::Array { .. } => match field_name.as_str() {
                "len" => self.ctx.prims.usize,
                _ => {
                    self.diags.error(
                        format!("array has no field '{field_name}'"),
                        field_span,
                    );
                    self.ctx.prims.error
                }
            },

            // Regions expose their disposal handle.
            Ty::Region if field_name == "dispose" => {
                let unit = self.ctx.prims.unit;
                self.ctx.intern_ty(Ty::Fn(FnTy {
                    params: Vec::new(),
                    ret: unit,
                    effects: EffectSet::empty(),
                    error_domain: None,
                    type_params: Vec::new(),
                }))
            }

            Ty::Error => self.ctx.prims.error,

            _ => {
                self.diags.error(
                    format!(
                        "type {} has no field '{}'",
                        self.ctx.display_ty(base_ty),
                        field_name
                    ),
                    field_span,
                );
                self.ctx.prims.error
            }
        };

        self.add_hover(field_span, &field_name, HoverKind::Field, ty, None);
        ty
    }

    // ── Variant constructors ───────────────────────────────────────────

    /// Resolve an uppercase constructor to the union type declaring it.
    fn check_variant_ctor(&mut self, ctor: &VariantCtor) -> TyId {
        let Some(name) = ctor.name() else {
            return self.ctx.prims.error;
        };
        let variant_name = name.text();
        let span = node_span(name.syntax());

        // Search global type declarations for a union with this variant.
        let mut owner: Option<(String, TyId, Vec<(StrId, TyId)>)> = None;
        for (type_name, symbol) in self.scopes.globals() {
            let Symbol::TypeDef { underlying, .. } = symbol else {
                continue;
            };
            let structural = self.unwrap_named(*underlying);
            if let Ty::Union { variants } = self.ctx.ty(structural) {
                if let Some((_, fields)) = variants
                    .iter()
                    .find(|(vname, _)| self.ctx.str(*vname) == variant_name)
                {
                    owner = Some((type_name.clone(), *underlying, fields.clone()));
                    break;
                }
            }
        }

        let Some((type_name, underlying, decl_fields)) = owner else {
            for field in ctor.fields() {
                if let Some(value) = field.value() {
                    self.check_expr(&value);
                }
            }
            // Domain variants may be rebuilt in `map_error` transforms;
            // they are not first-class values, so they type as opaque.
            let is_domain_variant = self
                .domains_with_variant(&variant_name);
            if !is_domain_variant {
                self.diags.error(format!("unknown variant '{variant_name}'"), span);
            }
            return self.ctx.prims.error;
        };

        // Check provided fields against the variant's declaration.
        for field in ctor.fields() {
            let Some(fname) = field.name() else { continue };
            let fname_text = fname.text();
            let declared = decl_fields
                .iter()
                .find(|(n, _)| self.ctx.str(*n) == fname_text)
                .map(|(_, ty)| *ty);
            let value_ty = match field.value() {
                Some(value) => {
                    let span = node_span(value.syntax());
                    Some((self.check_expr(&value), span))
                }
                None => None,
            };
            match (declared, value_ty) {
                (Some(declared), Some((found, span))) => {
                    if self.unify(declared, found).is_none() {
                        self.mismatch(declared, found, span);
                    }
                }
                (None, _) => {
                    self.diags.error(
                        format!("variant '{variant_name}' has no field '{fname_text}'"),
                        node_span(fname.syntax()),
                    );
                }
                _ => {}
            }
        }

        let interned_name = self.ctx.intern_str(&type_name);
        self.ctx.intern_ty(Ty::Named {
            name: interned_name,
            underlying,
        })
    }

    /// Whether any declared domain has a variant with this name.
    fn domains_with_variant(&self, name: &str) -> bool {
        self.scopes.globals().any(|(domain_name, symbol)| {
            matches!(symbol, Symbol::Domain)
                && self
                    .domains
                    .get(domain_name)
                    .is_some_and(|info| info.variant(name).is_some())
        })
    }

    /// Check `err Variant { field: value }` fields against the current
    /// domain's variant declaration. Variant-existence errors belong to
    /// the error checker; this only types the field values.
    fn check_err_fields(&mut self, ctor: &VariantCtor) {
        let declared: Option<Vec<(String, TyId)>> = self.current_domain().and_then(|domain| {
            let name = ctor.name()?.text();
            let info = self.domains.get(&domain)?;
            info.variant(&name).map(|v| v.fields.clone())
        });

        for field in ctor.fields() {
            let value_ty = match field.value() {
                Some(value) => {
                    let span = node_span(value.syntax());
                    Some((self.check_expr(&value), span))
                }
                None => None,
            };
            let (Some(fname), Some(declared)) = (field.name(), &declared) else {
                continue;
            };
            let fname_text = fname.text();
            match declared.iter().find(|(n, _)| *n == fname_text) {
                Some((_, field_ty)) => {
                    if let Some((found, span)) = value_ty {
                        let expected = *field_ty;
                        if self.unify(expected, found).is_none() {
                            self.mismatch(expected, found, span);
                        }
                    }
                }
                None => {
                    let variant = ctor.name().map(|n| n.text()).unwrap_or_default();
                    self.diags.error(
                        format!("variant '{variant}' has no field '{fname_text}'"),
                        node_span(fname.syntax()),
                    );
                }
            }
        }
    }

    // ── Match ──────────────────────────────────────────────────────────

    fn check_match(&mut self, m: &MatchExpr) -> TyId {
        let scrutinee_ty = match m.scrutinee() {
            Some(scrutinee) => self.check_expr(&scrutinee),
            None => self.ctx.prims.error,
        };

        let mut result: Option<TyId> = None;
        for arm in m.arms() {
            self.scopes.push();

            if let Some(pattern) = arm.pattern() {
                self.check_pattern(&pattern, scrutinee_ty);
            }

            if let Some(body) = arm.body() {
                let body_ty = self.check_expr(&body);
                result = match result {
                    None => Some(body_ty),
                    Some(previous) => match self.unify(previous, body_ty) {
                        Some(merged) => Some(merged),
                        None => {
                            self.diags.error(
                                format!(
                                    "match arms have mismatched types: {} vs {}",
                                    self.ctx.display_ty(previous),
                                    self.ctx.display_ty(body_ty)
                                ),
                                node_span(body.syntax()),
                            );
                            Some(previous)
                        }
                    },
                };
            }

            self.scopes.pop();
        }

        result.unwrap_or(self.ctx.prims.unit)
    }

    /// Validate a pattern against the scrutinee type and bind its names
    /// into the current (arm) scope.
    fn check_pattern(&mut self, pattern: &Pattern, scrutinee: TyId) {
        let structural = self.unwrap_named(scrutinee);
        let scrutinee_is_error = matches!(self.ctx.ty(structural), Ty::Error);
        let span = node_span(pattern.syntax());

        match pattern {
            Pattern::Wildcard(_) => {}

            Pattern::Ident(ident) => {
                let name = ident.text();
                let depth = self.scopes.depth();
                self.scopes.insert(
                    name.clone(),
                    Symbol::Variable {
                        ty: scrutinee,
                        mutable: false,
                        depth,
                    },
                );
                self.add_hover(span, &name, HoverKind::Variable, scrutinee, None);
            }

            Pattern::Literal(_) => {
                // Literal patterns must agree with the scrutinee's class;
                // precise literal typing reuses the expression rules.
                let compatible = match self.ctx.ty(structural) {
                    Ty::Int(_) | Ty::Float(_) | Ty::IntLit | Ty::FloatLit => true,
                    Ty::Bool | Ty::Str | Ty::Char | Ty::Nullable(_) | Ty::Error => true,
                    _ => false,
                };
                if !compatible {
                    self.diags.error(
                        format!(
                            "pattern is not compatible with scrutinee type {}",
                            self.ctx.display_ty(scrutinee)
                        ),
                        span,
                    );
                }
            }

            Pattern::Variant(variant) => {
                let Some(name) = variant.name() else { return };
                let variant_name = name.text();
                match self.ctx.ty(structural).clone() {
                    Ty::Union { variants } => {
                        let found = variants
                            .iter()
                            .find(|(vname, _)| self.ctx.str(*vname) == variant_name)
                            .map(|(_, fields)| fields.clone());
                        match found {
                            Some(fields) => {
                                for binding in variant.field_bindings() {
                                    let bname = binding.text().to_string();
                                    let ty = fields
                                        .iter()
                                        .find(|(n, _)| self.ctx.str(*n) == bname)
                                        .map(|(_, ty)| *ty);
                                    match ty {
                                        Some(ty) => {
                                            let depth = self.scopes.depth();
                                            self.scopes.insert(
                                                bname.clone(),
                                                Symbol::Variable {
                                                    ty,
                                                    mutable: false,
                                                    depth,
                                                },
                                            );
                                            self.add_hover(
                                                token_span(&binding),
                                                &bname,
                                                HoverKind::Variable,
                                                ty,
                                                None,
                                            );
                                        }
                                        None => {
                                            self.diags.error(
                                                format!(
                                                    "variant '{variant_name}' has no field '{bname}'"
                                                ),
                                                token_span(&binding),
                                            );
                                        }
                                    }
                                }
                            }
                            None => {
                                self.diags.error(
                                    format!(
                                        "type {} has no variant '{}'",
                                        self.ctx.display_ty(scrutinee),
                                        variant_name
                                    ),
                                    span,
                                );
                            }
                        }
                    }
                    Ty::Error => {}
                    _ => {
                        self.diags.error(
                            format!(
                                "pattern is not compatible with scrutinee type {}",
                                self.ctx.display_ty(scrutinee)
                            ),
                            span,
                        );
                    }
                }
            }

            Pattern::Ok(ok) => match self.ctx.ty(structural).clone() {
                Ty::Result { ok: ok_ty, .. } => {
                    if let Some(binding) = ok.binding() {
                        let name = binding.text();
                        let depth = self.scopes.depth();
                        self.scopes.insert(
                            name.clone(),
                            Symbol::Variable {
                                ty: ok_ty,
                                mutable: false,
                                depth,
                            },
                        );
                        self.add_hover(
                            node_span(binding.syntax()),
                            &name,
                            HoverKind::Variable,
                            ok_ty,
                            None,
                        );
                    }
                }
                Ty::Error => {}
                _ => {
                    self.diags.error(
                        format!(
                            "`ok` pattern requires a Result scrutinee, found {}",
                            self.ctx.display_ty(scrutinee)
                        ),
                        span,
                    );
                }
            },

            Pattern::Err(err) => match self.ctx.ty(structural) {
                Ty::Result { .. } => {
                    if let Some(binding) = err.binding() {
                        let name = binding.text();
                        // The error payload is opaque; bind it loosely.
                        let error = self.ctx.prims.error;
                        let depth = self.scopes.depth();
                        self.scopes.insert(
                            name,
                            Symbol::Variable {
                                ty: error,
                                mutable: false,
                                depth,
                            },
                        );
                    }
                }
                Ty::Error => {}
                _ => {
                    self.diags.error(
                        format!(
                            "`err` pattern requires a Result scrutinee, found {}",
                            self.ctx.display_ty(scrutinee)
                        ),
                        span,
                    );
                }
            },

            Pattern::Some(some) => match self.ctx.ty(structural).clone() {
                Ty::Nullable(inner) => {
                    if let Some(binding) = some.binding() {
                        let name = binding.text();
                        let depth = self.scopes.depth();
                        self.scopes.insert(
                            name.clone(),
                            Symbol::Variable {
                                ty: inner,
                                mutable: false,
                                depth,
                            },
                        );
                        self.add_hover(
                            node_span(binding.syntax()),
                            &name,
                            HoverKind::Variable,
                            inner,
                            None,
                        );
                    }
                }
                Ty::Error => {}
                _ => {
                    self.diags.error(
                        format!(
                            "`Some` pattern requires a nullable scrutinee, found {}",
                            self.ctx.display_ty(scrutinee)
                        ),
                        span,
                    );
                }
            },

            Pattern::None(_) => {
                if !matches!(self.ctx.ty(structural), Ty::Nullable(_)) && !scrutinee_is_error {
                    self.diags.error(
                        format!(
                            "`None` pattern requires a nullable scrutinee, found {}",
                            self.ctx.display_ty(scrutinee)
                        ),
                        span,
                    );
                }
            }
        }
    }

    // ── Anonymous functions ────────────────────────────────────────────

    fn check_anon_fn(&mut self, f: &ferrule_parser::ast::expr::AnonFnExpr) -> TyId {
        // Arrow-form lambdas only occur inside map_error and are checked
        // there; this handles the keyword-led form.
        let mut param_tys = Vec::new();

        self.scopes.push();
        if let Some(list) = f.param_list() {
            for param in list.syntax().children().filter_map(ferrule_parser::ast::item::Param::cast)
            {
                let ty = match param.ty() {
                    Some(ty) => {
                        let mut tpctx = self.local_tpctx();
                        resolve::resolve_type(&ty, self.ctx, self.scopes, &mut tpctx, self.diags)
                    }
                    None => self.ctx.prims.error,
                };
                param_tys.push(ty);
                if let Some(name) = param.name() {
                    let name_text = name.text();
                    self.scopes.insert(
                        name_text.clone(),
                        Symbol::Parameter {
                            ty,
                            inout: param.is_inout(),
                            capability: param.is_cap(),
                        },
                    );
                    self.add_hover(
                        node_span(name.syntax()),
                        &name_text,
                        HoverKind::Parameter,
                        ty,
                        None,
                    );
                }
            }
        }

        let ret = match f.ret_type().and_then(|r| r.ty()) {
            Some(ty) => {
                let mut tpctx = self.local_tpctx();
                resolve::resolve_type(&ty, self.ctx, self.scopes, &mut tpctx, self.diags)
            }
            None => self.ctx.prims.unit,
        };

        // The body checks against the anonymous function's own return
        // type, not the enclosing function's; the enclosing generics
        // stay visible.
        let saved = self.current_fn.take();
        self.current_fn = Some(CurrentFn {
            ret,
            error_domain: None,
            tpctx: saved
                .as_ref()
                .map(|f| f.tpctx.clone())
                .unwrap_or_else(TypeParamCtx::empty),
        });
        if let Some(body) = f.body() {
            self.check_block(&body);
        }
        self.current_fn = saved;
        self.scopes.pop();

        self.ctx.intern_ty(Ty::Fn(FnTy {
            params: param_tys,
            ret,
            effects: EffectSet::empty(),
            error_domain: None,
            type_params: Vec::new(),
        }))
    }
}
