//! Pass 2: type resolution.
//!
//! Maps AST type expressions to interned resolved types and fills the
//! placeholder types that pass 1 left in the global scope: type-decl
//! underlyings, error-decl field records, domain variant fields, function
//! signatures, and top-level constant annotations.
//!
//! Resolution failures are diagnosed and substitute `unit` so that
//! checking can continue; the checker suppresses cascades against the
//! placeholder.

use ferrule_common::diagnostics::Diagnostics;

use ferrule_parser::ast::item::{Item, SourceFile, VariantDef};
use ferrule_parser::ast::ty::Type;
use ferrule_parser::ast::AstNode;

use crate::context::Context;
use crate::domains::DomainTable;
use crate::symbols::{ScopeStack, Symbol};
use crate::ty::{CapKind, FloatWidth, FnTy, IntWidth, Ty, TyId};
use crate::util::node_span;

/// Transient type-parameter context for one generic declaration.
///
/// Names listed here resolve to `Ty::TypeParam` instead of being looked
/// up in the symbol table. A parameter used in a const-generic position
/// (`Array<_, N>`) is flagged so later passes can tell value parameters
/// from type parameters.
#[derive(Debug, Default, Clone)]
pub struct TypeParamCtx {
    params: Vec<(String, bool)>,
}

impl TypeParamCtx {
    pub fn empty() -> TypeParamCtx {
        TypeParamCtx::default()
    }

    pub fn new(names: &[String]) -> TypeParamCtx {
        TypeParamCtx {
            params: names.iter().map(|n| (n.clone(), false)).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn mark_const(&mut self, name: &str) {
        if let Some(entry) = self.params.iter_mut().find(|(n, _)| n == name) {
            entry.1 = true;
        }
    }

    pub fn is_const(&self, name: &str) -> bool {
        self.params
            .iter()
            .any(|(n, is_const)| n == name && *is_const)
    }
}

/// Resolve one AST type expression to an interned type.
pub fn resolve_type(
    ty: &Type,
    ctx: &mut Context,
    scopes: &ScopeStack,
    tpctx: &mut TypeParamCtx,
    diags: &mut Diagnostics,
) -> TyId {
    match ty {
        Type::Unit(_) => ctx.prims.unit,

        Type::Simple(simple) => {
            let name = simple.text();
            resolve_named(&name, simple.syntax(), ctx, scopes, tpctx, diags)
        }

        Type::Nullable(nullable) => {
            let inner = match nullable.inner() {
                Some(inner) => resolve_type(&inner, ctx, scopes, tpctx, diags),
                None => ctx.prims.unit,
            };
            ctx.intern_ty(Ty::Nullable(inner))
        }

        Type::Record(record) => {
            let mut fields = Vec::new();
            for field in record.fields() {
                let Some(name) = field.name() else { continue };
                let field_ty = match field.ty() {
                    Some(ty) => resolve_type(&ty, ctx, scopes, tpctx, diags),
                    None => ctx.prims.unit,
                };
                let name = ctx.intern_str(&name.text());
                fields.push((name, field_ty));
            }
            ctx.intern_ty(Ty::Record { fields })
        }

        Type::Union(union) => {
            let variants = resolve_variants(union.variants(), ctx, scopes, tpctx, diags);
            ctx.intern_ty(Ty::Union { variants })
        }

        Type::Generic(generic) => {
            let Some(name) = generic.name() else {
                return ctx.prims.unit;
            };
            let name_text = name.text();
            let args = generic.args();
            let span = node_span(generic.syntax());

            match name_text.as_str() {
                "Array" | "Vector" => {
                    if args.len() != 2 {
                        diags.error(
                            format!("{name_text} takes exactly two arguments: element type and length"),
                            span,
                        );
                        return ctx.prims.unit;
                    }
                    let elem = match args[0].ty() {
                        Some(ty) => resolve_type(&ty, ctx, scopes, tpctx, diags),
                        None => ctx.prims.unit,
                    };
                    // The length is a const-generic value: a literal, or a
                    // const-flagged type parameter inside a generic decl.
                    let len = match args[1].const_value() {
                        Some(n) => n,
                        None => {
                            if let Some(Type::Simple(param)) = args[1].ty() {
                                let pname = param.text();
                                if tpctx.contains(&pname) {
                                    tpctx.mark_const(&pname);
                                    0
                                } else {
                                    diags.error(
                                        format!("{name_text} length must be an integer"),
                                        span,
                                    );
                                    0
                                }
                            } else {
                                diags.error(
                                    format!("{name_text} length must be an integer"),
                                    span,
                                );
                                0
                            }
                        }
                    };
                    if name_text == "Array" {
                        ctx.intern_ty(Ty::Array { elem, len })
                    } else {
                        ctx.intern_ty(Ty::Vector { elem, len })
                    }
                }

                "View" => {
                    if args.len() != 1 {
                        diags.error("View takes exactly one element argument", span);
                        return ctx.prims.unit;
                    }
                    let mutable = args[0].is_mut();
                    let elem = match args[0].ty() {
                        Some(ty) => resolve_type(&ty, ctx, scopes, tpctx, diags),
                        None => ctx.prims.unit,
                    };
                    ctx.intern_ty(Ty::View { elem, mutable })
                }

                _ => {
                    // A user-declared generic type. Resolve the arguments
                    // for their own diagnostics, then resolve the name.
                    for arg in &args {
                        if let Some(ty) = arg.ty() {
                            resolve_type(&ty, ctx, scopes, tpctx, diags);
                        }
                    }
                    resolve_named(&name_text, generic.syntax(), ctx, scopes, tpctx, diags)
                }
            }
        }
    }
}

/// Resolve a bare type name: primitive scalar, capability token, type
/// parameter, or user-declared type.
fn resolve_named(
    name: &str,
    node: &ferrule_parser::SyntaxNode,
    ctx: &mut Context,
    scopes: &ScopeStack,
    tpctx: &TypeParamCtx,
    diags: &mut Diagnostics,
) -> TyId {
    if let Some(width) = IntWidth::from_name(name) {
        return ctx.int_ty(width);
    }
    if let Some(width) = FloatWidth::from_name(name) {
        return ctx.float_ty(width);
    }
    match name {
        "bool" => return ctx.prims.bool_,
        "char" => return ctx.prims.char_,
        "string" => return ctx.prims.string,
        "bytes" => return ctx.prims.bytes,
        "Region" => return ctx.prims.region,
        _ => {}
    }
    if let Some(kind) = CapKind::from_name(name) {
        return ctx.capability_ty(kind);
    }
    if tpctx.contains(name) {
        let id = ctx.intern_str(name);
        return ctx.intern_ty(Ty::TypeParam(id));
    }
    match scopes.lookup(name) {
        Some(Symbol::TypeDef { underlying, .. }) => {
            let underlying = *underlying;
            let name = ctx.intern_str(name);
            ctx.intern_ty(Ty::Named { name, underlying })
        }
        Some(Symbol::ErrorType { ty }) => *ty,
        _ => {
            diags.error(format!("unknown type '{name}'"), node_span(node));
            ctx.prims.unit
        }
    }
}

/// Resolve a variant list (unions and domains share the AST shape).
fn resolve_variants(
    variants: impl Iterator<Item = VariantDef>,
    ctx: &mut Context,
    scopes: &ScopeStack,
    tpctx: &mut TypeParamCtx,
    diags: &mut Diagnostics,
) -> Vec<(crate::context::StrId, Vec<(crate::context::StrId, TyId)>)> {
    variants
        .filter_map(|v| {
            let name = v.name()?;
            let fields: Vec<_> = v
                .fields()
                .filter_map(|f| {
                    let fname = f.name()?;
                    let fty = match f.ty() {
                        Some(ty) => resolve_type(&ty, ctx, scopes, tpctx, diags),
                        None => ctx.prims.unit,
                    };
                    Some((ctx.intern_str(&fname.text()), fty))
                })
                .collect();
            Some((ctx.intern_str(&name.text()), fields))
        })
        .collect()
}

/// Fill every placeholder that pass 1 left behind.
pub fn run(
    file: &SourceFile,
    ctx: &mut Context,
    scopes: &mut ScopeStack,
    domains: &mut DomainTable,
    diags: &mut Diagnostics,
) {
    // Type declarations first so later signatures can reference them.
    for decl in file.decls() {
        if let Item::TypeDecl(t) = decl {
            let Some(name) = t.name() else { continue };
            let name_text = name.text();
            let params: Vec<String> = t
                .type_params()
                .iter()
                .map(|tok| tok.text().to_string())
                .collect();
            let mut tpctx = TypeParamCtx::new(&params);
            let underlying = match t.ty() {
                Some(ty) => resolve_type(&ty, ctx, scopes, &mut tpctx, diags),
                None => ctx.prims.unit,
            };
            scopes.replace(
                name_text,
                Symbol::TypeDef {
                    type_params: params,
                    underlying,
                },
            );
        }
    }

    // Error declarations become record-shaped error types.
    for decl in file.decls() {
        if let Item::ErrorDecl(e) = decl {
            let Some(name) = e.name() else { continue };
            let mut tpctx = TypeParamCtx::empty();
            let mut fields = Vec::new();
            for field in e.fields() {
                let Some(fname) = field.name() else { continue };
                let fty = match field.ty() {
                    Some(ty) => resolve_type(&ty, ctx, scopes, &mut tpctx, diags),
                    None => ctx.prims.unit,
                };
                fields.push((ctx.intern_str(&fname.text()), fty));
            }
            let record = ctx.intern_ty(Ty::Record { fields });
            let interned_name = ctx.intern_str(&name.text());
            let ty = ctx.intern_ty(Ty::Named {
                name: interned_name,
                underlying: record,
            });
            scopes.replace(name.text(), Symbol::ErrorType { ty });
        }
    }

    // Domain variant field types.
    for decl in file.decls() {
        if let Item::DomainDecl(d) = decl {
            let Some(name) = d.name() else { continue };
            let mut tpctx = TypeParamCtx::empty();
            let mut resolved: Vec<(String, Vec<(String, TyId)>)> = Vec::new();
            for variant in d.variants() {
                let Some(vname) = variant.name() else { continue };
                let fields: Vec<(String, TyId)> = variant
                    .fields()
                    .filter_map(|f| {
                        let fname = f.name()?;
                        let fty = match f.ty() {
                            Some(ty) => resolve_type(&ty, ctx, scopes, &mut tpctx, diags),
                            None => ctx.prims.unit,
                        };
                        Some((fname.text(), fty))
                    })
                    .collect();
                resolved.push((vname.text(), fields));
            }
            if let Some(info) = domains.get_mut(&name.text()) {
                for (vname, fields) in resolved {
                    if let Some(variant) =
                        info.variants.iter_mut().find(|v| v.name == vname)
                    {
                        variant.fields = fields;
                    }
                }
            }
        }
    }

    // Function signatures.
    for decl in file.decls() {
        if let Item::FnDecl(f) = decl {
            let Some(name) = f.name() else { continue };
            let name_text = name.text();
            let Some(Symbol::Function(symbol)) = scopes.lookup_global(&name_text) else {
                continue;
            };
            let mut symbol = symbol.clone();

            let mut tpctx = TypeParamCtx::new(&symbol.type_params);
            let mut param_tys = Vec::new();
            for param in f.params() {
                let ty = match param.ty() {
                    Some(ty) => resolve_type(&ty, ctx, scopes, &mut tpctx, diags),
                    None => ctx.prims.unit,
                };
                param_tys.push(ty);
            }
            symbol.param_tys = param_tys;
            symbol.ret = match f.ret_type().and_then(|r| r.ty()) {
                Some(ty) => resolve_type(&ty, ctx, scopes, &mut tpctx, diags),
                None => ctx.prims.unit,
            };

            scopes.replace(name_text, Symbol::Function(symbol));
        }
    }

    // Top-level constant annotations. Unannotated constants keep the
    // placeholder; the checker diagnoses them at the initializer.
    for decl in file.decls() {
        if let Item::ConstDecl(c) = decl {
            let Some(name) = c.name() else { continue };
            if let Some(ty) = c.ty() {
                let mut tpctx = TypeParamCtx::empty();
                let resolved = resolve_type(&ty, ctx, scopes, &mut tpctx, diags);
                scopes.replace(
                    name.text(),
                    Symbol::Constant {
                        ty: resolved,
                        depth: 0,
                    },
                );
            }
        }
    }
}

/// Build the interned function type for a resolved signature.
pub fn fn_ty(ctx: &mut Context, symbol: &crate::symbols::FunctionSymbol) -> TyId {
    let type_params = symbol
        .type_params
        .iter()
        .map(|p| ctx.intern_str(p))
        .collect();
    let error_domain = symbol.error_domain.as_ref().map(|d| ctx.intern_str(d));
    ctx.intern_ty(Ty::Fn(FnTy {
        params: symbol.param_tys.clone(),
        ret: symbol.ret,
        effects: symbol.effects,
        error_domain,
        type_params,
    }))
}
