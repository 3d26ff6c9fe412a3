//! Pass 1: declaration collection.
//!
//! A single walk over the module's top-level declarations that reserves
//! global names for functions, type declarations, error declarations,
//! domains, and constants. No bodies are inspected. Function signatures
//! get placeholder parameter and return types, filled by the resolver in
//! pass 2; domains get a symbol and a domain-table entry (variant names
//! now, field types in pass 2).
//!
//! This pass accumulates: duplicate-declaration and unknown-effect
//! diagnostics do not stop the walk. If it records any error, the driver
//! skips the later passes, which depend on a consistent declaration set.

use ferrule_common::diagnostics::{Diagnostic, Diagnostics};
use ferrule_common::span::Span;

use ferrule_parser::ast::item::{FnDecl, Item, SourceFile};
use ferrule_parser::ast::AstNode;

use crate::context::Context;
use crate::domains::{DomainInfo, DomainTable, DomainVariant};
use crate::symbols::{FunctionSymbol, ScopeStack, Symbol};
use crate::tables::SymbolLocations;
use crate::ty::{Effect, EffectSet};
use crate::util::{node_span, token_span};

/// Collect all top-level declarations into the global scope.
pub fn run(
    file: &SourceFile,
    ctx: &mut Context,
    scopes: &mut ScopeStack,
    domains: &mut DomainTable,
    locs: &mut SymbolLocations,
    diags: &mut Diagnostics,
) {
    for decl in file.decls() {
        match decl {
            Item::FnDecl(f) => declare_fn(&f, ctx, scopes, locs, diags),

            Item::TypeDecl(t) => {
                let Some(name) = t.name() else { continue };
                let span = node_span(name.syntax());
                let type_params: Vec<String> = t
                    .type_params()
                    .iter()
                    .map(|tok| tok.text().to_string())
                    .collect();
                let symbol = Symbol::TypeDef {
                    type_params,
                    underlying: ctx.prims.unit,
                };
                declare_global(scopes, locs, diags, &name.text(), symbol, span);
            }

            Item::ErrorDecl(e) => {
                let Some(name) = e.name() else { continue };
                let span = node_span(name.syntax());
                let symbol = Symbol::ErrorType {
                    ty: ctx.prims.unit,
                };
                declare_global(scopes, locs, diags, &name.text(), symbol, span);
            }

            Item::DomainDecl(d) => {
                let Some(name) = d.name() else { continue };
                let span = node_span(name.syntax());
                let domain_name = name.text();

                if declare_global(scopes, locs, diags, &domain_name, Symbol::Domain, span) {
                    let variants: Vec<DomainVariant> = d
                        .variants()
                        .filter_map(|v| {
                            let vname = v.name()?;
                            Some(DomainVariant {
                                name: vname.text(),
                                // Field types resolve in pass 2.
                                fields: Vec::new(),
                                span: node_span(vname.syntax()),
                            })
                        })
                        .collect();
                    domains.insert(DomainInfo {
                        name: domain_name,
                        variants,
                        span,
                    });
                }
            }

            Item::ConstDecl(c) => {
                let Some(name) = c.name() else { continue };
                let span = node_span(name.syntax());
                let symbol = Symbol::Constant {
                    ty: ctx.prims.unit,
                    depth: 0,
                };
                declare_global(scopes, locs, diags, &name.text(), symbol, span);
            }

            // `use error E;` re-exports an error type; it declares
            // nothing and is validated by the error checker.
            Item::UseErrorDecl(_) => {}
        }
    }
}

/// Insert a global symbol, diagnosing duplicates. Returns whether the
/// symbol was inserted.
fn declare_global(
    scopes: &mut ScopeStack,
    locs: &mut SymbolLocations,
    diags: &mut Diagnostics,
    name: &str,
    symbol: Symbol,
    span: Span,
) -> bool {
    if scopes.lookup_local(name).is_some() {
        diags.error(format!("duplicate declaration of '{name}'"), span);
        return false;
    }
    scopes.insert(name, symbol);
    locs.add_definition(name, span);
    true
}

/// Reserve a function's name with placeholder parameter/return types and
/// validated effect names.
fn declare_fn(
    f: &FnDecl,
    ctx: &mut Context,
    scopes: &mut ScopeStack,
    locs: &mut SymbolLocations,
    diags: &mut Diagnostics,
) {
    let Some(name) = f.name() else { return };
    let span = node_span(name.syntax());

    let mut effects = EffectSet::empty();
    let has_effects_clause = f.effects_clause().is_some();
    if let Some(clause) = f.effects_clause() {
        for token in clause.effect_tokens() {
            match Effect::from_name(token.text()) {
                Some(effect) => effects.insert(effect),
                None => {
                    let known: Vec<&str> = Effect::ALL.iter().map(|e| e.name()).collect();
                    diags.push(
                        Diagnostic::error(
                            format!("unknown effect '{}'", token.text()),
                            token_span(&token),
                        )
                        .with_hint(format!("known effects: {}", known.join(", "))),
                    );
                }
            }
        }
    }

    let mut param_names = Vec::new();
    let mut param_tys = Vec::new();
    let mut param_caps = Vec::new();
    let mut param_inouts = Vec::new();
    for param in f.params() {
        let pname = param.name().map(|n| n.text()).unwrap_or_default();
        param_names.push(pname);
        // Placeholder; the resolver fills real types in pass 2.
        param_tys.push(ctx.prims.unit);
        param_caps.push(param.is_cap());
        param_inouts.push(param.is_inout());
    }

    let symbol = Symbol::Function(FunctionSymbol {
        name: name.text(),
        type_params: f
            .type_params()
            .iter()
            .map(|tok| tok.text().to_string())
            .collect(),
        param_names,
        param_tys,
        param_caps,
        param_inouts,
        ret: ctx.prims.unit,
        effects,
        has_effects_clause,
        error_domain: f
            .error_clause()
            .and_then(|c| c.domain_token())
            .map(|t| t.text().to_string()),
        span,
    });

    declare_global(scopes, locs, diags, &name.text(), symbol, span);
}
