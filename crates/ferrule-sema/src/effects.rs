//! Pass 4: the effect checker.
//!
//! For every function body this pass collects the set of effects the
//! body exercises, directly and transitively through calls, and verifies
//! it is a subset of the function's declared `effects [...]` list. A
//! fixed subset of effects (`fs`, `net`, `io`, `time`, `rng`, `ffi`)
//! additionally requires that the function receive a capability
//! parameter of the matching token type; `alloc`, `cpu`, `atomics`, and
//! `simd` have no capability pairing.
//!
//! A function without an `effects` clause opts out of enforcement; an
//! explicit clause, even an empty one, constrains the body. Unknown
//! effect names were already rejected by the declaration pass.

use ferrule_common::diagnostics::{Diagnostic, Diagnostics};

use ferrule_parser::ast::expr::{CallExpr, Expr};
use ferrule_parser::ast::item::{Item, SourceFile};
use ferrule_parser::ast::AstNode;
use ferrule_parser::SyntaxKind;

use crate::context::Context;
use crate::symbols::{ScopeStack, Symbol};
use crate::ty::Ty;
use crate::util::node_span;

/// Check every function's effect discipline.
pub fn run(
    file: &SourceFile,
    ctx: &Context,
    scopes: &ScopeStack,
    diags: &mut Diagnostics,
) {
    for decl in file.decls() {
        let Item::FnDecl(f) = decl else { continue };
        let Some(name) = f.name() else { continue };
        let Some(Symbol::Function(sym)) = scopes.lookup_global(&name.text()) else {
            continue;
        };
        let declared = sym.effects;
        let fn_name = sym.name.clone();

        // A function without an `effects` clause is unconstrained; only
        // an explicit clause (even an empty one) is enforced.
        if !sym.has_effects_clause {
            continue;
        }

        // Declared effects with a capability pairing require a matching
        // capability parameter.
        for effect in declared.iter() {
            let Some(required) = effect.required_capability() else {
                continue;
            };
            let supplied = sym.param_tys.iter().any(|ty| {
                matches!(ctx.ty(*ty), Ty::Capability(kind) if *kind == required)
            });
            if !supplied {
                let anchor = f
                    .effects_clause()
                    .map(|c| node_span(c.syntax()))
                    .unwrap_or_else(|| node_span(name.syntax()));
                diags.push(
                    Diagnostic::error(
                        format!(
                            "effect '{}' requires a capability parameter of type {}",
                            effect.name(),
                            required.name()
                        ),
                        anchor,
                    )
                    .with_hint(format!(
                        "add a parameter like `cap {}: {}`",
                        effect.name(),
                        required.name()
                    )),
                );
            }
        }

        // Transitive effect collection: every call site contributes the
        // callee's declared set. Region creation contributes `alloc`
        // through the `createRegion` builtin's own effect set.
        let Some(body) = f.body() else { continue };
        for node in body.syntax().descendants() {
            if node.kind() != SyntaxKind::CALL_EXPR {
                continue;
            }
            let Some(call) = CallExpr::cast(node) else { continue };
            let Some(Expr::NameRef(callee)) = call.callee() else {
                continue;
            };
            let callee_name = callee.text();
            let Some(Symbol::Function(callee_sym)) = scopes.lookup_global(&callee_name)
            else {
                continue;
            };

            if !callee_sym.effects.is_subset(declared) {
                let missing: Vec<&str> = callee_sym
                    .effects
                    .iter()
                    .filter(|e| !declared.contains(*e))
                    .map(|e| e.name())
                    .collect();
                let missing = format!("[{}]", missing.join(", "));
                diags.push(
                    Diagnostic::error(
                        format!(
                            "call to '{callee_name}' uses effect(s) {missing} not declared by '{fn_name}'"
                        ),
                        node_span(call.syntax()),
                    )
                    .with_hint(format!(
                        "declare them: `effects {}`",
                        declared
                            .union(callee_sym.effects)
                            .display()
                    )),
                );
            }
        }
    }
}
