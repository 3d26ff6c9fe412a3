//! Pass 6: the region checker.
//!
//! Tracks region-typed bindings through each function body. A region is
//! created by `var r: Region = createRegion(...)` and disposed by a
//! `defer r.dispose();` (a direct `r.dispose();` call also counts). On
//! exit from the scope that created it, an active undisposed region is a
//! warning. Returning or assigning a region out of its creating scope is
//! an escape error, which supersedes the undisposed warning for that
//! region. Loop and branch bodies are analyzed as nested scopes.

use ferrule_common::diagnostics::{Diagnostic, Diagnostics};
use ferrule_common::span::Span;

use ferrule_parser::ast::expr::Expr;
use ferrule_parser::ast::item::{Block, Item, SourceFile, Stmt, VarDecl};
use ferrule_parser::ast::AstNode;

use crate::util::node_span;

#[derive(Debug)]
struct RegionEntry {
    name: String,
    span: Span,
    disposed: bool,
    escaped: bool,
}

struct RegionCheck<'a> {
    frames: Vec<Vec<RegionEntry>>,
    diags: &'a mut Diagnostics,
}

/// Check region discipline in every function body.
pub fn run(file: &SourceFile, diags: &mut Diagnostics) {
    for decl in file.decls() {
        let Item::FnDecl(f) = decl else { continue };
        let Some(body) = f.body() else { continue };

        let mut pass = RegionCheck {
            frames: Vec::new(),
            diags,
        };
        pass.check_block(&body);
    }
}

impl RegionCheck<'_> {
    fn check_block(&mut self, block: &Block) {
        self.frames.push(Vec::new());
        for stmt in block.statements() {
            self.check_stmt(&stmt);
        }
        self.exit_frame();
    }

    /// Pop the current frame, warning about regions that are still
    /// active and neither disposed nor already reported as escaping.
    fn exit_frame(&mut self) {
        let frame = self.frames.pop().expect("region frames are balanced");
        for entry in frame {
            if !entry.disposed && !entry.escaped {
                self.diags.push(
                    Diagnostic::warning(
                        format!("region '{}' is not disposed before leaving its scope", entry.name),
                        entry.span,
                    )
                    .with_hint(format!("add `defer {}.dispose();` after creating it", entry.name)),
                );
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(v) => {
                if let Some(name) = region_binding(v) {
                    let span = v
                        .name()
                        .map(|n| node_span(n.syntax()))
                        .unwrap_or_else(|| node_span(v.syntax()));
                    self.frames
                        .last_mut()
                        .expect("inside a function body")
                        .push(RegionEntry {
                            name,
                            span,
                            disposed: false,
                            escaped: false,
                        });
                }
            }

            Stmt::Defer(d) => {
                if let Some(name) = d.expr().as_ref().and_then(dispose_target) {
                    self.mark_disposed(&name);
                }
            }

            Stmt::Expr(e) => {
                // A direct `r.dispose();` also discharges the region.
                if let Some(name) = e.expr().as_ref().and_then(dispose_target) {
                    self.mark_disposed(&name);
                }
            }

            Stmt::Return(r) => {
                if let Some(Expr::NameRef(name)) = r.value() {
                    let name_text = name.text();
                    let escaped = match self.find_region(&name_text) {
                        Some(entry) => {
                            entry.escaped = true;
                            true
                        }
                        None => false,
                    };
                    if escaped {
                        self.diags.error(
                            "region escapes its creating scope",
                            node_span(name.syntax()),
                        );
                    }
                }
            }

            Stmt::Assign(a) => {
                // Assigning a region to a binding from an enclosing
                // scope moves it out of its creating scope.
                if let Some(Expr::NameRef(value)) = a.value() {
                    let value_name = value.text();
                    let value_depth = self.region_depth(&value_name);
                    if let Some(value_depth) = value_depth {
                        let target_depth = a
                            .target()
                            .and_then(|t| match t {
                                Expr::NameRef(n) => self.region_depth(&n.text()),
                                _ => None,
                            });
                        if matches!(target_depth, Some(td) if td < value_depth) {
                            if let Some(entry) = self.find_region(&value_name) {
                                entry.escaped = true;
                            }
                            let span = node_span(value.syntax());
                            self.diags
                                .error("region escapes its creating scope", span);
                        }
                    }
                }
            }

            Stmt::If(i) => {
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
                if let Some(body) = w.body() {
                    self.check_block(&body);
                }
            }

            Stmt::For(f) => {
                if let Some(body) = f.body() {
                    self.check_block(&body);
                }
            }

            Stmt::ConstDecl(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    /// Find an active region by name, innermost frame first.
    fn find_region(&mut self, name: &str) -> Option<&mut RegionEntry> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.iter_mut().find(|e| e.name == name))
    }

    /// The frame depth a region was created at.
    fn region_depth(&self, name: &str) -> Option<usize> {
        for (depth, frame) in self.frames.iter().enumerate().rev() {
            if frame.iter().any(|e| e.name == name) {
                return Some(depth);
            }
        }
        None
    }

    fn mark_disposed(&mut self, name: &str) {
        if let Some(entry) = self.find_region(name) {
            entry.disposed = true;
        }
    }
}

/// Whether a var declaration binds a region: either annotated `: Region`
/// or initialized from `createRegion(...)`.
fn region_binding(v: &VarDecl) -> Option<String> {
    let name = v.name()?.text();

    let annotated = matches!(
        v.ty(),
        Some(ferrule_parser::ast::ty::Type::Simple(s)) if s.text() == "Region"
    );
    let created = matches!(
        v.value(),
        Some(Expr::Call(call)) if matches!(
            call.callee(),
            Some(Expr::NameRef(n)) if n.text() == "createRegion"
        )
    );

    (annotated || created).then_some(name)
}

/// The receiver name of an `r.dispose()` call, if the expression is one.
fn dispose_target(expr: &Expr) -> Option<String> {
    let Expr::Call(call) = expr else { return None };
    let Some(Expr::FieldAccess(access)) = call.callee() else {
        return None;
    };
    if access.field_token()?.text() != "dispose" {
        return None;
    }
    match access.base()? {
        Expr::NameRef(name) => Some(name.text()),
        _ => None,
    }
}
