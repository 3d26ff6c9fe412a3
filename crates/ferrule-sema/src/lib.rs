//! Ferrule semantic analyzer: multi-pass analysis over the parsed CST.
//!
//! The passes run strictly in order, each assuming the invariants the
//! previous ones established:
//!
//! 1. [`declare`] collects top-level symbols into the global scope.
//! 2. [`resolve`] turns AST type expressions into interned resolved
//!    types and fills the signatures pass 1 reserved.
//! 3. [`check`] walks every body, typing each expression and populating
//!    the hover and symbol-location tables.
//! 4. [`effects`] verifies effect subsets and capability parameters.
//! 5. [`domains`] validates error-domain coherence at `ok`/`err`/
//!    `check`/`ensure`/`map_error` sites.
//! 6. [`regions`] tracks region creation, disposal, and escapes.
//! 7. [`exhaustiveness`] proves match coverage.
//!
//! The parser is fail-fast, so a syntax error ends analysis before pass
//! 1; an error in pass 1 skips passes 2-7, which depend on a consistent
//! declaration set. All later passes accumulate diagnostics and continue
//! past individual failures. Analysis is deterministic and keeps no
//! state across invocations.

pub mod check;
pub mod context;
pub mod declare;
pub mod domains;
pub mod effects;
pub mod exhaustiveness;
pub mod regions;
pub mod resolve;
pub mod symbols;
pub mod tables;
pub mod ty;
mod util;

use ferrule_common::diagnostics::Diagnostics;
use ferrule_common::span::LineIndex;
use rowan::TextRange;
use rustc_hash::FxHashMap;

use crate::context::Context;
use crate::domains::DomainTable;
use crate::symbols::ScopeStack;
use crate::tables::{HoverTable, SymbolLocations};
use crate::ty::TyId;

/// Everything one analysis run produces.
///
/// The compilation context rides along because every [`TyId`] in the
/// tables is a handle into its interning pool; the handles stay valid
/// until the `Analysis` (and the context it owns) is dropped.
pub struct Analysis {
    pub file_name: String,
    pub context: Context,
    pub diagnostics: Diagnostics,
    /// Expression types keyed by source range.
    pub types: FxHashMap<TextRange, TyId>,
    pub hover: HoverTable,
    pub locations: SymbolLocations,
}

impl Analysis {
    /// Whether any pass reported an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Render all diagnostics against the given source buffer.
    pub fn render_diagnostics(&self, source: &str) -> String {
        self.diagnostics.render_all(source, &self.file_name)
    }
}

/// Analyze one source buffer.
///
/// Parses the source and, when the parse succeeds, runs the full pass
/// pipeline. On a parse failure the single parse error is converted into
/// a diagnostic and analysis stops there.
pub fn analyze(source: &str, file_name: &str) -> Analysis {
    let mut ctx = Context::new();
    let mut diags = Diagnostics::new();
    let line_index = LineIndex::new(source);

    let parse = ferrule_parser::parse(source);
    if !parse.ok() {
        for error in parse.errors() {
            let mut diag =
                ferrule_common::diagnostics::Diagnostic::error(error.message.clone(), error.span);
            if let Some((message, span)) = &error.related {
                diag = diag.with_hint(format!(
                    "{} (at offset {})",
                    message, span.start
                ));
            }
            diags.push(diag);
        }
        return Analysis {
            file_name: file_name.to_string(),
            context: ctx,
            diagnostics: diags,
            types: FxHashMap::default(),
            hover: HoverTable::new(),
            locations: SymbolLocations::new(),
        };
    }

    let file = parse.source_file();
    let mut scopes = ScopeStack::new(&mut ctx);
    let mut domain_table = DomainTable::new();
    let mut hover = HoverTable::new();
    let mut locations = SymbolLocations::new();

    // Pass 1: declaration collection.
    declare::run(
        &file,
        &mut ctx,
        &mut scopes,
        &mut domain_table,
        &mut locations,
        &mut diags,
    );

    // Later passes require a consistent declaration set.
    if diags.has_errors() {
        return Analysis {
            file_name: file_name.to_string(),
            context: ctx,
            diagnostics: diags,
            types: FxHashMap::default(),
            hover,
            locations,
        };
    }

    // Pass 2: type resolution.
    resolve::run(&file, &mut ctx, &mut scopes, &mut domain_table, &mut diags);

    // Pass 3: type checking (fills the hover/location tables).
    let types = check::run(
        &file,
        &mut ctx,
        &mut scopes,
        &domain_table,
        &line_index,
        &mut diags,
        &mut hover,
        &mut locations,
    );

    // Pass 4: effects and capabilities.
    effects::run(&file, &ctx, &scopes, &mut diags);

    // Pass 5: error-domain coherence.
    domains::run(&file, &ctx, &scopes, &domain_table, &types, &mut diags);

    // Pass 6: region discipline.
    regions::run(&file, &mut diags);

    // Pass 7: match exhaustiveness.
    exhaustiveness::run(&file, &ctx, &types, &mut diags);

    Analysis {
        file_name: file_name.to_string(),
        context: ctx,
        diagnostics: diags,
        types,
        hover,
        locations,
    }
}
