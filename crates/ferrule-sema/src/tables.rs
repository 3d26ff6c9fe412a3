//! Hover and symbol-location tables.
//!
//! Both tables are append-only during analysis and queried afterwards by
//! the LSP collaborator. Positions are 1-based (line, column) pairs
//! derived from byte spans through the line index; the narrowest entry
//! wins when several cover one position.

use ferrule_common::span::Span;
use rustc_hash::FxHashMap;

use crate::ty::TyId;

/// What kind of entity a hover entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverKind {
    Function,
    Variable,
    Constant,
    Parameter,
    Type,
    Domain,
    ErrorType,
    Field,
}

impl HoverKind {
    pub fn name(self) -> &'static str {
        match self {
            HoverKind::Function => "function",
            HoverKind::Variable => "variable",
            HoverKind::Constant => "constant",
            HoverKind::Parameter => "parameter",
            HoverKind::Type => "type",
            HoverKind::Domain => "domain",
            HoverKind::ErrorType => "error",
            HoverKind::Field => "field",
        }
    }
}

/// One hover record: a name occurrence with its resolved type.
///
/// Functions carry a `detail` string with parameter names/types, effects,
/// and error domain, so the hover popup can show the full signature.
#[derive(Debug, Clone)]
pub struct HoverEntry {
    pub line: u32,
    pub column: u32,
    pub length: u32,
    pub name: String,
    pub kind: HoverKind,
    pub ty: TyId,
    pub detail: Option<String>,
}

/// All hover records for one analysis run.
#[derive(Debug, Default)]
pub struct HoverTable {
    entries: Vec<HoverEntry>,
}

impl HoverTable {
    pub fn new() -> HoverTable {
        HoverTable::default()
    }

    pub fn add(&mut self, entry: HoverEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HoverEntry> {
        self.entries.iter()
    }

    /// The narrowest entry covering the given 1-based position.
    pub fn find_at(&self, line: u32, column: u32) -> Option<&HoverEntry> {
        self.entries
            .iter()
            .filter(|e| {
                e.line == line && e.column <= column && column < e.column + e.length.max(1)
            })
            .min_by_key(|e| e.length)
    }
}

/// Definition and reference spans for one global symbol.
#[derive(Debug, Clone)]
pub struct SymbolLocation {
    pub definition: Span,
    pub references: Vec<Span>,
}

/// Definition/reference spans for every global symbol.
#[derive(Debug, Default)]
pub struct SymbolLocations {
    symbols: FxHashMap<String, SymbolLocation>,
}

impl SymbolLocations {
    pub fn new() -> SymbolLocations {
        SymbolLocations::default()
    }

    /// Record a symbol's definition span. First write wins; duplicate
    /// declarations are already diagnosed elsewhere.
    pub fn add_definition(&mut self, name: &str, span: Span) {
        self.symbols
            .entry(name.to_string())
            .or_insert_with(|| SymbolLocation {
                definition: span,
                references: Vec::new(),
            });
    }

    /// Record a reference to a known symbol. References to names without
    /// a recorded definition are dropped (locals are not tracked here).
    pub fn add_reference(&mut self, name: &str, span: Span) {
        if let Some(loc) = self.symbols.get_mut(name) {
            loc.references.push(span);
        }
    }

    /// The definition span for a symbol.
    pub fn definition(&self, name: &str) -> Option<Span> {
        self.symbols.get(name).map(|loc| loc.definition)
    }

    /// All reference spans for a symbol.
    pub fn references(&self, name: &str) -> &[Span] {
        self.symbols
            .get(name)
            .map(|loc| loc.references.as_slice())
            .unwrap_or(&[])
    }

    /// The symbol whose definition or one of whose references contains
    /// the given byte offset.
    pub fn find_symbol_at(&self, offset: u32) -> Option<&str> {
        for (name, loc) in &self.symbols {
            if loc.definition.contains(offset)
                || loc.references.iter().any(|span| span.contains(offset))
            {
                return Some(name.as_str());
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
