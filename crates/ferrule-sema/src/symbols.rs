//! Named entities and lexical scopes.
//!
//! A [`Symbol`] describes one named entity; scopes are a stack of name
//! maps (the global frame at the bottom) with lookup walking outward.
//! Duplicate insertion in the same frame is rejected; the caller turns
//! that into a diagnostic. The global frame is seeded with the builtin
//! functions at construction time.

use ferrule_common::span::Span;
use rustc_hash::FxHashMap;

use crate::context::Context;
use crate::ty::{Effect, EffectSet, TyId};

/// A function's resolved signature and metadata.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub type_params: Vec<String>,
    pub param_names: Vec<String>,
    pub param_tys: Vec<TyId>,
    /// Per-parameter `cap` qualifier.
    pub param_caps: Vec<bool>,
    /// Per-parameter `inout` qualifier.
    pub param_inouts: Vec<bool>,
    pub ret: TyId,
    pub effects: EffectSet,
    /// Whether the declaration carries an `effects [...]` clause. A
    /// function without one is effect-unconstrained; an explicit clause
    /// (even an empty one) is enforced.
    pub has_effects_clause: bool,
    pub error_domain: Option<String>,
    /// Definition span of the function name.
    pub span: Span,
}

/// A named entity in some scope.
#[derive(Debug, Clone)]
pub enum Symbol {
    Function(FunctionSymbol),
    Variable {
        ty: TyId,
        mutable: bool,
        /// Scope depth at declaration (0 is global).
        depth: usize,
    },
    Constant {
        ty: TyId,
        depth: usize,
    },
    Parameter {
        ty: TyId,
        inout: bool,
        capability: bool,
    },
    TypeDef {
        type_params: Vec<String>,
        underlying: TyId,
    },
    Domain,
    ErrorType {
        ty: TyId,
    },
}

impl Symbol {
    /// The symbol's value type, where it has one.
    pub fn value_ty(&self) -> Option<TyId> {
        match self {
            Symbol::Variable { ty, .. }
            | Symbol::Constant { ty, .. }
            | Symbol::Parameter { ty, .. }
            | Symbol::ErrorType { ty } => Some(*ty),
            Symbol::Function(_) | Symbol::TypeDef { .. } | Symbol::Domain => None,
        }
    }

    /// One-word description for hover output and diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Function(_) => "function",
            Symbol::Variable { .. } => "variable",
            Symbol::Constant { .. } => "constant",
            Symbol::Parameter { .. } => "parameter",
            Symbol::TypeDef { .. } => "type",
            Symbol::Domain => "domain",
            Symbol::ErrorType { .. } => "error",
        }
    }
}

/// A stack of lexical scopes. Index 0 is the global scope.
pub struct ScopeStack {
    scopes: Vec<FxHashMap<String, Symbol>>,
}

impl ScopeStack {
    /// Create a scope stack with a global frame seeded with the builtins.
    pub fn new(ctx: &mut Context) -> ScopeStack {
        let mut stack = ScopeStack {
            scopes: vec![FxHashMap::default()],
        };
        stack.install_builtins(ctx);
        stack
    }

    /// Push a new empty scope.
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if only the global scope remains.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Current nesting depth (0 when only the global scope exists).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Insert into the innermost scope. Returns `false` (without
    /// inserting) when the name already exists in that frame.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> bool {
        let name = name.into();
        let frame = self.scopes.last_mut().expect("scope stack never empty");
        if frame.contains_key(&name) {
            return false;
        }
        frame.insert(name, symbol);
        true
    }

    /// Insert or overwrite in the innermost scope. Used by the signature
    /// resolver to replace pass-1 placeholders.
    pub fn replace(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.scopes
            .last_mut()
            .expect("scope stack never empty")
            .insert(name.into(), symbol);
    }

    /// Look up a name, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Look up a name in the innermost scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|frame| frame.get(name))
    }

    /// Look up a name in the global scope only.
    pub fn lookup_global(&self, name: &str) -> Option<&Symbol> {
        self.scopes.first().and_then(|frame| frame.get(name))
    }

    /// Names of every global function symbol (used by the effect pass).
    pub fn global_functions(&self) -> impl Iterator<Item = (&String, &FunctionSymbol)> {
        self.scopes[0].iter().filter_map(|(name, sym)| match sym {
            Symbol::Function(f) => Some((name, f)),
            _ => None,
        })
    }

    /// Every global symbol (used to resolve variant constructors to the
    /// union type that declares them).
    pub fn globals(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.scopes[0].iter()
    }

    /// Install the builtin functions into the global scope.
    ///
    /// The print family and `read_char` carry effect `io`;
    /// `createRegion` carries effect `alloc`.
    fn install_builtins(&mut self, ctx: &mut Context) {
        let string = ctx.prims.string;
        let i64 = ctx.prims.i64;
        let unit = ctx.prims.unit;
        let char_ = ctx.prims.char_;
        let region = ctx.prims.region;

        let mut io = EffectSet::empty();
        io.insert(Effect::Io);
        let mut alloc = EffectSet::empty();
        alloc.insert(Effect::Alloc);

        let builtins: [(&str, Vec<TyId>, TyId, EffectSet); 7] = [
            ("print", vec![string], unit, io),
            ("println", vec![string], unit, io),
            ("print_int", vec![i64], unit, io),
            ("debug", vec![string], unit, io),
            ("debug_int", vec![i64], unit, io),
            ("read_char", vec![], char_, io),
            ("createRegion", vec![], region, alloc),
        ];

        for (name, param_tys, ret, effects) in builtins {
            let param_names: Vec<String> =
                (0..param_tys.len()).map(|i| format!("arg{i}")).collect();
            let caps = vec![false; param_tys.len()];
            let inouts = vec![false; param_tys.len()];
            self.insert(
                name,
                Symbol::Function(FunctionSymbol {
                    name: name.to_string(),
                    type_params: Vec::new(),
                    param_names,
                    param_tys,
                    param_caps: caps,
                    param_inouts: inouts,
                    ret,
                    effects,
                    has_effects_clause: true,
                    error_domain: None,
                    span: Span::new(0, 0),
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> (Context, ScopeStack) {
        let mut ctx = Context::new();
        let scopes = ScopeStack::new(&mut ctx);
        (ctx, scopes)
    }

    #[test]
    fn builtins_are_installed() {
        let (_ctx, scopes) = stack();
        for name in ["print", "println", "print_int", "debug", "debug_int", "read_char", "createRegion"] {
            assert!(
                matches!(scopes.lookup(name), Some(Symbol::Function(_))),
                "builtin {name} missing"
            );
        }
    }

    #[test]
    fn builtin_effects() {
        let (_ctx, scopes) = stack();
        let Some(Symbol::Function(print)) = scopes.lookup("print") else {
            panic!()
        };
        assert!(print.effects.contains(Effect::Io));

        let Some(Symbol::Function(region)) = scopes.lookup("createRegion") else {
            panic!()
        };
        assert!(region.effects.contains(Effect::Alloc));
    }

    #[test]
    fn duplicate_insert_in_same_frame_fails() {
        let (ctx, mut scopes) = stack();
        assert!(scopes.insert(
            "x",
            Symbol::Variable { ty: ctx.prims.i32, mutable: false, depth: 0 }
        ));
        assert!(!scopes.insert(
            "x",
            Symbol::Variable { ty: ctx.prims.i64, mutable: false, depth: 0 }
        ));
    }

    #[test]
    fn shadowing_across_frames() {
        let (ctx, mut scopes) = stack();
        scopes.insert("x", Symbol::Variable { ty: ctx.prims.i32, mutable: false, depth: 0 });
        scopes.push();
        assert!(scopes.insert(
            "x",
            Symbol::Variable { ty: ctx.prims.string, mutable: true, depth: 1 }
        ));

        let Some(Symbol::Variable { ty, .. }) = scopes.lookup("x") else {
            panic!()
        };
        assert_eq!(*ty, ctx.prims.string);

        scopes.pop();
        let Some(Symbol::Variable { ty, .. }) = scopes.lookup("x") else {
            panic!()
        };
        assert_eq!(*ty, ctx.prims.i32);
    }

    #[test]
    fn lookup_local_is_frame_restricted() {
        let (ctx, mut scopes) = stack();
        scopes.insert("x", Symbol::Variable { ty: ctx.prims.i32, mutable: false, depth: 0 });
        scopes.push();
        assert!(scopes.lookup("x").is_some());
        assert!(scopes.lookup_local("x").is_none());
    }

    #[test]
    #[should_panic(expected = "cannot pop the global scope")]
    fn popping_global_scope_panics() {
        let (_ctx, mut scopes) = stack();
        scopes.pop();
    }
}
