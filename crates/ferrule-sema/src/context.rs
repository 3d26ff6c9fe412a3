//! Compilation context: interned types and strings for one analysis run.
//!
//! The context is created before the first pass and dropped after the
//! last; all interned data lives exactly that long and is freed in a
//! single teardown. Passes receive the context as an explicit parameter
//! (there is no ambient singleton) and never free individual types or
//! strings.
//!
//! Interning contract: `intern_ty(t)` returns a handle `h` such that two
//! handles are equal iff the structural fingerprints of their types are
//! equal, and `intern_ty` is idempotent.

use rustc_hash::FxHashMap;

use crate::ty::{CapKind, FloatWidth, IntWidth, Ty, TyId};

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(pub u32);

/// Pre-interned handles for the primitive types every pass touches.
///
/// Built once in [`Context::new`] so passes compare against them without
/// re-interning.
#[derive(Debug, Clone, Copy)]
pub struct PrimTys {
    pub unit: TyId,
    pub bool_: TyId,
    pub char_: TyId,
    pub string: TyId,
    pub bytes: TyId,
    pub i8: TyId,
    pub i32: TyId,
    pub i64: TyId,
    pub usize: TyId,
    pub f64: TyId,
    pub region: TyId,
    pub int_lit: TyId,
    pub float_lit: TyId,
    pub error: TyId,
}

/// The compilation context owning all interned types and strings.
pub struct Context {
    ty_pool: Vec<Ty>,
    ty_map: FxHashMap<Ty, TyId>,
    str_pool: Vec<String>,
    str_map: FxHashMap<String, StrId>,
    /// Handles for the primitives, interned at construction.
    pub prims: PrimTys,
}

impl Context {
    pub fn new() -> Context {
        let mut ctx = Context {
            ty_pool: Vec::new(),
            ty_map: FxHashMap::default(),
            str_pool: Vec::new(),
            str_map: FxHashMap::default(),
            // Placeholder; replaced below once the pools exist.
            prims: PrimTys {
                unit: TyId(0),
                bool_: TyId(0),
                char_: TyId(0),
                string: TyId(0),
                bytes: TyId(0),
                i8: TyId(0),
                i32: TyId(0),
                i64: TyId(0),
                usize: TyId(0),
                f64: TyId(0),
                region: TyId(0),
                int_lit: TyId(0),
                float_lit: TyId(0),
                error: TyId(0),
            },
        };

        ctx.prims = PrimTys {
            unit: ctx.intern_ty(Ty::Unit),
            bool_: ctx.intern_ty(Ty::Bool),
            char_: ctx.intern_ty(Ty::Char),
            string: ctx.intern_ty(Ty::Str),
            bytes: ctx.intern_ty(Ty::Bytes),
            i8: ctx.intern_ty(Ty::Int(IntWidth::I8)),
            i32: ctx.intern_ty(Ty::Int(IntWidth::I32)),
            i64: ctx.intern_ty(Ty::Int(IntWidth::I64)),
            usize: ctx.intern_ty(Ty::Int(IntWidth::Usize)),
            f64: ctx.intern_ty(Ty::Float(FloatWidth::F64)),
            region: ctx.intern_ty(Ty::Region),
            int_lit: ctx.intern_ty(Ty::IntLit),
            float_lit: ctx.intern_ty(Ty::FloatLit),
            error: ctx.intern_ty(Ty::Error),
        };
        ctx
    }

    // ── Type interning ─────────────────────────────────────────────────

    /// Intern a type, returning the handle of its canonical instance.
    pub fn intern_ty(&mut self, ty: Ty) -> TyId {
        if let Some(&id) = self.ty_map.get(&ty) {
            return id;
        }
        let id = TyId(self.ty_pool.len() as u32);
        self.ty_pool.push(ty.clone());
        self.ty_map.insert(ty, id);
        id
    }

    /// Borrow the canonical instance for a handle.
    pub fn ty(&self, id: TyId) -> &Ty {
        &self.ty_pool[id.0 as usize]
    }

    /// Number of distinct interned types.
    pub fn ty_count(&self) -> usize {
        self.ty_pool.len()
    }

    // ── String interning ───────────────────────────────────────────────

    /// Intern a string, returning the handle of its canonical instance.
    pub fn intern_str(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.str_map.get(s) {
            return id;
        }
        let id = StrId(self.str_pool.len() as u32);
        self.str_pool.push(s.to_string());
        self.str_map.insert(s.to_string(), id);
        id
    }

    /// Borrow the canonical instance for a handle.
    pub fn str(&self, id: StrId) -> &str {
        &self.str_pool[id.0 as usize]
    }

    // ── Display ────────────────────────────────────────────────────────

    /// Render a type for diagnostics and hover output.
    pub fn display_ty(&self, id: TyId) -> String {
        match self.ty(id) {
            Ty::Int(w) => w.name().to_string(),
            Ty::Float(w) => w.name().to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Char => "char".to_string(),
            Ty::Str => "string".to_string(),
            Ty::Bytes => "bytes".to_string(),
            Ty::Unit => "()".to_string(),
            Ty::Capability(c) => c.name().to_string(),
            Ty::Array { elem, len } => {
                format!("Array<{}, {}>", self.display_ty(*elem), len)
            }
            Ty::Vector { elem, len } => {
                format!("Vector<{}, {}>", self.display_ty(*elem), len)
            }
            Ty::View { elem, mutable } => {
                if *mutable {
                    format!("View<mut {}>", self.display_ty(*elem))
                } else {
                    format!("View<{}>", self.display_ty(*elem))
                }
            }
            Ty::Nullable(inner) => format!("{}?", self.display_ty(*inner)),
            Ty::Range(elem) => format!("Range<{}>", self.display_ty(*elem)),
            Ty::Result { ok, domain } => {
                format!("Result<{}, {}>", self.display_ty(*ok), self.str(*domain))
            }
            Ty::Fn(f) => {
                let params: Vec<String> =
                    f.params.iter().map(|p| self.display_ty(*p)).collect();
                let mut out = format!("function({}) -> {}", params.join(", "), self.display_ty(f.ret));
                if let Some(domain) = f.error_domain {
                    out.push_str(&format!(" error {}", self.str(domain)));
                }
                if !f.effects.is_empty() {
                    out.push_str(&format!(" effects {}", f.effects.display()));
                }
                out
            }
            Ty::Named { name, .. } => self.str(*name).to_string(),
            Ty::Record { fields } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", self.str(*name), self.display_ty(*ty)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Ty::Union { variants } => {
                let parts: Vec<String> = variants
                    .iter()
                    .map(|(name, _)| self.str(*name).to_string())
                    .collect();
                format!("| {}", parts.join(" | "))
            }
            Ty::TypeParam(name) => self.str(*name).to_string(),
            Ty::Region => "Region".to_string(),
            Ty::IntLit => "{integer}".to_string(),
            Ty::FloatLit => "{float}".to_string(),
            Ty::Error => "<error>".to_string(),
        }
    }

    // ── Convenience constructors ───────────────────────────────────────

    pub fn int_ty(&mut self, width: IntWidth) -> TyId {
        self.intern_ty(Ty::Int(width))
    }

    pub fn float_ty(&mut self, width: FloatWidth) -> TyId {
        self.intern_ty(Ty::Float(width))
    }

    pub fn capability_ty(&mut self, kind: CapKind) -> TyId {
        self.intern_ty(Ty::Capability(kind))
    }

    pub fn nullable_ty(&mut self, inner: TyId) -> TyId {
        self.intern_ty(Ty::Nullable(inner))
    }

    pub fn result_ty(&mut self, ok: TyId, domain: &str) -> TyId {
        let domain = self.intern_str(domain);
        self.intern_ty(Ty::Result { ok, domain })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::EffectSet;
    use crate::ty::FnTy;

    #[test]
    fn interning_is_idempotent() {
        let mut ctx = Context::new();
        let a = ctx.intern_ty(Ty::Nullable(ctx.prims.i32));
        let b = ctx.intern_ty(Ty::Nullable(ctx.prims.i32));
        assert_eq!(a, b);
        assert_eq!(ctx.ty(a), &Ty::Nullable(ctx.prims.i32));
    }

    #[test]
    fn structurally_different_types_get_different_handles() {
        let mut ctx = Context::new();
        let a = ctx.intern_ty(Ty::Array { elem: ctx.prims.i32, len: 4 });
        let b = ctx.intern_ty(Ty::Array { elem: ctx.prims.i32, len: 8 });
        let c = ctx.intern_ty(Ty::Array { elem: ctx.prims.i64, len: 4 });
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn nested_structural_equality_reduces_to_handle_equality() {
        let mut ctx = Context::new();
        let view1 = ctx.intern_ty(Ty::View { elem: ctx.prims.i8, mutable: true });
        let view2 = ctx.intern_ty(Ty::View { elem: ctx.prims.i8, mutable: true });
        let arr1 = ctx.intern_ty(Ty::Array { elem: view1, len: 2 });
        let arr2 = ctx.intern_ty(Ty::Array { elem: view2, len: 2 });
        assert_eq!(arr1, arr2);
    }

    #[test]
    fn string_interning_is_idempotent() {
        let mut ctx = Context::new();
        let a = ctx.intern_str("IoError");
        let b = ctx.intern_str("IoError");
        let c = ctx.intern_str("NetError");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ctx.str(a), "IoError");
    }

    #[test]
    fn display_covers_compound_types() {
        let mut ctx = Context::new();
        let view = ctx.intern_ty(Ty::View { elem: ctx.prims.i8, mutable: true });
        assert_eq!(ctx.display_ty(view), "View<mut i8>");

        let nullable = ctx.nullable_ty(ctx.prims.string);
        assert_eq!(ctx.display_ty(nullable), "string?");

        let result = ctx.result_ty(ctx.prims.i32, "IoError");
        assert_eq!(ctx.display_ty(result), "Result<i32, IoError>");

        let f = Ty::Fn(FnTy {
            params: vec![ctx.prims.i32],
            ret: ctx.prims.bool_,
            effects: EffectSet::empty(),
            error_domain: None,
            type_params: Vec::new(),
        });
        let f = ctx.intern_ty(f);
        assert_eq!(ctx.display_ty(f), "function(i32) -> bool");
    }
}
