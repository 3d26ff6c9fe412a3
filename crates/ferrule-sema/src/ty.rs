//! Resolved type representation for the Ferrule type system.
//!
//! Resolved types are the semantic, post-resolution form, distinct from
//! the parser's syntactic type expressions. Every resolved type lives in
//! the compilation context's interning pool and is addressed by a
//! [`TyId`] handle; structural equality therefore reduces to handle
//! equality.

use crate::context::StrId;

/// Handle to an interned resolved type.
///
/// `TyId` equality is structural-fingerprint equality: the interner
/// guarantees one canonical instance per structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TyId(pub u32);

/// Fixed-width integer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl IntWidth {
    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
            IntWidth::Usize => "usize",
        }
    }

    pub fn from_name(name: &str) -> Option<IntWidth> {
        match name {
            "i8" => Some(IntWidth::I8),
            "i16" => Some(IntWidth::I16),
            "i32" => Some(IntWidth::I32),
            "i64" => Some(IntWidth::I64),
            "u8" => Some(IntWidth::U8),
            "u16" => Some(IntWidth::U16),
            "u32" => Some(IntWidth::U32),
            "u64" => Some(IntWidth::U64),
            "usize" => Some(IntWidth::Usize),
            _ => None,
        }
    }
}

/// Floating-point kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn name(self) -> &'static str {
        match self {
            FloatWidth::F32 => "f32",
            FloatWidth::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<FloatWidth> {
        match name {
            "f32" => Some(FloatWidth::F32),
            "f64" => Some(FloatWidth::F64),
            _ => None,
        }
    }
}

/// Capability tokens: runtime values granting the authority to perform a
/// particular effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapKind {
    Fs,
    Net,
    Io,
    Time,
    Rng,
    Alloc,
    Cpu,
    Atomics,
    Simd,
    Ffi,
}

impl CapKind {
    pub fn name(self) -> &'static str {
        match self {
            CapKind::Fs => "Fs",
            CapKind::Net => "Net",
            CapKind::Io => "Io",
            CapKind::Time => "Time",
            CapKind::Rng => "Rng",
            CapKind::Alloc => "Alloc",
            CapKind::Cpu => "Cpu",
            CapKind::Atomics => "Atomics",
            CapKind::Simd => "Simd",
            CapKind::Ffi => "Ffi",
        }
    }

    pub fn from_name(name: &str) -> Option<CapKind> {
        match name {
            "Fs" => Some(CapKind::Fs),
            "Net" => Some(CapKind::Net),
            "Io" => Some(CapKind::Io),
            "Time" => Some(CapKind::Time),
            "Rng" => Some(CapKind::Rng),
            "Alloc" => Some(CapKind::Alloc),
            "Cpu" => Some(CapKind::Cpu),
            "Atomics" => Some(CapKind::Atomics),
            "Simd" => Some(CapKind::Simd),
            "Ffi" => Some(CapKind::Ffi),
            _ => None,
        }
    }
}

// ── Effects ────────────────────────────────────────────────────────────

/// A declared effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Fs,
    Net,
    Io,
    Time,
    Rng,
    Alloc,
    Cpu,
    Atomics,
    Simd,
    Ffi,
}

impl Effect {
    pub const ALL: [Effect; 10] = [
        Effect::Fs,
        Effect::Net,
        Effect::Io,
        Effect::Time,
        Effect::Rng,
        Effect::Alloc,
        Effect::Cpu,
        Effect::Atomics,
        Effect::Simd,
        Effect::Ffi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Effect::Fs => "fs",
            Effect::Net => "net",
            Effect::Io => "io",
            Effect::Time => "time",
            Effect::Rng => "rng",
            Effect::Alloc => "alloc",
            Effect::Cpu => "cpu",
            Effect::Atomics => "atomics",
            Effect::Simd => "simd",
            Effect::Ffi => "ffi",
        }
    }

    pub fn from_name(name: &str) -> Option<Effect> {
        match name {
            "fs" => Some(Effect::Fs),
            "net" => Some(Effect::Net),
            "io" => Some(Effect::Io),
            "time" => Some(Effect::Time),
            "rng" => Some(Effect::Rng),
            "alloc" => Some(Effect::Alloc),
            "cpu" => Some(Effect::Cpu),
            "atomics" => Some(Effect::Atomics),
            "simd" => Some(Effect::Simd),
            "ffi" => Some(Effect::Ffi),
            _ => None,
        }
    }

    /// The capability token required to exercise this effect, if any.
    /// `alloc`, `cpu`, `atomics`, and `simd` have no capability pairing.
    pub fn required_capability(self) -> Option<CapKind> {
        match self {
            Effect::Fs => Some(CapKind::Fs),
            Effect::Net => Some(CapKind::Net),
            Effect::Io => Some(CapKind::Io),
            Effect::Time => Some(CapKind::Time),
            Effect::Rng => Some(CapKind::Rng),
            Effect::Ffi => Some(CapKind::Ffi),
            Effect::Alloc | Effect::Cpu | Effect::Atomics | Effect::Simd => None,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A set of effects, packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EffectSet(u16);

impl EffectSet {
    pub fn empty() -> EffectSet {
        EffectSet(0)
    }

    pub fn insert(&mut self, effect: Effect) {
        self.0 |= effect.bit();
    }

    pub fn contains(self, effect: Effect) -> bool {
        self.0 & effect.bit() != 0
    }

    pub fn union(self, other: EffectSet) -> EffectSet {
        EffectSet(self.0 | other.0)
    }

    pub fn is_subset(self, other: EffectSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Effect> {
        Effect::ALL.into_iter().filter(move |e| self.contains(*e))
    }

    /// Render as `[a, b]` for diagnostics.
    pub fn display(self) -> String {
        let names: Vec<&str> = self.iter().map(Effect::name).collect();
        format!("[{}]", names.join(", "))
    }
}

// ── Resolved types ─────────────────────────────────────────────────────

/// A function signature as a resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnTy {
    pub params: Vec<TyId>,
    pub ret: TyId,
    pub effects: EffectSet,
    pub error_domain: Option<StrId>,
    pub type_params: Vec<StrId>,
}

/// A resolved Ferrule type.
///
/// Sub-types are referenced by handle so the enum stays small and
/// hashable; names are interned strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Fixed-width integer scalar.
    Int(IntWidth),
    /// Floating-point scalar.
    Float(FloatWidth),
    Bool,
    Char,
    Str,
    Bytes,
    Unit,
    /// A capability token type.
    Capability(CapKind),
    /// Fixed-length array.
    Array { elem: TyId, len: u64 },
    /// SIMD-style vector.
    Vector { elem: TyId, len: u64 },
    /// Borrowed view over a contiguous element sequence.
    View { elem: TyId, mutable: bool },
    /// `T?`
    Nullable(TyId),
    /// `a .. b` iteration ranges.
    Range(TyId),
    /// `Result<ok, domain>` produced by error-domain functions.
    Result { ok: TyId, domain: StrId },
    /// Function type.
    Fn(FnTy),
    /// A user-declared named type and its underlying structure.
    Named { name: StrId, underlying: TyId },
    /// Structural record.
    Record { fields: Vec<(StrId, TyId)> },
    /// Nominal union of variants, each with optional typed fields.
    Union { variants: Vec<(StrId, Vec<(StrId, TyId)>)> },
    /// Reference to a generic type parameter.
    TypeParam(StrId),
    /// An allocation region value.
    Region,
    /// Pseudo-type of an unannotated integer literal; unifies with any
    /// numeric type at use sites.
    IntLit,
    /// Pseudo-type of an unannotated float literal.
    FloatLit,
    /// Placeholder produced when resolution or checking failed; checking
    /// continues and suppresses cascading diagnostics against it.
    Error,
}

impl Ty {
    /// Whether the type is an integer scalar (or an integer literal).
    pub fn is_integer(&self) -> bool {
        matches!(self, Ty::Int(_) | Ty::IntLit)
    }

    /// Whether the type is any numeric scalar or numeric literal.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int(_) | Ty::Float(_) | Ty::IntLit | Ty::FloatLit)
    }

    /// Whether the type is a literal pseudo-type awaiting unification.
    pub fn is_literal(&self) -> bool {
        matches!(self, Ty::IntLit | Ty::FloatLit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_set_subset() {
        let mut d = EffectSet::empty();
        d.insert(Effect::Fs);
        d.insert(Effect::Io);

        let mut e = EffectSet::empty();
        e.insert(Effect::Io);

        assert!(e.is_subset(d));
        assert!(!d.is_subset(e));
        assert!(EffectSet::empty().is_subset(e));
    }

    #[test]
    fn effect_set_union_and_iter() {
        let mut a = EffectSet::empty();
        a.insert(Effect::Alloc);
        let mut b = EffectSet::empty();
        b.insert(Effect::Net);

        let u = a.union(b);
        let names: Vec<&str> = u.iter().map(Effect::name).collect();
        assert_eq!(names, vec!["net", "alloc"]);
        assert_eq!(u.display(), "[net, alloc]");
    }

    #[test]
    fn capability_pairing_matches_fixed_table() {
        assert_eq!(Effect::Fs.required_capability(), Some(CapKind::Fs));
        assert_eq!(Effect::Net.required_capability(), Some(CapKind::Net));
        assert_eq!(Effect::Io.required_capability(), Some(CapKind::Io));
        assert_eq!(Effect::Time.required_capability(), Some(CapKind::Time));
        assert_eq!(Effect::Rng.required_capability(), Some(CapKind::Rng));
        assert_eq!(Effect::Ffi.required_capability(), Some(CapKind::Ffi));
        assert_eq!(Effect::Alloc.required_capability(), None);
        assert_eq!(Effect::Cpu.required_capability(), None);
        assert_eq!(Effect::Atomics.required_capability(), None);
        assert_eq!(Effect::Simd.required_capability(), None);
    }

    #[test]
    fn effect_names_round_trip() {
        for effect in Effect::ALL {
            assert_eq!(Effect::from_name(effect.name()), Some(effect));
        }
        assert_eq!(Effect::from_name("gpu"), None);
    }

    #[test]
    fn capability_names_round_trip() {
        for kind in [
            CapKind::Fs,
            CapKind::Net,
            CapKind::Io,
            CapKind::Time,
            CapKind::Rng,
            CapKind::Alloc,
            CapKind::Cpu,
            CapKind::Atomics,
            CapKind::Simd,
            CapKind::Ffi,
        ] {
            assert_eq!(CapKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CapKind::from_name("Gpu"), None);
        assert_eq!(CapKind::from_name("fs"), None); // case-sensitive
    }

    #[test]
    fn int_width_names_round_trip() {
        for w in [
            IntWidth::I8,
            IntWidth::I16,
            IntWidth::I32,
            IntWidth::I64,
            IntWidth::U8,
            IntWidth::U16,
            IntWidth::U32,
            IntWidth::U64,
            IntWidth::Usize,
        ] {
            assert_eq!(IntWidth::from_name(w.name()), Some(w));
        }
    }
}
