//! Pass 7: match exhaustiveness, via Maranget's usefulness algorithm.
//!
//! Implements Algorithm U from "Warnings for Pattern Matching" (2007)
//! over an abstract pattern representation, then walks every match
//! expression in the module: union scrutinees must cover every variant,
//! results need both `ok` and `err`, nullables need `Some` and `None`,
//! and infinite types (numbers, strings, chars) need a wildcard or
//! binding arm. Arms made unreachable by earlier arms are also reported.
//!
//! Missing coverage and redundancy are warnings, not errors.

use ferrule_common::diagnostics::{Diagnostic, Diagnostics};
use rowan::TextRange;
use rustc_hash::FxHashMap;

use ferrule_parser::ast::expr::MatchExpr;
use ferrule_parser::ast::pat::Pattern;
use ferrule_parser::ast::AstNode;
use ferrule_parser::SyntaxKind;

use ferrule_parser::ast::item::SourceFile;

use crate::context::Context;
use crate::ty::{Ty, TyId};
use crate::util::node_span;

// ── Abstract patterns ──────────────────────────────────────────────────

/// Abstract pattern for the usefulness algorithm. These are not AST
/// nodes: bindings and wildcards are both `Wildcard`, and constructor
/// arguments that a pattern merely binds are wildcards too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pat {
    /// Matches anything (wildcard or variable binding).
    Wildcard,
    /// Matches one constructor of the scrutinee type.
    Constructor { name: String, args: Vec<Pat> },
    /// Matches one literal value.
    Literal { value: String },
}

/// A row in the pattern matrix (one match arm's patterns).
pub type PatternRow = Vec<Pat>;

/// The pattern matrix: each row corresponds to one match arm.
#[derive(Clone, Debug, Default)]
pub struct PatternMatrix {
    pub rows: Vec<PatternRow>,
}

/// Signature of a constructor (name + arity).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorSig {
    pub name: String,
    pub arity: usize,
}

/// What the algorithm knows about a column's type.
#[derive(Clone, Debug)]
pub enum TypeInfo {
    /// A closed set of constructors (unions, results, nullables, bool).
    Constructors(Vec<ConstructorSig>),
    /// Infinitely many inhabitants (numbers, strings, chars).
    Infinite,
}

impl TypeInfo {
    fn bool_info() -> TypeInfo {
        TypeInfo::Constructors(vec![
            ConstructorSig { name: "true".into(), arity: 0 },
            ConstructorSig { name: "false".into(), arity: 0 },
        ])
    }
}

// ── Algorithm U ────────────────────────────────────────────────────────

/// Core usefulness predicate: is there a value matched by `row` but by
/// no row of `matrix`?
pub fn is_useful(matrix: &PatternMatrix, row: &[Pat], tys: &[TypeInfo]) -> bool {
    // No columns left: the row is useful iff the matrix has no rows.
    if row.is_empty() {
        return matrix.rows.is_empty();
    }

    match &row[0] {
        Pat::Constructor { name, args } => {
            let specialized = specialize(matrix, name, args.len());
            let mut sub_row = args.clone();
            sub_row.extend_from_slice(&row[1..]);
            let sub_tys = sub_types(args.len(), tys);
            is_useful(&specialized, &sub_row, &sub_tys)
        }

        Pat::Literal { value } => {
            let specialized = specialize_literal(matrix, value);
            is_useful(&specialized, &row[1..], &tys[1..])
        }

        Pat::Wildcard => {
            // If the matrix column covers a complete constructor set,
            // the wildcard is useful iff it is useful under at least one
            // constructor; otherwise the default matrix decides.
            if let Some(sigs) = complete_signature(matrix, tys.first()) {
                return sigs.iter().any(|sig| {
                    let specialized = specialize(matrix, &sig.name, sig.arity);
                    let mut sub_row = vec![Pat::Wildcard; sig.arity];
                    sub_row.extend_from_slice(&row[1..]);
                    let sub_tys = sub_types(sig.arity, tys);
                    is_useful(&specialized, &sub_row, &sub_tys)
                });
            }

            let default = default_matrix(matrix);
            is_useful(&default, &row[1..], &tys[1..])
        }
    }
}

/// Column types after specializing by an arity-n constructor: n unknown
/// sub-columns (always matched by wildcards here) then the remainder.
fn sub_types(arity: usize, tys: &[TypeInfo]) -> Vec<TypeInfo> {
    let mut out = vec![TypeInfo::Infinite; arity];
    out.extend_from_slice(&tys[1..]);
    out
}

/// Specialize the matrix by a constructor: rows starting with the same
/// constructor contribute their arguments; wildcard rows contribute
/// wildcards; other rows are dropped.
fn specialize(matrix: &PatternMatrix, name: &str, arity: usize) -> PatternMatrix {
    let mut rows = Vec::new();
    for row in &matrix.rows {
        let Some(head) = row.first() else { continue };
        match head {
            Pat::Constructor { name: row_name, args } if row_name == name => {
                let mut new_row = args.clone();
                new_row.extend_from_slice(&row[1..]);
                rows.push(new_row);
            }
            Pat::Wildcard => {
                let mut new_row = vec![Pat::Wildcard; arity];
                new_row.extend_from_slice(&row[1..]);
                rows.push(new_row);
            }
            // Bool literals behave as nullary constructors.
            Pat::Literal { value } if value == name => {
                rows.push(row[1..].to_vec());
            }
            _ => {}
        }
    }
    PatternMatrix { rows }
}

/// Specialize the matrix by a literal value.
fn specialize_literal(matrix: &PatternMatrix, value: &str) -> PatternMatrix {
    let mut rows = Vec::new();
    for row in &matrix.rows {
        let Some(head) = row.first() else { continue };
        match head {
            Pat::Literal { value: row_value } if row_value == value => {
                rows.push(row[1..].to_vec());
            }
            Pat::Wildcard => {
                rows.push(row[1..].to_vec());
            }
            _ => {}
        }
    }
    PatternMatrix { rows }
}

/// Rows whose first column is a wildcard, with that column dropped.
fn default_matrix(matrix: &PatternMatrix) -> PatternMatrix {
    let rows = matrix
        .rows
        .iter()
        .filter(|row| matches!(row.first(), Some(Pat::Wildcard)))
        .map(|row| row[1..].to_vec())
        .collect();
    PatternMatrix { rows }
}

/// When the column's type has a closed constructor set and the matrix
/// mentions every constructor, return the full signature.
fn complete_signature(
    matrix: &PatternMatrix,
    ty: Option<&TypeInfo>,
) -> Option<Vec<ConstructorSig>> {
    let TypeInfo::Constructors(sigs) = ty? else {
        return None;
    };
    let all_present = sigs.iter().all(|sig| {
        matrix.rows.iter().any(|row| match row.first() {
            Some(Pat::Constructor { name, .. }) => name == &sig.name,
            Some(Pat::Literal { value }) => value == &sig.name,
            _ => false,
        })
    });
    all_present.then(|| sigs.clone())
}

/// Check whether a set of arms exhausts the scrutinee type. Returns the
/// uncovered constructor names, or `None` when exhaustive. For infinite
/// types the single witness is `_`.
pub fn check_exhaustiveness(arms: &[Pat], ty: &TypeInfo) -> Option<Vec<String>> {
    let matrix = PatternMatrix {
        rows: arms.iter().map(|p| vec![p.clone()]).collect(),
    };
    let tys = [ty.clone()];

    if !is_useful(&matrix, &[Pat::Wildcard], &tys) {
        return None;
    }

    match ty {
        TypeInfo::Constructors(sigs) => {
            let missing: Vec<String> = sigs
                .iter()
                .filter(|sig| {
                    let probe = Pat::Constructor {
                        name: sig.name.clone(),
                        args: vec![Pat::Wildcard; sig.arity],
                    };
                    is_useful(&matrix, &[probe], &tys)
                })
                .map(|sig| sig.name.clone())
                .collect();
            Some(missing)
        }
        TypeInfo::Infinite => Some(vec!["_".to_string()]),
    }
}

/// Indices (0-based) of arms unreachable given the arms before them.
pub fn check_redundancy(arms: &[Pat], ty: &TypeInfo) -> Vec<usize> {
    let tys = [ty.clone()];
    let mut redundant = Vec::new();
    for (i, arm) in arms.iter().enumerate() {
        let matrix = PatternMatrix {
            rows: arms[..i].iter().map(|p| vec![p.clone()]).collect(),
        };
        if !is_useful(&matrix, &[arm.clone()], &tys) {
            redundant.push(i);
        }
    }
    redundant
}

// ── The pass ───────────────────────────────────────────────────────────

/// Check every match expression in the module.
pub fn run(
    file: &SourceFile,
    ctx: &Context,
    types: &FxHashMap<TextRange, TyId>,
    diags: &mut Diagnostics,
) {
    for node in file.syntax().descendants() {
        if node.kind() != SyntaxKind::MATCH_EXPR {
            continue;
        }
        let Some(m) = MatchExpr::cast(node) else { continue };
        check_match(&m, ctx, types, diags);
    }
}

fn check_match(
    m: &MatchExpr,
    ctx: &Context,
    types: &FxHashMap<TextRange, TyId>,
    diags: &mut Diagnostics,
) {
    let Some(scrutinee) = m.scrutinee() else { return };
    let Some(&scrutinee_ty) = types.get(&scrutinee.syntax().text_range()) else {
        return;
    };

    let Some(info) = type_info(ctx, scrutinee_ty) else {
        // Unknown or error-typed scrutinee: nothing to prove.
        return;
    };

    let arms: Vec<Pat> = m
        .arms()
        .filter_map(|arm| arm.pattern().map(|p| abstract_pattern(&p, ctx, &info)))
        .collect();
    if arms.is_empty() {
        return;
    }

    if let Some(missing) = check_exhaustiveness(&arms, &info) {
        let span = node_span(m.syntax());
        if missing == ["_"] {
            diags.push(
                Diagnostic::warning(
                    format!(
                        "match on {} is not exhaustive",
                        ctx.display_ty(scrutinee_ty)
                    ),
                    span,
                )
                .with_hint("add a wildcard `_` or binding arm"),
            );
        } else if !missing.is_empty() {
            diags.push(
                Diagnostic::warning(
                    format!("match does not cover variant(s): {}", missing.join(", ")),
                    span,
                )
                .with_hint("add the missing arms or a wildcard `_` arm"),
            );
        }
    }

    for index in check_redundancy(&arms, &info) {
        if let Some(arm) = m.arms().nth(index) {
            diags.warning(
                format!("match arm {} is unreachable", index + 1),
                node_span(arm.syntax()),
            );
        }
    }
}

/// Build the constructor universe for a scrutinee type.
fn type_info(ctx: &Context, ty: TyId) -> Option<TypeInfo> {
    let structural = unwrap_named(ctx, ty);
    match ctx.ty(structural) {
        Ty::Union { variants } => Some(TypeInfo::Constructors(
            variants
                .iter()
                .map(|(name, fields)| ConstructorSig {
                    name: ctx.str(*name).to_string(),
                    arity: fields.len(),
                })
                .collect(),
        )),
        Ty::Result { .. } => Some(TypeInfo::Constructors(vec![
            ConstructorSig { name: "ok".into(), arity: 1 },
            ConstructorSig { name: "err".into(), arity: 1 },
        ])),
        Ty::Nullable(_) => Some(TypeInfo::Constructors(vec![
            ConstructorSig { name: "Some".into(), arity: 1 },
            ConstructorSig { name: "None".into(), arity: 0 },
        ])),
        Ty::Bool => Some(TypeInfo::bool_info()),
        Ty::Int(_) | Ty::Float(_) | Ty::IntLit | Ty::FloatLit | Ty::Str | Ty::Char | Ty::Bytes => {
            Some(TypeInfo::Infinite)
        }
        _ => None,
    }
}

fn unwrap_named(ctx: &Context, ty: TyId) -> TyId {
    match ctx.ty(ty) {
        Ty::Named { underlying, .. } => unwrap_named(ctx, *underlying),
        _ => ty,
    }
}

/// Translate an AST pattern to its abstract form. Field bindings are
/// irrefutable, so constructor arguments become wildcards sized by the
/// constructor's declared arity.
fn abstract_pattern(pattern: &Pattern, _ctx: &Context, info: &TypeInfo) -> Pat {
    let arity_of = |name: &str| -> usize {
        match info {
            TypeInfo::Constructors(sigs) => sigs
                .iter()
                .find(|sig| sig.name == name)
                .map(|sig| sig.arity)
                .unwrap_or(0),
            TypeInfo::Infinite => 0,
        }
    };

    match pattern {
        Pattern::Wildcard(_) | Pattern::Ident(_) => Pat::Wildcard,
        Pattern::Literal(lit) => Pat::Literal { value: lit.text() },
        Pattern::Variant(v) => {
            let name = v.name().map(|n| n.text()).unwrap_or_default();
            let arity = arity_of(&name);
            Pat::Constructor {
                name,
                args: vec![Pat::Wildcard; arity],
            }
        }
        Pattern::Ok(_) => Pat::Constructor {
            name: "ok".into(),
            args: vec![Pat::Wildcard],
        },
        Pattern::Err(_) => Pat::Constructor {
            name: "err".into(),
            args: vec![Pat::Wildcard],
        },
        Pattern::Some(_) => Pat::Constructor {
            name: "Some".into(),
            args: vec![Pat::Wildcard],
        },
        Pattern::None(_) => Pat::Constructor {
            name: "None".into(),
            args: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wildcard() -> Pat {
        Pat::Wildcard
    }

    fn ctor(name: &str, args: Vec<Pat>) -> Pat {
        Pat::Constructor {
            name: name.to_string(),
            args,
        }
    }

    fn lit(value: &str) -> Pat {
        Pat::Literal {
            value: value.to_string(),
        }
    }

    fn color() -> TypeInfo {
        TypeInfo::Constructors(vec![
            ConstructorSig { name: "Red".into(), arity: 0 },
            ConstructorSig { name: "Green".into(), arity: 0 },
            ConstructorSig { name: "Blue".into(), arity: 0 },
        ])
    }

    fn result_info() -> TypeInfo {
        TypeInfo::Constructors(vec![
            ConstructorSig { name: "ok".into(), arity: 1 },
            ConstructorSig { name: "err".into(), arity: 1 },
        ])
    }

    fn matrix(rows: Vec<Vec<Pat>>) -> PatternMatrix {
        PatternMatrix { rows }
    }

    // ── is_useful base cases ─────────────────────────────────────────

    #[test]
    fn useful_against_empty_matrix() {
        let m = matrix(vec![]);
        assert!(is_useful(&m, &[wildcard()], &[TypeInfo::Infinite]));
    }

    #[test]
    fn empty_row_not_useful_against_nonempty_matrix() {
        let m = matrix(vec![vec![]]);
        assert!(!is_useful(&m, &[], &[]));
    }

    #[test]
    fn empty_row_useful_against_empty_matrix() {
        let m = matrix(vec![]);
        assert!(is_useful(&m, &[], &[]));
    }

    // ── Constructors ─────────────────────────────────────────────────

    #[test]
    fn different_constructor_is_useful() {
        let m = matrix(vec![vec![ctor("Red", vec![])]]);
        assert!(is_useful(&m, &[ctor("Green", vec![])], &[color()]));
    }

    #[test]
    fn same_constructor_not_useful() {
        let m = matrix(vec![vec![ctor("Red", vec![])]]);
        assert!(!is_useful(&m, &[ctor("Red", vec![])], &[color()]));
    }

    #[test]
    fn wildcard_after_all_constructors_not_useful() {
        let m = matrix(vec![
            vec![ctor("Red", vec![])],
            vec![ctor("Green", vec![])],
            vec![ctor("Blue", vec![])],
        ]);
        assert!(!is_useful(&m, &[wildcard()], &[color()]));
    }

    #[test]
    fn wildcard_after_partial_constructors_useful() {
        let m = matrix(vec![vec![ctor("Red", vec![])], vec![ctor("Green", vec![])]]);
        assert!(is_useful(&m, &[wildcard()], &[color()]));
    }

    // ── Literals ─────────────────────────────────────────────────────

    #[test]
    fn new_literal_value_useful() {
        let m = matrix(vec![vec![lit("1")]]);
        assert!(is_useful(&m, &[lit("2")], &[TypeInfo::Infinite]));
    }

    #[test]
    fn duplicate_literal_not_useful() {
        let m = matrix(vec![vec![lit("1")]]);
        assert!(!is_useful(&m, &[lit("1")], &[TypeInfo::Infinite]));
    }

    #[test]
    fn wildcard_always_useful_for_infinite_types_without_default() {
        let m = matrix(vec![vec![lit("1")], vec![lit("2")]]);
        assert!(is_useful(&m, &[wildcard()], &[TypeInfo::Infinite]));
    }

    // ── Exhaustiveness ───────────────────────────────────────────────

    #[test]
    fn union_fully_covered() {
        let arms = [ctor("Red", vec![]), ctor("Green", vec![]), ctor("Blue", vec![])];
        assert_eq!(check_exhaustiveness(&arms, &color()), None);
    }

    #[test]
    fn union_missing_variant_is_reported() {
        let arms = [ctor("Red", vec![]), ctor("Green", vec![])];
        let missing = check_exhaustiveness(&arms, &color()).unwrap();
        assert_eq!(missing, vec!["Blue".to_string()]);
    }

    #[test]
    fn wildcard_covers_everything() {
        let arms = [wildcard()];
        assert_eq!(check_exhaustiveness(&arms, &color()), None);
        assert_eq!(check_exhaustiveness(&arms, &TypeInfo::Infinite), None);
    }

    #[test]
    fn result_requires_both_paths() {
        let ok_only = [ctor("ok", vec![wildcard()])];
        let missing = check_exhaustiveness(&ok_only, &result_info()).unwrap();
        assert_eq!(missing, vec!["err".to_string()]);

        let both = [ctor("ok", vec![wildcard()]), ctor("err", vec![wildcard()])];
        assert_eq!(check_exhaustiveness(&both, &result_info()), None);
    }

    #[test]
    fn bool_needs_both_or_wildcard() {
        let info = TypeInfo::bool_info();
        let one = [lit("true")];
        let missing = check_exhaustiveness(&one, &info).unwrap();
        assert_eq!(missing, vec!["false".to_string()]);

        let both = [lit("true"), lit("false")];
        assert_eq!(check_exhaustiveness(&both, &info), None);
    }

    #[test]
    fn infinite_type_needs_wildcard() {
        let arms = [lit("1"), lit("2")];
        let missing = check_exhaustiveness(&arms, &TypeInfo::Infinite).unwrap();
        assert_eq!(missing, vec!["_".to_string()]);
    }

    // ── Redundancy ───────────────────────────────────────────────────

    #[test]
    fn arm_after_wildcard_is_redundant() {
        let arms = [wildcard(), ctor("Red", vec![])];
        assert_eq!(check_redundancy(&arms, &color()), vec![1]);
    }

    #[test]
    fn duplicate_arm_is_redundant() {
        let arms = [ctor("Red", vec![]), ctor("Red", vec![]), ctor("Green", vec![])];
        assert_eq!(check_redundancy(&arms, &color()), vec![1]);
    }

    #[test]
    fn distinct_arms_are_not_redundant() {
        let arms = [ctor("Red", vec![]), ctor("Green", vec![])];
        assert!(check_redundancy(&arms, &color()).is_empty());
    }

    #[test]
    fn wildcard_after_complete_cover_is_redundant() {
        let arms = [
            ctor("Red", vec![]),
            ctor("Green", vec![]),
            ctor("Blue", vec![]),
            wildcard(),
        ];
        assert_eq!(check_redundancy(&arms, &color()), vec![3]);
    }
}
