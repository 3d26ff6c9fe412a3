//! Hover and symbol-location tables, plus whole-run properties.

use ferrule_sema::analyze;
use ferrule_sema::tables::HoverKind;

const SOURCE: &str = "package app;\n\
function add(a: i32, b: i32) -> i32 { return a + b; }\n\
function main() -> i32 {\n\
    var total: i32 = add(1, 2);\n\
    return total;\n\
}\n";

#[test]
fn hover_at_function_definition() {
    let analysis = analyze(SOURCE, "app.fe");
    // `add` is defined at line 2, column 10.
    let entry = analysis.hover.find_at(2, 10).expect("hover entry for add");
    assert_eq!(entry.name, "add");
    assert_eq!(entry.kind, HoverKind::Function);
    assert_eq!(
        entry.detail.as_deref(),
        Some("function add(a: i32, b: i32) -> i32")
    );
}

#[test]
fn hover_at_parameter_and_local() {
    let analysis = analyze(SOURCE, "app.fe");

    // Parameter `a` at line 2, column 14.
    let entry = analysis.hover.find_at(2, 14).expect("hover entry for a");
    assert_eq!(entry.name, "a");
    assert_eq!(entry.kind, HoverKind::Parameter);
    assert_eq!(analysis.context.display_ty(entry.ty), "i32");

    // Local `total` at line 4, column 9.
    let entry = analysis.hover.find_at(4, 9).expect("hover entry for total");
    assert_eq!(entry.name, "total");
    assert_eq!(entry.kind, HoverKind::Variable);
    assert_eq!(analysis.context.display_ty(entry.ty), "i32");
}

#[test]
fn hover_at_use_site() {
    let analysis = analyze(SOURCE, "app.fe");
    // The call to `add` at line 4, column 22.
    let entry = analysis.hover.find_at(4, 22).expect("hover entry at call");
    assert_eq!(entry.name, "add");
    assert_eq!(entry.kind, HoverKind::Function);
}

#[test]
fn definitions_and_references() {
    let analysis = analyze(SOURCE, "app.fe");

    let def = analysis.locations.definition("add").expect("definition of add");
    assert_eq!(&SOURCE[def.start as usize..def.end as usize], "add");

    let refs = analysis.locations.references("add");
    assert_eq!(refs.len(), 1, "one call site");
    assert_eq!(&SOURCE[refs[0].start as usize..refs[0].end as usize], "add");
    assert!(refs[0].start > def.end, "reference comes after the definition");

    // find_symbol_at works from both ends.
    assert_eq!(analysis.locations.find_symbol_at(def.start), Some("add"));
    assert_eq!(analysis.locations.find_symbol_at(refs[0].start), Some("add"));
}

#[test]
fn expression_types_are_recorded_and_interned() {
    let analysis = analyze(SOURCE, "app.fe");
    assert!(!analysis.types.is_empty());

    // Every recorded handle resolves against the context without panic,
    // and displaying it twice is stable.
    for (&range, &ty) in &analysis.types {
        let first = analysis.context.display_ty(ty);
        let second = analysis.context.display_ty(ty);
        assert_eq!(first, second);
        assert!(usize::from(range.end()) <= SOURCE.len());
    }
}

#[test]
fn analysis_is_deterministic() {
    let first = analyze(SOURCE, "app.fe");
    let second = analyze(SOURCE, "app.fe");

    assert_eq!(
        first.render_diagnostics(SOURCE),
        second.render_diagnostics(SOURCE)
    );
    assert_eq!(first.hover.len(), second.hover.len());
    assert_eq!(first.types.len(), second.types.len());
    assert_eq!(first.locations.len(), second.locations.len());
}

#[test]
fn parse_failure_produces_a_single_diagnostic_and_empty_tables() {
    let source = "function f( { }";
    let analysis = analyze(source, "bad.fe");
    assert!(analysis.has_errors());
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(analysis.hover.is_empty());
    assert!(analysis.types.is_empty());
}

#[test]
fn declaration_errors_skip_later_passes() {
    // Duplicate declaration in pass 1; the body's type error must not be
    // reported because passes 2-7 are skipped.
    let source = "function f() -> () { var x: i32 = \"oops\"; }\n\
                  function f() -> () { }";
    let analysis = analyze(source, "dup.fe");
    let messages: Vec<&str> = analysis
        .diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(messages, vec!["duplicate declaration of 'f'"]);
}

#[test]
fn diagnostics_render_in_source_order() {
    let source = "function g() -> () { var a: i32 = \"x\"; var b: i32 = \"y\"; }";
    let analysis = analyze(source, "order.fe");
    let ordered = analysis.diagnostics.in_source_order();
    assert_eq!(ordered.len(), 2);
    assert!(ordered[0].span.start < ordered[1].span.start);
}
