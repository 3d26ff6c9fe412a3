//! Acceptance scenarios: literal inputs with pinned-down outcomes.

use ferrule_common::diagnostics::Severity;
use ferrule_sema::analyze;

fn messages(analysis: &ferrule_sema::Analysis, severity: Severity) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn happy_path_simple_function() {
    let source = "package app;\nfunction add(a: i32, b: i32) -> i32 { return a + b; }";
    let analysis = analyze(source, "add.fe");

    assert!(
        analysis.diagnostics.is_empty(),
        "expected zero diagnostics, got: {:?}",
        analysis.diagnostics.iter().collect::<Vec<_>>()
    );

    // The function symbol is visible through the tables.
    assert!(analysis.locations.definition("add").is_some());
    let hover = analysis
        .hover
        .iter()
        .find(|e| e.name == "add")
        .expect("hover entry for add");
    let detail = hover.detail.as_deref().unwrap();
    assert_eq!(detail, "function add(a: i32, b: i32) -> i32");
}

#[test]
fn numeric_literal_requires_annotation() {
    let analysis = analyze("const x = 42;", "lit.fe");
    let errors = messages(&analysis, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], "numeric literal requires explicit type annotation");

    // Anchored on `x`.
    let diag = analysis.diagnostics.iter().next().unwrap();
    assert_eq!(diag.span.start, 6);
    assert_eq!(diag.span.end, 7);
}

#[test]
fn effect_requires_capability_parameter() {
    let analysis = analyze("function f() -> () effects [fs] { }", "fs.fe");
    let errors = messages(&analysis, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "effect 'fs' requires a capability parameter of type Fs"
    );
}

#[test]
fn check_with_non_subset_domain() {
    let source = "domain A = X;\n\
                  domain B = Y;\n\
                  function callA() -> i32 error A { return err X; }\n\
                  function g() -> i32 error B { return ok check callA(); }";
    let analysis = analyze(source, "domains.fe");
    let errors = messages(&analysis, Severity::Error);
    assert_eq!(errors.len(), 1, "got: {errors:?}");
    assert_eq!(
        errors[0],
        "error domain 'A' is not compatible with function's error domain 'B'"
    );
}

#[test]
fn match_non_exhaustive_over_union() {
    let source = "type Color = | Red | Green | Blue;\n\
                  function f(c: Color) -> i32 { match c { Red -> 1; Green -> 2; } return 0; }";
    let analysis = analyze(source, "color.fe");

    let errors = messages(&analysis, Severity::Error);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    let warnings = messages(&analysis, Severity::Warning);
    assert_eq!(warnings.len(), 1, "got: {warnings:?}");
    assert_eq!(warnings[0], "match does not cover variant(s): Blue");
}

#[test]
fn region_escape_supersedes_disposal_warning() {
    let source = "function f() -> Region { var r: Region = createRegion(); return r; }";
    let analysis = analyze(source, "region.fe");

    let errors = messages(&analysis, Severity::Error);
    assert_eq!(errors.len(), 1, "got: {errors:?}");
    assert_eq!(errors[0], "region escapes its creating scope");

    // The escape error supersedes the undisposed warning.
    let warnings = messages(&analysis, Severity::Warning);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}
