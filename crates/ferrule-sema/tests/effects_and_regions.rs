//! Effect checking and region tracking.

use ferrule_common::diagnostics::Severity;
use ferrule_sema::analyze;

fn by_severity(source: &str, severity: Severity) -> Vec<String> {
    analyze(source, "test.fe")
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.message.clone())
        .collect()
}

fn errors(source: &str) -> Vec<String> {
    by_severity(source, Severity::Error)
}

fn warnings(source: &str) -> Vec<String> {
    by_severity(source, Severity::Warning)
}

// ── Effects ──────────────────────────────────────────────────────────────

#[test]
fn declared_effects_with_capability_are_accepted() {
    let source = "function log(cap io: Io, msg: string) -> () effects [io] { print(msg); }";
    assert!(errors(source).is_empty(), "{:?}", errors(source));
}

#[test]
fn empty_effects_clause_rejects_effectful_calls() {
    let source = "function f() -> () effects [] { print(\"hi\"); }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(
        found[0],
        "call to 'print' uses effect(s) [io] not declared by 'f'"
    );
}

#[test]
fn transitive_effects_flow_through_user_functions() {
    let source = "function helper(cap io: Io) -> () effects [io] { print(\"x\"); }\n\
                  function f(cap io: Io) -> () effects [cpu] { helper(io); }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(
        found[0],
        "call to 'helper' uses effect(s) [io] not declared by 'f'"
    );
}

#[test]
fn unknown_effect_is_a_declaration_error() {
    let source = "function f() -> () effects [gpu] { }";
    let found = errors(source);
    assert_eq!(found, vec!["unknown effect 'gpu'".to_string()]);
}

#[test]
fn each_paired_effect_names_its_capability() {
    for (effect, token) in [
        ("fs", "Fs"),
        ("net", "Net"),
        ("io", "Io"),
        ("time", "Time"),
        ("rng", "Rng"),
        ("ffi", "Ffi"),
    ] {
        let source = format!("function f() -> () effects [{effect}] {{ }}");
        let found = errors(&source);
        assert_eq!(
            found,
            vec![format!(
                "effect '{effect}' requires a capability parameter of type {token}"
            )],
            "effect {effect}"
        );
    }
}

#[test]
fn unpaired_effects_need_no_capability() {
    for effect in ["alloc", "cpu", "atomics", "simd"] {
        let source = format!("function f() -> () effects [{effect}] {{ }}");
        let found = errors(&source);
        assert!(found.is_empty(), "effect {effect}: {found:?}");
    }
}

#[test]
fn region_creation_requires_alloc_when_clause_present() {
    let source = "function f() -> () effects [] {\n\
                  var r: Region = createRegion();\n\
                  defer r.dispose();\n\
                  }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(
        found[0],
        "call to 'createRegion' uses effect(s) [alloc] not declared by 'f'"
    );
}

#[test]
fn functions_without_effects_clause_are_unconstrained() {
    let source = "function f() -> () { print(\"hi\"); }";
    assert!(errors(source).is_empty());
}

// ── Regions ──────────────────────────────────────────────────────────────

#[test]
fn undisposed_region_is_a_warning() {
    let source = "function f() -> () { var r: Region = createRegion(); }";
    let found = warnings(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0], "region 'r' is not disposed before leaving its scope");
}

#[test]
fn deferred_dispose_discharges_the_region() {
    let source = "function f() -> () {\n\
                  var r: Region = createRegion();\n\
                  defer r.dispose();\n\
                  }";
    assert!(warnings(source).is_empty());
    assert!(errors(source).is_empty());
}

#[test]
fn direct_dispose_also_counts() {
    let source = "function f() -> () {\n\
                  var r: Region = createRegion();\n\
                  r.dispose();\n\
                  }";
    assert!(warnings(source).is_empty());
}

#[test]
fn region_in_nested_scope_is_tracked_per_scope() {
    let source = "function f(go: bool) -> () {\n\
                  if go {\n\
                  var r: Region = createRegion();\n\
                  }\n\
                  }";
    let found = warnings(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("region 'r'"));
}

#[test]
fn loop_bodies_are_nested_scopes() {
    let source = "function f(items: Array<i64, 4>) -> () {\n\
                  for x in items {\n\
                  var scratch: Region = createRegion();\n\
                  defer scratch.dispose();\n\
                  }\n\
                  }";
    assert!(warnings(source).is_empty());
    assert!(errors(source).is_empty());
}

#[test]
fn returning_a_region_is_an_escape_error() {
    let source = "function f() -> Region {\n\
                  var r: Region = createRegion();\n\
                  defer r.dispose();\n\
                  return r;\n\
                  }";
    let found = errors(source);
    assert_eq!(found, vec!["region escapes its creating scope".to_string()]);
}
