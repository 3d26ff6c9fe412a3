//! Error-domain coherence: `ok`, `err`, `check`, `ensure`, `map_error`.

use ferrule_common::diagnostics::Severity;
use ferrule_sema::analyze;

fn errors(source: &str) -> Vec<String> {
    analyze(source, "test.fe")
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}

fn assert_clean(source: &str) {
    let found = errors(source);
    assert!(found.is_empty(), "expected no errors, got: {found:?}");
}

#[test]
fn ok_and_err_inside_domain_function() {
    assert_clean(
        "domain Io = NotFound | Denied { code: i64 };\n\
         function read(path: string) -> i32 error Io {\n\
         ensure path.len > 0 else err NotFound;\n\
         return ok 0;\n\
         }",
    );
}

#[test]
fn err_variant_must_belong_to_domain() {
    let source = "domain Io = NotFound;\n\
                  function f() -> i32 error Io { return err Timeout; }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0], "error domain 'Io' has no variant 'Timeout'");
}

#[test]
fn ensure_variant_must_belong_to_domain() {
    let source = "domain Io = NotFound;\n\
                  function f(n: i64) -> i32 error Io {\n\
                  ensure n > 0 else err Negative;\n\
                  return ok 0;\n\
                  }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0], "error domain 'Io' has no variant 'Negative'");
}

#[test]
fn err_fields_are_type_checked_against_the_domain() {
    let source = "domain Io = Denied { code: i64 };\n\
                  function f() -> i32 error Io { return err Denied { code: \"x\" }; }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("expected i64, found string"), "{found:?}");
}

#[test]
fn check_accepts_equal_domain() {
    assert_clean(
        "domain Io = NotFound;\n\
         function inner() -> i32 error Io { return ok 1; }\n\
         function outer() -> i32 error Io { return ok check inner(); }",
    );
}

#[test]
fn check_accepts_subset_domain() {
    assert_clean(
        "domain Small = NotFound;\n\
         function inner() -> i32 error Small { return ok 1; }\n\
         domain Big = NotFound | Denied;\n\
         function outer() -> i32 error Big { return ok check inner(); }",
    );
}

#[test]
fn check_rejects_non_subset_domain() {
    let source = "domain Net = Timeout;\n\
                  function fetch() -> i32 error Net { return ok 1; }\n\
                  domain Io = NotFound;\n\
                  function f() -> i32 error Io { return ok check fetch(); }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(
        found[0],
        "error domain 'Net' is not compatible with function's error domain 'Io'"
    );
}

#[test]
fn check_requires_a_result_value() {
    let source = "domain Io = NotFound;\n\
                  function f(n: i32) -> i32 error Io { return ok check n; }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("check requires a Result value"), "{found:?}");
}

#[test]
fn error_forms_are_rejected_outside_domain_functions() {
    let cases = [
        ("function f() -> i32 { return ok 1; }", "ok"),
        ("function f() -> () { ensure true else err Oops; }", "ensure"),
    ];
    for (source, form) in cases {
        let found = errors(source);
        assert!(
            found.iter().any(|m| {
                m.contains(&format!(
                    "`{form}` is only allowed in a function with a declared error domain"
                ))
            }),
            "form {form}: {found:?}"
        );
    }
}

#[test]
fn check_outside_domain_function_is_rejected() {
    let source = "domain Io = NotFound;\n\
                  function inner() -> i32 error Io { return ok 1; }\n\
                  function f() -> i32 { return check inner(); }";
    let found = errors(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(
        found[0].contains("`check` is only allowed in a function with a declared error domain"),
        "{found:?}"
    );
}

#[test]
fn map_error_rebinds_the_domain() {
    assert_clean(
        "domain Net = Timeout;\n\
         function fetch() -> i32 error Net { return ok 1; }\n\
         domain App = Failed;\n\
         function f() -> i32 error App {\n\
         return ok check map_error fetch() using (e => Failed);\n\
         }",
    );
}

#[test]
fn unknown_error_domain_on_function_is_reported() {
    let source = "function f() -> i32 error Nowhere { return ok 1; }";
    let found = errors(source);
    assert!(
        found.iter().any(|m| m.contains("unknown error domain 'Nowhere'")),
        "{found:?}"
    );
}

#[test]
fn use_error_requires_a_known_error_type() {
    let found = errors("use error Mystery;");
    assert_eq!(found, vec!["unknown error type 'Mystery'".to_string()]);

    assert_clean("error ParseFailure { line: i64 };\nuse error ParseFailure;");
}
