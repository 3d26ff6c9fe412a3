use ferrule_parser::ast::expr::{Expr, LiteralKind};
use ferrule_parser::ast::item::{Item, Stmt};
use ferrule_parser::ast::pat::Pattern;
use ferrule_parser::ast::ty::Type;
use ferrule_parser::{parse, SyntaxNode};
use insta::assert_snapshot;

/// Render a CST as a compact one-line S-expression of kinds, for
/// structural snapshots.
fn dump(node: &SyntaxNode) -> String {
    let children: Vec<String> = node
        .children_with_tokens()
        .map(|child| match child {
            rowan::NodeOrToken::Node(n) => dump(&n),
            rowan::NodeOrToken::Token(t) => format!("{:?}", t.kind()),
        })
        .collect();
    if children.is_empty() {
        format!("({:?})", node.kind())
    } else {
        format!("({:?} {})", node.kind(), children.join(" "))
    }
}

fn parse_ok(source: &str) -> ferrule_parser::Parse {
    let result = parse(source);
    assert!(
        result.ok(),
        "expected clean parse of {source:?}, got {:?}",
        result.errors()
    );
    result
}

/// The single declaration of a one-declaration module.
fn only_decl(parse: &ferrule_parser::Parse) -> Item {
    let file = parse.source_file();
    let mut decls: Vec<Item> = file.decls().collect();
    assert_eq!(decls.len(), 1, "expected exactly one declaration");
    decls.remove(0)
}

// ── Structural snapshots ─────────────────────────────────────────────────

#[test]
fn cst_shape_const_decl() {
    let result = parse_ok("const x = 1;");
    assert_snapshot!(
        dump(&result.syntax()),
        @"(SOURCE_FILE (CONST_DECL CONST_KW (NAME IDENT) EQ (LITERAL INT_LITERAL) SEMICOLON) EOF)"
    );
}

#[test]
fn cst_shape_precedence() {
    let result = parse_ok("const y = 1 + 2 * 3;");
    assert_snapshot!(
        dump(&result.syntax()),
        @"(SOURCE_FILE (CONST_DECL CONST_KW (NAME IDENT) EQ (BINARY_EXPR (LITERAL INT_LITERAL) PLUS (BINARY_EXPR (LITERAL INT_LITERAL) STAR (LITERAL INT_LITERAL))) SEMICOLON) EOF)"
    );
}

#[test]
fn cst_shape_record_type_decl() {
    let result = parse_ok("type R = { a: i32 };");
    assert_snapshot!(
        dump(&result.syntax()),
        @"(SOURCE_FILE (TYPE_DECL TYPE_KW (NAME IDENT) EQ (RECORD_TYPE (VARIANT_FIELD_LIST L_BRACE (VARIANT_FIELD (NAME IDENT) COLON (SIMPLE_TYPE IDENT)) R_BRACE)) SEMICOLON) EOF)"
    );
}

// ── Module header ────────────────────────────────────────────────────────

#[test]
fn package_and_imports() {
    let result = parse_ok(
        "package app.core;\n\
         import io.fs { open, close as shut } using capability Fs;\n\
         import std.mem { copy };\n",
    );
    let file = result.source_file();

    let pkg = file.package_decl().unwrap();
    assert_eq!(pkg.dotted_name().unwrap().text(), "app.core");

    let imports: Vec<_> = file.imports().collect();
    assert_eq!(imports.len(), 2);

    assert_eq!(imports[0].source().unwrap().text(), "io.fs");
    let items: Vec<_> = imports[0].items().collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name_token().unwrap().text(), "open");
    assert_eq!(items[1].name_token().unwrap().text(), "close");
    assert_eq!(items[1].alias_token().unwrap().text(), "shut");
    assert_eq!(imports[0].capability_token().unwrap().text(), "Fs");

    assert!(imports[1].capability_token().is_none());
}

#[test]
fn package_path_tolerates_keywords() {
    // Keyword-as-identifier tolerance applies only in package path segments.
    let result = parse_ok("package app.match;");
    let pkg = result.source_file().package_decl().unwrap();
    assert_eq!(pkg.dotted_name().unwrap().text(), "app.match");
}

// ── Functions ────────────────────────────────────────────────────────────

#[test]
fn function_with_full_signature() {
    let result = parse_ok(
        "function read_all<T>(cap fs: Fs, inout buf: View<mut u8>, n: i64) \
         -> i64 error IoError effects [fs, alloc] { return 0; }",
    );
    let Item::FnDecl(f) = only_decl(&result) else {
        panic!("expected a function");
    };

    assert_eq!(f.name().unwrap().text(), "read_all");
    assert_eq!(f.type_params().len(), 1);
    assert_eq!(f.type_params()[0].text(), "T");

    let params: Vec<_> = f.params().collect();
    assert_eq!(params.len(), 3);
    assert!(params[0].is_cap());
    assert!(!params[0].is_inout());
    assert_eq!(params[0].name().unwrap().text(), "fs");
    assert!(params[1].is_inout());
    assert_eq!(params[1].name().unwrap().text(), "buf");
    assert!(!params[2].is_cap() && !params[2].is_inout());

    assert!(f.ret_type().unwrap().ty().is_some());
    assert_eq!(f.error_clause().unwrap().domain_token().unwrap().text(), "IoError");

    let effects: Vec<String> = f
        .effects_clause()
        .unwrap()
        .effect_tokens()
        .iter()
        .map(|t| t.text().to_string())
        .collect();
    assert_eq!(effects, vec!["fs", "alloc"]);

    assert!(f.body().is_some());
}

#[test]
fn view_mut_type_argument() {
    let result = parse_ok("function f(v: View<mut u8>) -> () { }");
    let Item::FnDecl(f) = only_decl(&result) else {
        panic!("expected a function");
    };
    let param = f.params().next().unwrap();
    let Some(Type::Generic(g)) = param.ty() else {
        panic!("expected generic type");
    };
    assert_eq!(g.name().unwrap().text(), "View");
    let args = g.args();
    assert_eq!(args.len(), 1);
    assert!(args[0].is_mut());
}

#[test]
fn const_generic_type_argument() {
    let result = parse_ok("function f(a: Array<i32, 8>) -> () { }");
    let Item::FnDecl(f) = only_decl(&result) else {
        panic!("expected a function");
    };
    let Some(Type::Generic(g)) = f.params().next().unwrap().ty() else {
        panic!("expected generic type");
    };
    let args = g.args();
    assert_eq!(args.len(), 2);
    assert!(args[0].ty().is_some());
    assert_eq!(args[1].const_value(), Some(8));
}

#[test]
fn nullable_type_sugar() {
    let result = parse_ok("function f(x: i32?) -> () { }");
    let Item::FnDecl(f) = only_decl(&result) else {
        panic!("expected a function");
    };
    let Some(Type::Nullable(n)) = f.params().next().unwrap().ty() else {
        panic!("expected nullable type");
    };
    let Some(Type::Simple(inner)) = n.inner() else {
        panic!("expected simple inner type");
    };
    assert_eq!(inner.text(), "i32");
}

// ── Type, error, domain declarations ─────────────────────────────────────

#[test]
fn union_type_declaration() {
    let result = parse_ok("type Color = | Red | Green | Blue;");
    let Item::TypeDecl(t) = only_decl(&result) else {
        panic!("expected a type declaration");
    };
    assert_eq!(t.name().unwrap().text(), "Color");
    let Some(Type::Union(u)) = t.ty() else {
        panic!("expected union type");
    };
    let names: Vec<String> = u
        .variants()
        .map(|v| v.name().unwrap().text())
        .collect();
    assert_eq!(names, vec!["Red", "Green", "Blue"]);
}

#[test]
fn record_type_declaration() {
    let result = parse_ok("type Point = { x: i32, y: i32 };");
    let Item::TypeDecl(t) = only_decl(&result) else {
        panic!("expected a type declaration");
    };
    let Some(Type::Record(r)) = t.ty() else {
        panic!("expected record type");
    };
    let fields: Vec<String> = r.fields().map(|f| f.name().unwrap().text()).collect();
    assert_eq!(fields, vec!["x", "y"]);
}

#[test]
fn domain_declaration_union_form() {
    let result = parse_ok("domain IoError = NotFound | Denied { code: i64 };");
    let Item::DomainDecl(d) = only_decl(&result) else {
        panic!("expected a domain declaration");
    };
    assert_eq!(d.name().unwrap().text(), "IoError");
    let variants: Vec<_> = d.variants().collect();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].name().unwrap().text(), "NotFound");
    assert_eq!(variants[0].fields().count(), 0);
    assert_eq!(variants[1].name().unwrap().text(), "Denied");
    let fields: Vec<String> = variants[1]
        .fields()
        .map(|f| f.name().unwrap().text())
        .collect();
    assert_eq!(fields, vec!["code"]);
}

#[test]
fn domain_declaration_inline_form() {
    let result = parse_ok("domain Net { Timeout, Refused { port: i64 } }");
    let Item::DomainDecl(d) = only_decl(&result) else {
        panic!("expected a domain declaration");
    };
    let names: Vec<String> = d.variants().map(|v| v.name().unwrap().text()).collect();
    assert_eq!(names, vec!["Timeout", "Refused"]);
}

#[test]
fn error_and_use_error_declarations() {
    let result = parse_ok("error ParseFailure { line: i64 };\nuse error ParseFailure;");
    let file = result.source_file();
    let decls: Vec<_> = file.decls().collect();
    assert_eq!(decls.len(), 2);
    let Item::ErrorDecl(e) = &decls[0] else {
        panic!("expected an error declaration");
    };
    assert_eq!(e.name().unwrap().text(), "ParseFailure");
    assert_eq!(e.fields().count(), 1);
    let Item::UseErrorDecl(u) = &decls[1] else {
        panic!("expected a use-error declaration");
    };
    assert_eq!(u.error_token().unwrap().text(), "ParseFailure");
}

// ── Expressions ──────────────────────────────────────────────────────────

/// Parse a single-statement function body and return the statement.
fn first_stmt(source_body: &str) -> (ferrule_parser::Parse, Stmt) {
    let source = format!("function f() -> () {{ {source_body} }}");
    let result = parse_ok(&source);
    let Item::FnDecl(f) = only_decl(&result) else {
        panic!("expected a function");
    };
    let stmt = f.body().unwrap().statements().next().expect("one statement");
    (result, stmt)
}

#[test]
fn precedence_additive_vs_multiplicative() {
    let (_p, stmt) = first_stmt("var x: i32 = 1 + 2 * 3;");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::Binary(add)) = v.value() else {
        panic!("expected binary expression");
    };
    assert_eq!(add.op_token().unwrap().text(), "+");
    // The RHS of `+` must be the `2 * 3` product.
    let Some(Expr::Binary(mul)) = add.rhs() else {
        panic!("expected nested binary expression");
    };
    assert_eq!(mul.op_token().unwrap().text(), "*");
}

#[test]
fn precedence_comparison_vs_logic() {
    let (_p, stmt) = first_stmt("var b: bool = a < 1 && c >= 2;");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::Binary(and)) = v.value() else {
        panic!("expected binary expression");
    };
    assert_eq!(and.op_token().unwrap().text(), "&&");
}

#[test]
fn precedence_shift_binds_tighter_than_bitand() {
    let (_p, stmt) = first_stmt("var x: i32 = a & b << 2;");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::Binary(and)) = v.value() else {
        panic!("expected binary expression");
    };
    assert_eq!(and.op_token().unwrap().text(), "&");
    let Some(Expr::Binary(shift)) = and.rhs() else {
        panic!("expected shift on the right");
    };
    assert_eq!(shift.op_token().unwrap().text(), "<<");
}

#[test]
fn range_is_loosest() {
    let (_p, stmt) = first_stmt("for i in 0 .. n + 1 { }");
    let Stmt::For(f) = stmt else { panic!() };
    let Some(Expr::Range(r)) = f.iterable() else {
        panic!("expected range expression");
    };
    assert!(!r.is_inclusive());
    assert!(matches!(r.end(), Some(Expr::Binary(_))));
}

#[test]
fn postfix_chain_call_member_index() {
    let (_p, stmt) = first_stmt("table.rows[0].len();");
    let Stmt::Expr(e) = stmt else { panic!() };
    let Some(Expr::Call(call)) = e.expr() else {
        panic!("expected call");
    };
    let Some(Expr::FieldAccess(len)) = call.callee() else {
        panic!("expected field access callee");
    };
    assert_eq!(len.field_token().unwrap().text(), "len");
    assert!(matches!(len.base(), Some(Expr::Index(_))));
}

#[test]
fn record_literal_vs_block_disambiguation() {
    // `{ x: ... }` with ident-colon lookahead is a record literal.
    let (_p, stmt) = first_stmt("var p: Point = { x: 1, y: 2 };");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::RecordLiteral(r)) = v.value() else {
        panic!("expected record literal");
    };
    assert_eq!(r.fields().count(), 2);

    // Without the lookahead match it is a block.
    let (_p2, stmt2) = first_stmt("{ return; }");
    let Stmt::Expr(e) = stmt2 else { panic!() };
    assert!(matches!(e.expr(), Some(Expr::Block(_))));
}

#[test]
fn variant_constructor_heuristic() {
    let (_p, stmt) = first_stmt("var c: Color = Red;");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::VariantCtor(ctor)) = v.value() else {
        panic!("expected variant constructor");
    };
    assert_eq!(ctor.name().unwrap().text(), "Red");
    assert_eq!(ctor.fields().count(), 0);

    let (_p2, stmt2) = first_stmt("var e: Event = Clicked { button: 1 };");
    let Stmt::VarDecl(v2) = stmt2 else { panic!() };
    let Some(Expr::VariantCtor(ctor2)) = v2.value() else {
        panic!("expected variant constructor");
    };
    assert_eq!(ctor2.fields().count(), 1);
}

#[test]
fn error_handling_expressions() {
    let (_p, stmt) = first_stmt("return ok check read();");
    let Stmt::Return(r) = stmt else { panic!() };
    let Some(Expr::Ok(ok)) = r.value() else {
        panic!("expected ok expression");
    };
    let Some(Expr::Check(check)) = ok.value() else {
        panic!("expected check inside ok");
    };
    assert!(matches!(check.inner(), Some(Expr::Call(_))));
}

#[test]
fn err_with_fields() {
    let (_p, stmt) = first_stmt("return err Denied { code: 2 };");
    let Stmt::Return(r) = stmt else { panic!() };
    let Some(Expr::Err(err)) = r.value() else {
        panic!("expected err expression");
    };
    let ctor = err.ctor().unwrap();
    assert_eq!(ctor.name().unwrap().text(), "Denied");
    assert_eq!(ctor.fields().count(), 1);
}

#[test]
fn ensure_expression() {
    let (_p, stmt) = first_stmt("ensure n > 0 else err Negative;");
    let Stmt::Expr(e) = stmt else { panic!() };
    let Some(Expr::Ensure(ensure)) = e.expr() else {
        panic!("expected ensure expression");
    };
    assert!(matches!(ensure.condition(), Some(Expr::Binary(_))));
    assert_eq!(
        ensure.err_expr().unwrap().ctor().unwrap().name().unwrap().text(),
        "Negative"
    );
}

#[test]
fn map_error_expression() {
    let (_p, stmt) = first_stmt("var r: i32 = check map_error fetch() using (e => Wrapped);");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::Check(check)) = v.value() else {
        panic!("expected check");
    };
    let Some(Expr::MapError(me)) = check.inner() else {
        panic!("expected map_error");
    };
    assert!(matches!(me.inner(), Some(Expr::Call(_))));
    let transform = me.transform().unwrap();
    assert_eq!(transform.arrow_param().unwrap().text(), "e");
    assert!(transform.arrow_body().is_some());
}

#[test]
fn unsafe_cast_expression() {
    let (_p, stmt) = first_stmt("var x: i64 = unsafe_cast<i64>(y);");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::UnsafeCast(cast)) = v.value() else {
        panic!("expected unsafe_cast");
    };
    assert!(cast.target_ty().is_some());
    assert!(matches!(cast.inner(), Some(Expr::NameRef(_))));
}

#[test]
fn anonymous_function_expression() {
    let (_p, stmt) = first_stmt("var f: Cmp = function (a: i32, b: i32) -> bool { return true; };");
    let Stmt::VarDecl(v) = stmt else { panic!() };
    let Some(Expr::AnonFn(f)) = v.value() else {
        panic!("expected anonymous function");
    };
    assert!(f.param_list().is_some());
    assert!(f.ret_type().is_some());
    assert!(f.body().is_some());
}

#[test]
fn unit_literal() {
    let (_p, stmt) = first_stmt("return ();");
    let Stmt::Return(r) = stmt else { panic!() };
    let Some(Expr::Literal(lit)) = r.value() else {
        panic!("expected literal");
    };
    assert_eq!(lit.kind(), LiteralKind::Unit);
}

// ── Statements ───────────────────────────────────────────────────────────

#[test]
fn statement_forms() {
    let source = "function f() -> () {\n\
         var r: Region = createRegion();\n\
         defer r.dispose();\n\
         if a { break; } else if b { continue; } else { return; }\n\
         while running { tick(); }\n\
         for x in items { consume(x); }\n\
         total = total + 1;\n\
         }";
    let result = parse_ok(source);
    let Item::FnDecl(f) = only_decl(&result) else { panic!() };
    let stmts: Vec<_> = f.body().unwrap().statements().collect();
    assert_eq!(stmts.len(), 6);
    assert!(matches!(stmts[0], Stmt::VarDecl(_)));
    assert!(matches!(stmts[1], Stmt::Defer(_)));
    assert!(matches!(stmts[2], Stmt::If(_)));
    assert!(matches!(stmts[3], Stmt::While(_)));
    assert!(matches!(stmts[4], Stmt::For(_)));
    assert!(matches!(stmts[5], Stmt::Assign(_)));

    let Stmt::If(if_stmt) = &stmts[2] else { panic!() };
    let else_branch = if_stmt.else_branch().unwrap();
    let nested = else_branch.if_stmt().unwrap();
    assert!(nested.else_branch().unwrap().block().is_some());
}

// ── Match ────────────────────────────────────────────────────────────────

#[test]
fn match_patterns() {
    let source = "function f() -> () {\n\
         match v {\n\
         _ -> 0;\n\
         42 -> 1;\n\
         name -> 2;\n\
         Red -> 3;\n\
         Denied { code } -> 4;\n\
         ok x -> 5;\n\
         err e -> 6;\n\
         Some y -> 7;\n\
         None -> 8;\n\
         }\n\
         }";
    let result = parse_ok(source);
    let Item::FnDecl(f) = only_decl(&result) else { panic!() };
    let Stmt::Expr(e) = f.body().unwrap().statements().next().unwrap() else {
        panic!()
    };
    let Some(Expr::Match(m)) = e.expr() else {
        panic!("expected match");
    };
    let arms: Vec<_> = m.arms().collect();
    assert_eq!(arms.len(), 9);

    let pats: Vec<Pattern> = arms.iter().map(|a| a.pattern().unwrap()).collect();
    assert!(matches!(pats[0], Pattern::Wildcard(_)));
    assert!(matches!(pats[1], Pattern::Literal(_)));
    assert!(matches!(pats[2], Pattern::Ident(_)));
    assert!(matches!(pats[3], Pattern::Variant(_)));
    let Pattern::Variant(denied) = &pats[4] else { panic!() };
    assert_eq!(denied.field_bindings().len(), 1);
    assert_eq!(denied.field_bindings()[0].text(), "code");
    let Pattern::Ok(okp) = &pats[5] else { panic!() };
    assert_eq!(okp.binding().unwrap().text(), "x");
    assert!(matches!(pats[6], Pattern::Err(_)));
    let Pattern::Some(somep) = &pats[7] else { panic!() };
    assert_eq!(somep.binding().unwrap().text(), "y");
    assert!(matches!(pats[8], Pattern::None(_)));

    for arm in &arms {
        assert!(arm.body().is_some());
    }
}

// ── Error policy ─────────────────────────────────────────────────────────

#[test]
fn first_error_ends_the_parse() {
    let result = parse("function f( -> () { }\nfunction g() -> () { }");
    assert!(!result.ok());
    assert_eq!(result.errors().len(), 1, "fail-fast: exactly one error");
}

#[test]
fn error_spans_are_in_bounds() {
    for source in [
        "function",
        "const x = ;",
        "type T = ;",
        "domain D;",
        "function f() -> () { match x { } ",
    ] {
        let result = parse(source);
        for err in result.errors() {
            assert!((err.span.end as usize) <= source.len().max(1));
        }
    }
}

#[test]
fn all_node_spans_within_input_bounds() {
    let source = "package app;\nfunction add(a: i32, b: i32) -> i32 { return a + b; }";
    let result = parse_ok(source);
    let root = result.syntax();
    assert_eq!(usize::from(root.text_range().end()), source.len());
    for node in root.descendants() {
        assert!(usize::from(node.text_range().end()) <= source.len());
    }
}
