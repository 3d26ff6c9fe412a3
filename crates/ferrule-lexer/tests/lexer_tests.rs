use ferrule_lexer::Lexer;
use insta::assert_snapshot;

/// Render a token stream as a single line of token kind names.
///
/// Keeps snapshot assertions compact and readable; span accuracy is
/// covered separately by the positional tests below.
fn kinds(source: &str) -> String {
    Lexer::tokenize(source)
        .into_iter()
        .map(|tok| format!("{:?}", tok.kind))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Keywords and identifiers ─────────────────────────────────────────────

#[test]
fn keywords_and_identifiers() {
    assert_snapshot!(
        kinds("function add const x var y"),
        @"Function Ident Const Ident Var Ident Eof"
    );
}

#[test]
fn error_handling_keywords() {
    assert_snapshot!(
        kinds("ok err check ensure map_error"),
        @"Ok Err Check Ensure MapError Eof"
    );
}

#[test]
fn keywords_are_case_sensitive() {
    assert_snapshot!(kinds("Match match"), @"Ident Match Eof");
}

#[test]
fn underscore_is_an_identifier() {
    assert_snapshot!(kinds("_ _x x_1"), @"Ident Ident Ident Eof");
}

// ── Operators ────────────────────────────────────────────────────────────

#[test]
fn arithmetic_operators() {
    assert_snapshot!(
        kinds("+ - * / % ++"),
        @"Plus Minus Star Slash Percent PlusPlus Eof"
    );
}

#[test]
fn comparison_and_logic_operators() {
    assert_snapshot!(
        kinds("== != < > <= >= && ||"),
        @"EqEq NotEq Lt Gt LtEq GtEq AmpAmp PipePipe Eof"
    );
}

#[test]
fn bitwise_and_shift_operators() {
    assert_snapshot!(
        kinds("& | ^ ~ << >>"),
        @"Amp Pipe Caret Tilde Shl Shr Eof"
    );
}

#[test]
fn arrows_and_ranges() {
    assert_snapshot!(
        kinds("-> => .. ..="),
        @"Arrow FatArrow DotDot DotDotEq Eof"
    );
}

#[test]
fn punctuation() {
    assert_snapshot!(
        kinds("( ) { } [ ] , ; : . @ # ? ="),
        @"LParen RParen LBrace RBrace LBracket RBracket Comma Semicolon Colon Dot At Hash Question Eq Eof"
    );
}

// ── Literals ─────────────────────────────────────────────────────────────

#[test]
fn number_literals() {
    assert_snapshot!(
        kinds("0 42 3.14"),
        @"IntLiteral IntLiteral FloatLiteral Eof"
    );
}

#[test]
fn string_bytes_and_char_literals() {
    assert_snapshot!(
        kinds(r#""hello" b"\x00" 'c' '\n'"#),
        @"StringLiteral BytesLiteral CharLiteral CharLiteral Eof"
    );
}

#[test]
fn keyword_literals() {
    assert_snapshot!(kinds("true false null unit"), @"True False Null Unit Eof");
}

#[test]
fn unterminated_string_is_invalid() {
    assert_snapshot!(kinds(r#""oops"#), @"Invalid Eof");
}

#[test]
fn unterminated_char_is_invalid() {
    assert_snapshot!(kinds("'x"), @"Invalid Eof");
}

// ── Comments ─────────────────────────────────────────────────────────────

#[test]
fn line_comments_are_skipped() {
    assert_snapshot!(
        kinds("var x // trailing comment\nvar y"),
        @"Var Ident Var Ident Eof"
    );
}

#[test]
fn block_comments_are_skipped() {
    assert_snapshot!(kinds("a /* b c */ d"), @"Ident Ident Eof");
}

#[test]
fn division_is_not_a_comment() {
    assert_snapshot!(kinds("a / b"), @"Ident Slash Ident Eof");
}

// ── Whole declarations ───────────────────────────────────────────────────

#[test]
fn function_signature() {
    assert_snapshot!(
        kinds("function add(a: i32, b: i32) -> i32 { return a + b; }"),
        @"Function Ident LParen Ident Colon Ident Comma Ident Colon Ident RParen Arrow Ident LBrace Return Ident Plus Ident Semicolon RBrace Eof"
    );
}

#[test]
fn domain_declaration() {
    assert_snapshot!(
        kinds("domain IoError = NotFound | Denied { code: i64 };"),
        @"Domain Ident Eq Ident Pipe Ident LBrace Ident Colon Ident RBrace Semicolon Eof"
    );
}

#[test]
fn effects_clause() {
    assert_snapshot!(
        kinds("function f(cap fs: Fs) -> () effects [fs] { }"),
        @"Function Ident LParen Cap Ident Colon Ident RParen Arrow LParen RParen Effects LBracket Ident RBracket LBrace RBrace Eof"
    );
}

// ── Spans ────────────────────────────────────────────────────────────────

#[test]
fn spans_are_byte_accurate() {
    let tokens = Lexer::tokenize("var x = 10;");
    let spans: Vec<(u32, u32)> = tokens.iter().map(|t| (t.span.start, t.span.end)).collect();
    assert_eq!(spans, vec![(0, 3), (4, 5), (6, 7), (8, 10), (10, 11), (11, 11)]);
}

#[test]
fn all_spans_within_bounds() {
    let source = "package app;\nfunction f() -> () { }\n$ @ #";
    for tok in Lexer::tokenize(source) {
        assert!(tok.span.start <= tok.span.end);
        assert!((tok.span.end as usize) <= source.len());
    }
}

#[test]
fn every_stream_ends_in_eof() {
    for source in ["", "x", "\"unterminated", "/* open", "\u{00E9}\u{00E9}", "'"] {
        let tokens = Lexer::tokenize(source);
        assert_eq!(
            format!("{:?}", tokens.last().unwrap().kind),
            "Eof",
            "stream for {source:?} must end in Eof"
        );
    }
}
