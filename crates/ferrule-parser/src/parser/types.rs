//! Type expression parser for Ferrule.
//!
//! Type expressions are distinct from value expressions: simple names
//! (`i32`, `Color`, `Fs`), generic applications (`Array<i32, 8>`,
//! `View<mut u8>`), record literal types (`{ x: i32 }`), union literal
//! types (`| A | B { f: T }`), nullable sugar (`T?`), and the unit type
//! (`()` or `unit`).

use crate::syntax_kind::SyntaxKind;

use super::{items, Parser};

/// Parse a type expression, including any trailing `?` nullable sugar.
pub(crate) fn parse_type(p: &mut Parser) {
    let Some(mut lhs) = parse_type_primary(p) else {
        return;
    };

    // `?` binds tighter than anything around a type position, and can
    // stack: `i32??` is Nullable(Nullable(i32)).
    while p.at(SyntaxKind::QUESTION) {
        let m = p.open_before(lhs);
        p.advance(); // ?
        lhs = p.close(m, SyntaxKind::NULLABLE_TYPE);
    }
}

/// Parse a type without nullable sugar.
fn parse_type_primary(p: &mut Parser) -> Option<super::MarkClosed> {
    match p.current() {
        // Unit type: `()` or the `unit` keyword.
        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            p.expect(SyntaxKind::R_PAREN);
            Some(p.close(m, SyntaxKind::UNIT_TYPE))
        }
        SyntaxKind::UNIT_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::UNIT_TYPE))
        }

        // Record literal type: `{ x: i32, y: i32 }`
        SyntaxKind::L_BRACE => {
            let m = p.open();
            items::parse_variant_field_list(p);
            Some(p.close(m, SyntaxKind::RECORD_TYPE))
        }

        // Union literal type: `| A | B { f: T }`
        SyntaxKind::PIPE => {
            let m = p.open();
            while p.eat(SyntaxKind::PIPE) {
                items::parse_variant_def(p);
                if p.has_error() {
                    break;
                }
            }
            Some(p.close(m, SyntaxKind::UNION_TYPE))
        }

        // Named type, possibly generic.
        SyntaxKind::IDENT => {
            if p.nth(1) == SyntaxKind::LT {
                let m = p.open();
                items::parse_name(p);
                parse_type_arg_list(p);
                Some(p.close(m, SyntaxKind::GENERIC_TYPE))
            } else {
                let m = p.open();
                p.advance(); // ident
                Some(p.close(m, SyntaxKind::SIMPLE_TYPE))
            }
        }

        _ => {
            p.error("expected a type");
            None
        }
    }
}

/// Parse `<T, 8, mut u8>`.
///
/// A type argument is a type expression, a const-generic integer (as in
/// `Array<i32, 8>`), or a `mut`-prefixed element type (as in
/// `View<mut u8>`; `mut` is a contextual marker, lexed as an identifier).
fn parse_type_arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <

    if !p.at(SyntaxKind::GT) && !p.has_error() {
        parse_type_arg(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::GT) {
                break;
            }
            parse_type_arg(p);
        }
    }

    p.expect(SyntaxKind::GT);
    p.close(m, SyntaxKind::TYPE_ARG_LIST);
}

fn parse_type_arg(p: &mut Parser) {
    let m = p.open();
    match p.current() {
        SyntaxKind::INT_LITERAL => {
            p.advance();
        }
        SyntaxKind::IDENT if p.current_text() == "mut" => {
            p.advance(); // mut
            parse_type(p);
        }
        _ => {
            parse_type(p);
        }
    }
    p.close(m, SyntaxKind::TYPE_ARG);
}
