//! Pattern parser for Ferrule match arms.
//!
//! Patterns: wildcard (`_`), literal, identifier (binding when lowercase,
//! variant when uppercase), variant with field bindings, and the
//! result/nullable forms `ok x`, `err e`, `Some x`, `None`.

use crate::syntax_kind::SyntaxKind;

use super::{items, MarkClosed, Parser};

/// Parse a pattern.
pub(crate) fn parse_pattern(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        // Wildcard: `_` (the lexer emits `_` as an Ident).
        SyntaxKind::IDENT if p.current_text() == "_" => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::WILDCARD_PAT))
        }

        // Result patterns: `ok` / `ok x`, `err` / `err e`.
        SyntaxKind::OK_KW => {
            let m = p.open();
            p.advance(); // ok
            eat_binding(p);
            Some(p.close(m, SyntaxKind::OK_PAT))
        }
        SyntaxKind::ERR_KW => {
            let m = p.open();
            p.advance(); // err
            eat_binding(p);
            Some(p.close(m, SyntaxKind::ERR_PAT))
        }

        // Literal patterns.
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::CHAR_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL_PAT))
        }

        // Negative number literal: `-42`.
        SyntaxKind::MINUS
            if matches!(p.nth(1), SyntaxKind::INT_LITERAL | SyntaxKind::FLOAT_LITERAL) =>
        {
            let m = p.open();
            p.advance(); // -
            p.advance(); // number
            Some(p.close(m, SyntaxKind::LITERAL_PAT))
        }

        SyntaxKind::IDENT => {
            let text = p.current_text();
            let uppercase = text.bytes().next().is_some_and(|b| b.is_ascii_uppercase());

            // Nullable patterns are spelled like variants but analyzed
            // separately.
            if text == "Some" {
                let m = p.open();
                p.advance(); // Some
                eat_binding(p);
                return Some(p.close(m, SyntaxKind::SOME_PAT));
            }
            if text == "None" {
                let m = p.open();
                p.advance(); // None
                return Some(p.close(m, SyntaxKind::NONE_PAT));
            }

            if uppercase {
                // Variant pattern, optionally with field bindings:
                // `Denied` or `Denied { code }`.
                let m = p.open();
                items::parse_name(p);
                if p.at(SyntaxKind::L_BRACE) {
                    parse_pat_field_list(p);
                }
                Some(p.close(m, SyntaxKind::VARIANT_PAT))
            } else {
                // Lowercase identifier: a binding.
                let m = p.open();
                p.advance();
                Some(p.close(m, SyntaxKind::IDENT_PAT))
            }
        }

        _ => {
            p.error("expected pattern");
            None
        }
    }
}

/// Consume an optional binding identifier after `ok`/`err`/`Some`.
/// `_` is accepted and means "match but don't bind".
fn eat_binding(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) {
        let m = p.open();
        p.advance();
        p.close(m, SyntaxKind::NAME);
    }
}

/// Parse `{ field, field }` bindings in a variant pattern.
fn parse_pat_field_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {

    if !p.at(SyntaxKind::R_BRACE) {
        parse_pat_field(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACE) {
                break; // trailing comma
            }
            parse_pat_field(p);
        }
    }

    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::PAT_FIELD_LIST);
}

fn parse_pat_field(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    p.close(m, SyntaxKind::PAT_FIELD);
}
