//! Pratt expression parser and statement parser for Ferrule.
//!
//! Implements operator precedence parsing using binding power tables, in
//! the canonical Ferrule order (loosest to tightest): range, logical-or,
//! logical-and, equality, comparison, bitwise-or, bitwise-xor,
//! bitwise-and, shift, additive, multiplicative, unary, postfix.
//!
//! Also hosts block and statement parsing, since statements are mostly
//! expression-shaped (`expr;`, `lvalue = expr;`).

use crate::syntax_kind::SyntaxKind;

use super::{items, patterns, types, MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right means left-associative (every Ferrule binary operator).
/// Returns `None` if the token is not an infix operator.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        // Range: loosest expression precedence
        SyntaxKind::DOT_DOT | SyntaxKind::DOT_DOT_EQ => Some((3, 4)),

        // Logical
        SyntaxKind::PIPE_PIPE => Some((5, 6)),
        SyntaxKind::AMP_AMP => Some((7, 8)),

        // Equality and comparison
        SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ => Some((9, 10)),
        SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => {
            Some((11, 12))
        }

        // Bitwise, loosest to tightest: | ^ &
        SyntaxKind::PIPE => Some((13, 14)),
        SyntaxKind::CARET => Some((15, 16)),
        SyntaxKind::AMP => Some((17, 18)),

        // Shifts
        SyntaxKind::SHL | SyntaxKind::SHR => Some((19, 20)),

        // Additive (`++` is string concatenation)
        SyntaxKind::PLUS | SyntaxKind::MINUS | SyntaxKind::PLUS_PLUS => Some((21, 22)),

        // Multiplicative
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => Some((23, 24)),

        _ => None,
    }
}

/// Right binding power for prefix operators (`-`, `!`, `~` and the
/// keyword operators `ok`, `check`, `comptime`).
const PREFIX_BP: u8 = 27;

/// Postfix operations (call, field access, indexing) bind tighter than
/// all prefix and infix operators.
const POSTFIX_BP: u8 = 29;

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse an expression at the default (loosest) binding power.
pub(crate) fn expr(p: &mut Parser) {
    expr_bp(p, 0);
}

/// Parse an expression with the given minimum binding power.
///
/// The core Pratt loop: parse an atom or prefix expression (the LHS),
/// then consume postfix and infix operators as long as their binding
/// power exceeds `min_bp`.
fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        if p.has_error() {
            break;
        }

        let current = p.current();

        // ── Postfix: function call ──
        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            parse_arg_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        // ── Postfix: field access ──
        if current == SyntaxKind::DOT && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            continue;
        }

        // ── Postfix: index access ──
        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_BRACKET);
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }

            let m = p.open_before(lhs);
            p.advance(); // operator
            expr_bp(p, r_bp);

            let kind = if matches!(current, SyntaxKind::DOT_DOT | SyntaxKind::DOT_DOT_EQ) {
                SyntaxKind::RANGE_EXPR
            } else {
                SyntaxKind::BINARY_EXPR
            };
            lhs = p.close(m, kind);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

/// Parse the left-hand side of an expression: an atom, a prefix operator,
/// or one of the keyword-operator forms.
fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        // ── Symbolic prefix operators ──
        SyntaxKind::MINUS | SyntaxKind::BANG | SyntaxKind::TILDE => {
            let m = p.open();
            p.advance(); // operator
            expr_bp(p, PREFIX_BP);
            Some(p.close(m, SyntaxKind::UNARY_EXPR))
        }

        // ── Keyword prefix operators ──
        SyntaxKind::OK_KW => {
            let m = p.open();
            p.advance(); // ok
            expr_bp(p, PREFIX_BP);
            Some(p.close(m, SyntaxKind::OK_EXPR))
        }
        SyntaxKind::CHECK_KW => {
            let m = p.open();
            p.advance(); // check
            expr_bp(p, PREFIX_BP);
            Some(p.close(m, SyntaxKind::CHECK_EXPR))
        }
        SyntaxKind::COMPTIME_KW => {
            let m = p.open();
            p.advance(); // comptime
            expr_bp(p, PREFIX_BP);
            Some(p.close(m, SyntaxKind::COMPTIME_EXPR))
        }
        SyntaxKind::ERR_KW => Some(parse_err_expr(p)),
        SyntaxKind::ENSURE_KW => Some(parse_ensure_expr(p)),
        SyntaxKind::MAP_ERROR_KW => Some(parse_map_error_expr(p)),
        SyntaxKind::UNSAFE_CAST_KW => Some(parse_unsafe_cast_expr(p)),
        SyntaxKind::MATCH_KW => Some(parse_match_expr(p)),
        SyntaxKind::CONTEXT_KW => Some(parse_context_expr(p)),

        // Anonymous function: `function (params) -> T { ... }`
        SyntaxKind::FUNCTION_KW => Some(parse_anon_fn(p)),

        // ── Literals ──
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::BYTES_LITERAL
        | SyntaxKind::CHAR_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW
        | SyntaxKind::UNIT_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        // ── Identifier or variant constructor ──
        SyntaxKind::IDENT => {
            if is_uppercase_ident(p.current_text()) {
                Some(parse_variant_ctor(p))
            } else {
                let m = p.open();
                p.advance();
                Some(p.close(m, SyntaxKind::NAME_REF))
            }
        }

        // ── Grouping or the unit literal `()` ──
        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            if p.at(SyntaxKind::R_PAREN) {
                p.advance(); // )
                return Some(p.close(m, SyntaxKind::LITERAL));
            }
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_PAREN);
            Some(p.close(m, SyntaxKind::PAREN_EXPR))
        }

        // ── Array literal ──
        SyntaxKind::L_BRACKET => {
            let m = p.open();
            p.advance(); // [
            if !p.at(SyntaxKind::R_BRACKET) {
                expr_bp(p, 0);
                while p.eat(SyntaxKind::COMMA) {
                    if p.at(SyntaxKind::R_BRACKET) {
                        break; // trailing comma
                    }
                    expr_bp(p, 0);
                }
            }
            p.expect(SyntaxKind::R_BRACKET);
            Some(p.close(m, SyntaxKind::ARRAY_LITERAL))
        }

        // ── Record literal or block expression ──
        SyntaxKind::L_BRACE => {
            if at_record_literal(p) {
                Some(parse_record_literal(p))
            } else {
                Some(parse_block(p))
            }
        }

        _ => {
            p.error("expected expression");
            None
        }
    }
}

/// Whether an identifier's first byte is uppercase (variant-constructor
/// heuristic).
fn is_uppercase_ident(text: &str) -> bool {
    text.bytes().next().is_some_and(|b| b.is_ascii_uppercase())
}

/// Whether a `{` opens a record literal: lookahead one token; an
/// identifier immediately followed by `:` means record fields, anything
/// else means a block.
fn at_record_literal(p: &Parser) -> bool {
    p.nth(1) == SyntaxKind::IDENT && p.nth(2) == SyntaxKind::COLON
}

// ── Keyword-operator forms ─────────────────────────────────────────────

/// Parse `err Variant` or `err Variant { field: expr, ... }`.
fn parse_err_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // err
    if p.at(SyntaxKind::IDENT) {
        parse_variant_ctor_forced(p);
    } else {
        p.error("expected an error variant after `err`");
    }
    p.close(m, SyntaxKind::ERR_EXPR)
}

/// Parse `ensure cond else err Variant { ... }`.
///
/// The condition is a full expression; `else` terminates it (it is not
/// an operator, so the Pratt loop stops there naturally).
fn parse_ensure_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // ensure
    expr_bp(p, 0);
    p.expect(SyntaxKind::ELSE_KW);
    if p.at(SyntaxKind::ERR_KW) {
        parse_err_expr(p);
    } else {
        p.error("expected `err` after `else` in ensure expression");
    }
    p.close(m, SyntaxKind::ENSURE_EXPR)
}

/// Parse `map_error expr using (x => expr)`.
fn parse_map_error_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // map_error
    expr_bp(p, 0);
    p.expect(SyntaxKind::USING_KW);
    p.expect(SyntaxKind::L_PAREN);

    // The transform: a single-parameter arrow function.
    let f = p.open();
    items::parse_name(p);
    p.expect(SyntaxKind::FAT_ARROW);
    expr_bp(p, 0);
    p.close(f, SyntaxKind::ANON_FN_EXPR);

    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::MAP_ERROR_EXPR)
}

/// Parse `unsafe_cast<T>(expr)`.
fn parse_unsafe_cast_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // unsafe_cast
    p.expect(SyntaxKind::LT);
    types::parse_type(p);
    p.expect(SyntaxKind::GT);
    p.expect(SyntaxKind::L_PAREN);
    expr_bp(p, 0);
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::UNSAFE_CAST_EXPR)
}

/// Parse `match scrutinee { pattern -> expr; ... }`.
pub(crate) fn parse_match_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // match
    expr_bp(p, 0);

    let open_span = p.current_span();
    p.expect(SyntaxKind::L_BRACE);

    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let arm = p.open();
        patterns::parse_pattern(p);
        p.expect(SyntaxKind::ARROW);
        expr_bp(p, 0);
        p.close(arm, SyntaxKind::MATCH_ARM);

        // Arms are separated by `;` (or `,`); the separator after the
        // last arm is optional.
        if !p.eat(SyntaxKind::SEMICOLON) && !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }

    if !p.at(SyntaxKind::R_BRACE) && !p.has_error() {
        p.error_with_related(
            "expected `}` to close match expression",
            open_span,
            "match body started here",
        );
    } else {
        p.eat(SyntaxKind::R_BRACE);
    }
    p.close(m, SyntaxKind::MATCH_EXPR)
}

/// Parse `context { ... }` (α2 surface; analyzed as accept-and-ignore).
/// An optional label identifier is tolerated: `context gpu { ... }`.
fn parse_context_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // context
    p.eat(SyntaxKind::IDENT);
    parse_block(p);
    p.close(m, SyntaxKind::CONTEXT_EXPR)
}

/// Parse an anonymous function: `function (a: i32) -> i32 { ... }`.
fn parse_anon_fn(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // function
    items::parse_param_list(p);
    if p.at(SyntaxKind::ARROW) {
        let ret = p.open();
        p.advance(); // ->
        types::parse_type(p);
        p.close(ret, SyntaxKind::RET_TYPE);
    }
    parse_block(p);
    p.close(m, SyntaxKind::ANON_FN_EXPR)
}

/// Parse a variant constructor where the leading identifier is already
/// known to be uppercase: `Name` or `Name { field: expr, ... }`.
///
/// The `{` is taken as a field list only when the record-literal
/// lookahead confirms `ident:` inside; otherwise `Red { ... }` in
/// statement position would swallow a block.
fn parse_variant_ctor(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    items::parse_name(p);
    if p.at(SyntaxKind::L_BRACE) && at_record_literal(p) {
        parse_record_field_list(p);
    }
    p.close(m, SyntaxKind::VARIANT_CTOR)
}

/// Parse a variant constructor in `err` position, where a following `{`
/// is always a field list (there is no block ambiguity after `err V`).
fn parse_variant_ctor_forced(p: &mut Parser) {
    let m = p.open();
    items::parse_name(p);
    if p.at(SyntaxKind::L_BRACE) {
        parse_record_field_list(p);
    }
    p.close(m, SyntaxKind::VARIANT_CTOR);
}

/// Parse a record literal `{ x: 1, y: 2 }`.
fn parse_record_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    parse_record_field_list(p);
    p.close(m, SyntaxKind::RECORD_LITERAL)
}

/// Parse the braced `name: expr` list shared by record literals and
/// variant constructors.
fn parse_record_field_list(p: &mut Parser) {
    p.expect(SyntaxKind::L_BRACE);

    if !p.at(SyntaxKind::R_BRACE) && !p.has_error() {
        parse_record_field(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACE) {
                break; // trailing comma
            }
            parse_record_field(p);
        }
    }

    p.expect(SyntaxKind::R_BRACE);
}

fn parse_record_field(p: &mut Parser) {
    let m = p.open();
    items::parse_name(p);
    p.expect(SyntaxKind::COLON);
    expr_bp(p, 0);
    p.close(m, SyntaxKind::RECORD_FIELD);
}

// ── Argument List ──────────────────────────────────────────────────────

/// Parse an argument list: `(expr, expr, ...)`.
fn parse_arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (

    if !p.at(SyntaxKind::R_PAREN) {
        expr_bp(p, 0);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                break; // trailing comma
            }
            expr_bp(p, 0);
        }
    }

    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::ARG_LIST);
}

// ── Blocks and statements ──────────────────────────────────────────────

/// Parse a braced block of statements.
pub(crate) fn parse_block(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let open_span = p.current_span();
    p.expect(SyntaxKind::L_BRACE);

    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_stmt(p);
    }

    if p.at(SyntaxKind::R_BRACE) {
        p.advance();
    } else if !p.has_error() {
        p.error_with_related(
            "expected `}` to close block",
            open_span,
            "block started here",
        );
    }
    p.close(m, SyntaxKind::BLOCK)
}

/// Parse a single statement.
pub(crate) fn parse_stmt(p: &mut Parser) {
    match p.current() {
        SyntaxKind::VAR_KW => items::parse_var_decl(p),
        SyntaxKind::CONST_KW => items::parse_const_decl(p),

        SyntaxKind::RETURN_KW => {
            let m = p.open();
            p.advance(); // return
            if !p.at(SyntaxKind::SEMICOLON) {
                expr(p);
            }
            p.expect(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::RETURN_STMT);
        }

        SyntaxKind::DEFER_KW => {
            let m = p.open();
            p.advance(); // defer
            expr(p);
            p.expect(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::DEFER_STMT);
        }

        SyntaxKind::IF_KW => {
            parse_if_stmt(p);
        }

        SyntaxKind::WHILE_KW => {
            let m = p.open();
            p.advance(); // while
            expr(p);
            parse_block(p);
            p.close(m, SyntaxKind::WHILE_STMT);
        }

        SyntaxKind::FOR_KW => {
            let m = p.open();
            p.advance(); // for
            items::parse_name(p);
            p.expect(SyntaxKind::IN_KW);
            expr(p);
            parse_block(p);
            p.close(m, SyntaxKind::FOR_STMT);
        }

        SyntaxKind::BREAK_KW => {
            let m = p.open();
            p.advance();
            p.expect(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::BREAK_STMT);
        }

        SyntaxKind::CONTINUE_KW => {
            let m = p.open();
            p.advance();
            p.expect(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::CONTINUE_STMT);
        }

        // Brace-terminated expressions (match, context, bare blocks) are
        // statement-complete; the trailing `;` is optional.
        SyntaxKind::MATCH_KW => {
            let m = p.open();
            parse_match_expr(p);
            p.eat(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::EXPR_STMT);
        }
        SyntaxKind::CONTEXT_KW => {
            let m = p.open();
            parse_context_expr(p);
            p.eat(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::EXPR_STMT);
        }
        SyntaxKind::L_BRACE if !at_record_literal(p) => {
            let m = p.open();
            parse_block(p);
            p.eat(SyntaxKind::SEMICOLON);
            p.close(m, SyntaxKind::EXPR_STMT);
        }

        _ => parse_expr_or_assign_stmt(p),
    }
}

/// Parse `if cond { } else if ... else { }` as a statement.
fn parse_if_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // if
    expr(p);
    parse_block(p);

    if p.at(SyntaxKind::ELSE_KW) {
        let branch = p.open();
        p.advance(); // else
        if p.at(SyntaxKind::IF_KW) {
            parse_if_stmt(p);
        } else {
            parse_block(p);
        }
        p.close(branch, SyntaxKind::ELSE_BRANCH);
    }

    p.close(m, SyntaxKind::IF_STMT);
}

/// Parse an expression statement, upgrading to an assignment statement
/// when the expression is followed by `=`.
fn parse_expr_or_assign_stmt(p: &mut Parser) {
    let Some(lhs) = expr_bp(p, 0) else {
        return;
    };

    if p.at(SyntaxKind::EQ) {
        let m = p.open_before(lhs);
        p.advance(); // =
        expr(p);
        p.expect(SyntaxKind::SEMICOLON);
        p.close(m, SyntaxKind::ASSIGN_STMT);
    } else {
        let m = p.open_before(lhs);
        p.expect(SyntaxKind::SEMICOLON);
        p.close(m, SyntaxKind::EXPR_STMT);
    }
}
