//! Declaration parser for Ferrule.
//!
//! Covers the module header (package declaration, imports) and every
//! top-level declaration: functions, type declarations, error types,
//! error domains, constants, and `use error`.

use crate::syntax_kind::SyntaxKind;

use super::{expressions, types, Parser};

// ── Module header ──────────────────────────────────────────────────────

/// Parse `package a.b.c;`.
pub(crate) fn parse_package_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // package
    parse_dotted_name(p);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::PACKAGE_DECL);
}

/// Parse a dotted name: `a.b.c`.
///
/// Keywords are tolerated as segments (`package app.match;` is legal);
/// this is the only place the grammar accepts a keyword where a name is
/// expected.
pub(crate) fn parse_dotted_name(p: &mut Parser) {
    let m = p.open();
    if !eat_name_segment(p) {
        p.error("expected a package name segment");
        p.close(m, SyntaxKind::DOTTED_NAME);
        return;
    }
    while p.at(SyntaxKind::DOT) {
        p.advance(); // .
        if !eat_name_segment(p) {
            p.error("expected a name segment after `.`");
            break;
        }
    }
    p.close(m, SyntaxKind::DOTTED_NAME);
}

/// Consume one identifier-or-keyword segment. Returns false at anything
/// that cannot be a segment.
fn eat_name_segment(p: &mut Parser) -> bool {
    let kind = p.current();
    if kind == SyntaxKind::IDENT || (kind >= SyntaxKind::AS_KW && kind <= SyntaxKind::WITH_KW) {
        p.advance();
        true
    } else {
        false
    }
}

/// Parse `import a.b { x, y as z } using capability C;`.
pub(crate) fn parse_import_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // import
    parse_dotted_name(p);

    if p.at(SyntaxKind::L_BRACE) {
        parse_import_list(p);
    }

    if p.at(SyntaxKind::USING_KW) {
        let clause = p.open();
        p.advance(); // using
        p.expect(SyntaxKind::CAPABILITY_KW);
        p.expect(SyntaxKind::IDENT);
        p.close(clause, SyntaxKind::CAPABILITY_CLAUSE);
    }

    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::IMPORT_DECL);
}

/// Parse the braced list of imported names.
fn parse_import_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {

    if !p.at(SyntaxKind::R_BRACE) {
        parse_import_item(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACE) {
                break; // trailing comma
            }
            parse_import_item(p);
        }
    }

    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::IMPORT_LIST);
}

/// Parse `name` or `name as alias` inside an import list.
fn parse_import_item(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    if p.eat(SyntaxKind::AS_KW) {
        p.expect(SyntaxKind::IDENT);
    }
    p.close(m, SyntaxKind::IMPORT_ITEM);
}

// ── Top-level declarations ─────────────────────────────────────────────

/// Parse a single top-level declaration, dispatching on the leading token.
pub(crate) fn parse_top_decl(p: &mut Parser) {
    match p.current() {
        SyntaxKind::PUB_KW => match p.nth(1) {
            SyntaxKind::FUNCTION_KW => parse_fn_decl(p),
            SyntaxKind::TYPE_KW => parse_type_decl(p),
            SyntaxKind::CONST_KW => parse_const_decl(p),
            _ => {
                p.error("expected `function`, `type`, or `const` after `pub`");
            }
        },
        SyntaxKind::FUNCTION_KW => parse_fn_decl(p),
        SyntaxKind::TYPE_KW => parse_type_decl(p),
        SyntaxKind::ERROR_KW => parse_error_decl(p),
        SyntaxKind::DOMAIN_KW => parse_domain_decl(p),
        SyntaxKind::CONST_KW => parse_const_decl(p),
        SyntaxKind::USE_KW => parse_use_error_decl(p),
        SyntaxKind::IMPORT_KW => {
            p.error("imports must appear before declarations");
        }
        _ => {
            p.error("expected a declaration");
        }
    }
}

/// Parse a function declaration:
/// `function name<T>(a: i32, cap fs: Fs) -> i32 error D effects [io] { ... }`
pub(crate) fn parse_fn_decl(p: &mut Parser) {
    let m = p.open();
    p.eat(SyntaxKind::PUB_KW);
    p.advance(); // function

    parse_name(p);

    if p.at(SyntaxKind::LT) {
        parse_type_param_list(p);
    }

    parse_param_list(p);

    // Return type is mandatory.
    let ret = p.open();
    p.expect(SyntaxKind::ARROW);
    types::parse_type(p);
    p.close(ret, SyntaxKind::RET_TYPE);

    if p.at(SyntaxKind::ERROR_KW) {
        let clause = p.open();
        p.advance(); // error
        p.expect(SyntaxKind::IDENT);
        p.close(clause, SyntaxKind::ERROR_CLAUSE);
    }

    if p.at(SyntaxKind::EFFECTS_KW) {
        parse_effects_clause(p);
    }

    expressions::parse_block(p);
    p.close(m, SyntaxKind::FN_DECL);
}

/// Parse a definition-position name into a NAME node.
pub(crate) fn parse_name(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    p.close(m, SyntaxKind::NAME);
}

/// Parse `<T, U>`.
fn parse_type_param_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <

    if !p.at(SyntaxKind::GT) {
        parse_type_param(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::GT) {
                break;
            }
            parse_type_param(p);
        }
    }

    p.expect(SyntaxKind::GT);
    p.close(m, SyntaxKind::TYPE_PARAM_LIST);
}

fn parse_type_param(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    p.close(m, SyntaxKind::TYPE_PARAM);
}

/// Parse `(a: i32, inout b: View<mut u8>, cap fs: Fs)`.
pub(crate) fn parse_param_list(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_PAREN);

    if !p.at(SyntaxKind::R_PAREN) && !p.has_error() {
        parse_param(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                break; // trailing comma
            }
            parse_param(p);
        }
    }

    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::PARAM_LIST);
}

/// Parse one parameter: `[inout|cap] name: Type`.
fn parse_param(p: &mut Parser) {
    let m = p.open();
    if !p.eat(SyntaxKind::INOUT_KW) {
        p.eat(SyntaxKind::CAP_KW);
    }
    parse_name(p);
    p.expect(SyntaxKind::COLON);
    types::parse_type(p);
    p.close(m, SyntaxKind::PARAM);
}

/// Parse `effects [fs, io]`.
fn parse_effects_clause(p: &mut Parser) {
    let m = p.open();
    p.advance(); // effects
    p.expect(SyntaxKind::L_BRACKET);

    if !p.at(SyntaxKind::R_BRACKET) && !p.has_error() {
        p.expect(SyntaxKind::IDENT);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACKET) {
                break;
            }
            p.expect(SyntaxKind::IDENT);
        }
    }

    p.expect(SyntaxKind::R_BRACKET);
    p.close(m, SyntaxKind::EFFECTS_CLAUSE);
}

/// Parse a type declaration: `type Name<T> = <type>;`.
///
/// The right-hand side may be a union (`| A | B`), a record
/// (`{ x: i32 }`), or any other type expression (alias form).
pub(crate) fn parse_type_decl(p: &mut Parser) {
    let m = p.open();
    p.eat(SyntaxKind::PUB_KW);
    p.advance(); // type

    parse_name(p);

    if p.at(SyntaxKind::LT) {
        parse_type_param_list(p);
    }

    p.expect(SyntaxKind::EQ);
    types::parse_type(p);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::TYPE_DECL);
}

/// Parse an error type declaration: `error Name { code: i64 };`.
///
/// The field list is optional: `error Timeout;` declares a fieldless
/// error type.
pub(crate) fn parse_error_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // error

    parse_name(p);

    if p.at(SyntaxKind::L_BRACE) {
        parse_variant_field_list(p);
    }

    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::ERROR_DECL);
}

/// Parse a domain declaration, in either form:
///
/// - union form: `domain Io = NotFound | Denied { code: i64 };`
/// - inline form: `domain Io { NotFound, Denied { code: i64 } }`
pub(crate) fn parse_domain_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // domain

    parse_name(p);

    if p.eat(SyntaxKind::EQ) {
        // Union form. A leading `|` is allowed.
        p.eat(SyntaxKind::PIPE);
        parse_variant_def(p);
        while p.eat(SyntaxKind::PIPE) {
            parse_variant_def(p);
        }
        p.expect(SyntaxKind::SEMICOLON);
    } else if p.at(SyntaxKind::L_BRACE) {
        // Inline form.
        p.advance(); // {
        if !p.at(SyntaxKind::R_BRACE) {
            parse_variant_def(p);
            while p.eat(SyntaxKind::COMMA) {
                if p.at(SyntaxKind::R_BRACE) {
                    break;
                }
                parse_variant_def(p);
            }
        }
        p.expect(SyntaxKind::R_BRACE);
        p.eat(SyntaxKind::SEMICOLON);
    } else {
        p.error("expected `=` or `{` in domain declaration");
    }

    p.close(m, SyntaxKind::DOMAIN_DECL);
}

/// Parse one variant: `Name` or `Name { field: Type, ... }`.
pub(crate) fn parse_variant_def(p: &mut Parser) {
    let m = p.open();
    parse_name(p);
    if p.at(SyntaxKind::L_BRACE) {
        parse_variant_field_list(p);
    }
    p.close(m, SyntaxKind::VARIANT_DEF);
}

/// Parse `{ field: Type, ... }`.
pub(crate) fn parse_variant_field_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {

    if !p.at(SyntaxKind::R_BRACE) {
        parse_variant_field(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACE) {
                break;
            }
            parse_variant_field(p);
        }
    }

    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::VARIANT_FIELD_LIST);
}

fn parse_variant_field(p: &mut Parser) {
    let m = p.open();
    parse_name(p);
    p.expect(SyntaxKind::COLON);
    types::parse_type(p);
    p.close(m, SyntaxKind::VARIANT_FIELD);
}

/// Parse `const x: i32 = 1;`. The annotation is optional syntactically;
/// the checker rejects unannotated numeric literals.
pub(crate) fn parse_const_decl(p: &mut Parser) {
    let m = p.open();
    p.eat(SyntaxKind::PUB_KW);
    p.advance(); // const

    parse_name(p);

    if p.eat(SyntaxKind::COLON) {
        types::parse_type(p);
    }

    p.expect(SyntaxKind::EQ);
    expressions::expr(p);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::CONST_DECL);
}

/// Parse `var x: i32 = 1;`.
pub(crate) fn parse_var_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // var

    parse_name(p);

    if p.eat(SyntaxKind::COLON) {
        types::parse_type(p);
    }

    p.expect(SyntaxKind::EQ);
    expressions::expr(p);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::VAR_DECL);
}

/// Parse `use error E;`.
pub(crate) fn parse_use_error_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // use
    p.expect(SyntaxKind::ERROR_KW);
    p.expect(SyntaxKind::IDENT);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::USE_ERROR_DECL);
}
