use arbor_syntax::{SyntaxKind, SyntaxSet};
use arbor_tokenizer::kinds::*;

use super::separated;
use crate::parser::{CompletedMarker, Parser};

pub(crate) const EXPR_FIRST: SyntaxSet =
    SyntaxSet::new([NAME, INT_NUMBER, STRING, TRUE_KW, FALSE_KW, L_PAREN, MINUS, BANG]);

const LITERAL_FIRST: SyntaxSet = SyntaxSet::new([INT_NUMBER, STRING, TRUE_KW, FALSE_KW]);

const PREFIX_BINDING_POWER: u8 = 11;

/// Parses an expression if one starts here.
pub(crate) fn expr(p: &mut Parser<'_>) -> bool {
    expr_bp(p, 0).is_some()
}

pub(crate) fn expr_or_missing(p: &mut Parser<'_>) {
    if !expr(p) {
        missing_expr(p);
    }
}

pub(crate) fn missing_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.missing(NAME, Some("expected an expression"));
    m.complete(p, NAME_REF);
}

fn infix_binding_power(kind: SyntaxKind) -> Option<(u8, u8)> {
    Some(match kind {
        EQ => (2, 1),
        EQ2 | NEQ => (3, 4),
        LT | GT => (5, 6),
        PLUS | MINUS => (7, 8),
        STAR | SLASH => (9, 10),
        _ => return None,
    })
}

fn expr_bp(p: &mut Parser<'_>, min_bp: u8) -> Option<CompletedMarker> {
    let mut lhs = match p.peek_kind() {
        MINUS | BANG => {
            let m = p.start();
            p.advance();
            if expr_bp(p, PREFIX_BINDING_POWER).is_none() {
                missing_expr(p);
            }
            m.complete(p, PREFIX_EXPR)
        }
        _ => primary(p)?,
    };

    while let Some((left, right)) = infix_binding_power(p.peek_kind()) {
        if left < min_bp {
            break;
        }
        let m = lhs.precede(p);
        p.advance();
        if expr_bp(p, right).is_none() {
            missing_expr(p);
        }
        lhs = m.complete(p, BINARY_EXPR);
    }

    Some(lhs)
}

fn primary(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let mut lhs = match p.peek_kind() {
        NAME => {
            let m = p.start();
            p.advance();
            m.complete(p, NAME_REF)
        }
        L_PAREN => {
            let m = p.start();
            p.advance();
            expr_or_missing(p);
            p.expect(R_PAREN, "expected `)`");
            m.complete(p, PAREN_EXPR)
        }
        _ if p.at_set(&LITERAL_FIRST) => {
            let m = p.start();
            p.advance();
            m.complete(p, LITERAL)
        }
        _ => return None,
    };

    loop {
        lhs = match p.peek_kind() {
            L_PAREN => {
                let m = lhs.precede(p);
                arg_list(p);
                m.complete(p, CALL_EXPR)
            }
            DOT => {
                let m = lhs.precede(p);
                p.advance();
                p.expect(NAME, "expected a field name");
                m.complete(p, FIELD_EXPR)
            }
            _ => return Some(lhs),
        };
    }
}

fn arg_list(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    separated(p, R_PAREN, expr, missing_expr);
    p.expect(R_PAREN, "expected `)`");
    m.complete(p, ARG_LIST);
}
