use arbor_syntax::SyntaxKind;
use arbor_tokenizer::kinds::*;

use super::{exprs, initializer};
use crate::parser::Parser;

pub(crate) fn block(p: &mut Parser<'_>) {
    let m = p.start();
    if p.eat(L_BRACE) {
        let statements = p.start();
        while !p.at(R_BRACE) && !p.at(EOF) {
            statement(p);
        }
        statements.complete(p, SyntaxKind::LIST);
        p.expect(R_BRACE, "expected `}`");
    } else {
        p.missing(L_BRACE, Some("expected a block"));
        p.empty();
        p.missing(R_BRACE, None);
    }
    m.complete(p, BLOCK);
}

pub(crate) fn statement(p: &mut Parser<'_>) {
    match p.peek_kind() {
        VAR_KW => var_stmt(p),
        RETURN_KW => return_stmt(p),
        IF_KW => if_stmt(p),
        WHILE_KW => while_stmt(p),
        L_BRACE => block(p),
        SEMICOLON => {
            let m = p.start();
            p.advance();
            m.complete(p, EMPTY_STMT);
        }
        _ if p.at_set(&exprs::EXPR_FIRST) => {
            let m = p.start();
            exprs::expr_or_missing(p);
            p.expect(SEMICOLON, "expected `;`");
            m.complete(p, EXPR_STMT);
        }
        _ => p.error_recover("expected a statement"),
    }
}

/// The body of an `if`, `else` or `while`.
fn embedded(p: &mut Parser<'_>) {
    if p.at(R_BRACE) || p.at(EOF) {
        let m = p.start();
        p.missing(SEMICOLON, Some("expected a statement"));
        m.complete(p, EMPTY_STMT);
    } else {
        statement(p);
    }
}

fn var_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    p.expect(NAME, "expected a variable name");
    initializer(p);
    p.expect(SEMICOLON, "expected `;`");
    m.complete(p, VAR_STMT);
}

fn return_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    if !exprs::expr(p) {
        p.empty();
    }
    p.expect(SEMICOLON, "expected `;`");
    m.complete(p, RETURN_STMT);
}

fn condition(p: &mut Parser<'_>) {
    p.expect(L_PAREN, "expected `(`");
    exprs::expr_or_missing(p);
    p.expect(R_PAREN, "expected `)`");
}

fn if_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    condition(p);
    embedded(p);
    if p.at(ELSE_KW) {
        let clause = p.start();
        p.advance();
        embedded(p);
        clause.complete(p, ELSE_CLAUSE);
    } else {
        p.empty();
    }
    m.complete(p, IF_STMT);
}

fn while_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    condition(p);
    embedded(p);
    m.complete(p, WHILE_STMT);
}
