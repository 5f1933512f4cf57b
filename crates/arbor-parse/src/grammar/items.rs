use arbor_syntax::SyntaxKind;
use arbor_tokenizer::kinds::*;

use super::{initializer, separated, stmts};
use crate::parser::Parser;

pub(crate) fn source_file(p: &mut Parser<'_>) {
    let m = p.start();
    let items = p.start();
    while !p.at(EOF) {
        item(p);
    }
    items.complete(p, SyntaxKind::LIST);
    p.eof();
    m.complete(p, SOURCE_FILE);
}

fn item(p: &mut Parser<'_>) {
    match p.peek_kind() {
        CLASS_KW => class(p),
        FN_KW => function(p),
        _ => stmts::statement(p),
    }
}

fn class(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    p.expect(NAME, "expected a class name");
    p.expect(L_BRACE, "expected `{`");

    let members = p.start();
    while !p.at(R_BRACE) && !p.at(EOF) {
        member(p);
    }
    members.complete(p, SyntaxKind::LIST);

    p.expect(R_BRACE, "expected `}`");
    m.complete(p, CLASS_DECL);
}

fn member(p: &mut Parser<'_>) {
    match p.peek_kind() {
        CLASS_KW => class(p),
        FN_KW => function(p),
        VAR_KW => field(p),
        _ => p.error_recover("expected a member"),
    }
}

fn field(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    p.expect(NAME, "expected a field name");
    initializer(p);
    p.expect(SEMICOLON, "expected `;`");
    m.complete(p, FIELD_DECL);
}

fn function(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    p.expect(NAME, "expected a function name");
    param_list(p);
    stmts::block(p);
    m.complete(p, FN_DECL);
}

fn param_list(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect(L_PAREN, "expected `(`");
    separated(p, R_PAREN, param, |p| {
        let m = p.start();
        p.missing(NAME, Some("expected a parameter"));
        m.complete(p, PARAM);
    });
    p.expect(R_PAREN, "expected `)`");
    m.complete(p, PARAM_LIST);
}

fn param(p: &mut Parser<'_>) -> bool {
    if !p.at(NAME) {
        return false;
    }
    let m = p.start();
    p.advance();
    m.complete(p, PARAM);
    true
}
