use arbor_syntax::SyntaxKind;
use arbor_tokenizer::kinds::*;

use crate::parser::Parser;

pub(crate) mod exprs;
pub(crate) mod items;
pub(crate) mod stmts;

/// Parses a separated list up to `ket`, leaving `ket` unconsumed.
///
/// A separator with nothing before it gets a missing element.
pub(crate) fn separated(
    p: &mut Parser<'_>,
    ket: SyntaxKind,
    mut element: impl FnMut(&mut Parser<'_>) -> bool,
    mut missing: impl FnMut(&mut Parser<'_>),
) {
    let list = p.start();
    while !p.at(ket) && !p.at(EOF) {
        if p.at(COMMA) {
            missing(p);
        } else if !element(p) {
            break;
        }

        if !p.eat(COMMA) {
            break;
        }
    }
    list.complete(p, SyntaxKind::SEPARATED_LIST);
}

/// `= expr`, or two empty slots.
pub(crate) fn initializer(p: &mut Parser<'_>) {
    if p.eat(EQ) {
        exprs::expr_or_missing(p);
    } else {
        p.empty();
        p.empty();
    }
}
