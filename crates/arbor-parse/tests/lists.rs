use arbor_parse::kinds::*;
use arbor_parse::parse;
use arbor_syntax::list::{SeparatedSyntaxList, SyntaxList};
use arbor_syntax::{
    ParseOptions, SyntaxError, SyntaxKind, SyntaxNode, SyntaxNodeOrToken, SyntaxTree, TriviaKind,
};

fn tree(text: &str) -> SyntaxTree {
    parse(text, &ParseOptions::default())
}

#[track_caller]
fn nth(root: &SyntaxNode, kind: SyntaxKind, n: usize) -> SyntaxNode {
    root.descendants().filter(|node| node.kind() == kind).nth(n).unwrap()
}

fn params(root: &SyntaxNode) -> SeparatedSyntaxList {
    let list = nth(root, PARAM_LIST, 0);
    SeparatedSyntaxList::from_list_node(list.slot_node(1))
}

#[test]
fn separated_list_navigation() {
    let tree = tree("fn f(a, b, c,) {}");
    let params = params(tree.root());

    assert_eq!(params.len(), 3);
    assert_eq!(params.separator_count(), 3);
    assert!(params.has_trailing_separator());
    assert_eq!(params.get(1).unwrap().text(), "b");
    assert!(params.get(3).is_err());
    assert_eq!(params.separator(0).unwrap().kind(), COMMA);

    let names: Vec<String> = params.reverse().map(|param| param.text_trimmed()).collect();
    assert_eq!(names, ["c", "b", "a"]);

    let b = params.get(1).unwrap();
    assert_eq!(params.index_of(&b), Some(1));
    assert_eq!(params.index_of_kind(PARAM), Some(0));
}

#[test]
fn separated_list_edits_keep_separators() {
    let tree = tree("fn f(a, b) {} fn g(z) {}");
    let list = params(tree.root());
    let z = nth(tree.root(), PARAM, 2);

    assert_eq!(list.add(z.clone()).unwrap().text(), "a, b,z");
    assert_eq!(list.insert(0, z.clone()).unwrap().text(), "z,a, b");
    assert_eq!(list.remove_at(0).unwrap().text(), "b");
    assert_eq!(list.remove_at(1).unwrap().text(), "a");
    assert_eq!(list.text(), "a, b");

    let single = params(&nth(tree.root(), FN_DECL, 1));
    let a = list.get(0).unwrap();
    assert_eq!(single.add(a).unwrap().text(), "z, a");
}

fn arguments(root: &SyntaxNode) -> SeparatedSyntaxList {
    SeparatedSyntaxList::from_list_node(nth(root, ARG_LIST, 0).slot_node(1))
}

#[test]
fn separator_insertion_follows_line_breaks() {
    let other = tree("g(d);");
    let d = nth(other.root(), NAME_REF, 1);
    assert_eq!(d.text(), "d");

    let flat = tree("f(a,b,c);");
    assert_eq!(arguments(flat.root()).insert(1, d.clone()).unwrap().text(), "a,d,b,c");

    let broken = tree("f(a,\nb);");
    assert_eq!(arguments(broken.root()).insert(1, d).unwrap().text(), "a,\nd,b");
}

#[test]
fn replacing_a_non_member_differs_by_list_kind() {
    let tree = tree("f(a, b); var x = 1; var y = 2;");
    let args = arguments(tree.root());
    let y = nth(tree.root(), VAR_STMT, 1);
    let foreign = nth(tree.root(), LITERAL, 0);
    let a = args.get(0).unwrap();

    assert!(matches!(args.replace(&foreign, a.clone()), Err(SyntaxError::OutOfRange { .. })));
    assert!(matches!(args.remove(&foreign), Err(SyntaxError::Contract(_))));

    let statements = SyntaxList::<SyntaxNode>::from_list_node(tree.root().slot_node(0));
    assert!(matches!(statements.replace(&foreign, y.clone()), Err(SyntaxError::Contract(_))));
    assert!(matches!(
        statements.insert(0, None::<SyntaxNode>),
        Err(SyntaxError::NullArgument(_))
    ));
    assert_eq!(statements.replace(&y, a).unwrap().len(), 3);
}

#[test]
fn node_or_token_lists_reject_nothing_as_out_of_range() {
    let tree = tree("fn f(a, b, c) {}");
    let interleaved = params(tree.root()).get_with_separators();
    assert_eq!(interleaved.len(), 5);
    assert!(interleaved.get(1).unwrap().is_token());

    let err = interleaved.insert(0, None::<SyntaxNodeOrToken>).unwrap_err();
    assert!(matches!(err, SyntaxError::OutOfRange { .. }));

    let first = interleaved.first().unwrap();
    let grown = interleaved.add(first.clone()).unwrap();
    assert_eq!(grown.len(), 6);
    assert_eq!(grown.text(), "a, b, ca");
    assert_eq!(grown.remove_at(5).unwrap().text(), interleaved.text());

    let stray = SyntaxNodeOrToken::from(nth(tree.root(), BLOCK, 0));
    assert!(matches!(interleaved.remove(&stray), Err(SyntaxError::Contract(_))));
}

#[test]
fn insert_then_remove_restores_every_position() {
    let (call, var) = (tree("g(d);"), tree("var z = 0;\n"));
    let tree = tree("f(a,b,c);\nvar x = 1;\nvar y = 2;\n");
    let d = nth(call.root(), NAME_REF, 1);
    let z = nth(var.root(), VAR_STMT, 0);

    let args = arguments(tree.root());
    for index in 0..=args.len() {
        let inserted = args.insert(index, d.clone()).unwrap();
        assert_eq!(inserted.len(), 4);
        assert_eq!(inserted.get(index).unwrap().text(), "d");
        let restored = inserted.remove_at(index).unwrap();
        assert_eq!(restored.text(), args.text());
        assert_eq!(restored.separator_count(), args.separator_count());
    }

    let statements = SyntaxList::<SyntaxNode>::from_list_node(tree.root().slot_node(0));
    for index in 0..=statements.len() {
        let inserted = statements.insert(index, z.clone()).unwrap();
        assert_eq!(inserted.get(index).unwrap().text(), "var z = 0;\n");
        let restored = inserted.remove_at(index).unwrap();
        assert_eq!(restored.text(), statements.text());
        assert_eq!(restored.len(), statements.len());
    }
}

#[test]
fn separated_list_without_language_separator_fails() {
    let tree = tree("fn f(a) {}");
    let block = nth(tree.root(), BLOCK, 0);
    let blocks = SeparatedSyntaxList::<SyntaxNode>::empty().add(block.clone()).unwrap();
    assert_eq!(blocks.len(), 1);
    assert!(blocks.add(block).is_err());
}

#[test]
fn reverse_enumeration_of_a_wide_list() {
    let args = vec!["x"; 2000].join(", ");
    let tree = tree(&format!("f({args});"));
    let arg_list = nth(tree.root(), ARG_LIST, 0);
    let list = SeparatedSyntaxList::<SyntaxNode>::from_list_node(arg_list.slot_node(1));

    assert_eq!(list.len(), 2000);
    let reversed: Vec<SyntaxNode> = list.reverse().collect();
    assert_eq!(reversed.len(), 2000);
    assert_eq!(reversed[0].full_span(), list.get(1999).unwrap().full_span());
    assert_eq!(reversed[1999].full_span(), list.get(0).unwrap().full_span());
    assert!(reversed.windows(2).all(|pair| pair[0].offset() > pair[1].offset()));
}

#[test]
fn node_list_edits() {
    let tree = tree("var a = 1;\nvar b = 2;\n");
    let statements = SyntaxList::<SyntaxNode>::from_list_node(tree.root().slot_node(0));
    assert_eq!(statements.len(), 2);

    let second = statements.get(1).unwrap();
    let swapped = statements.remove(&second).unwrap().insert(0, second).unwrap();
    assert_eq!(swapped.text(), "var b = 2;\nvar a = 1;\n");

    let first = statements.first().unwrap();
    let tripled = statements.add_range([first.clone(), first]).unwrap();
    assert_eq!(tripled.len(), 4);
    assert!(tripled.any_kind(VAR_STMT));

    assert!(statements.insert(3, statements.get(0).unwrap()).is_err());
    assert!(SyntaxList::<SyntaxNode>::empty().is_empty());
}

#[test]
fn trivia_lists() {
    let tree = tree("var a = 1; // note\n");
    let semicolon = tree
        .root()
        .descendant_tokens()
        .find(|token| token.kind() == SEMICOLON)
        .unwrap();
    let trailing = semicolon.trailing_trivia();

    let kinds: Vec<TriviaKind> = trailing.iter().map(|trivia| trivia.kind()).collect();
    assert_eq!(
        kinds,
        [TriviaKind::Whitespace, TriviaKind::SingleLineComment, TriviaKind::EndOfLine]
    );
    assert_eq!(trailing.index_of_kind(TriviaKind::SingleLineComment), Some(1));
    assert_eq!(trailing.reverse().next().unwrap().kind(), TriviaKind::EndOfLine);

    let comment = trailing.get(1).unwrap();
    assert_eq!(comment.text(), "// note");
    assert_eq!(trailing.remove(&comment).unwrap().text(), " \n");
}
