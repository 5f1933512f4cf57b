use arbor_parse::kinds::*;
use arbor_parse::parse;
use arbor_syntax::visit::{SyntaxRewriter, SyntaxWalker, WalkDepth, walk, walk_token};
use arbor_syntax::{
    GreenNode, GreenToken, GreenTrivia, ParseOptions, RemoveOptions, SyntaxKind, SyntaxNode,
    SyntaxResult, SyntaxToken, SyntaxTree, SyntaxTrivia, TriviaKind,
};

fn tree(text: &str) -> SyntaxTree {
    parse(text, &ParseOptions::default())
}

#[track_caller]
fn nth(root: &SyntaxNode, kind: SyntaxKind, n: usize) -> SyntaxNode {
    root.descendants().filter(|node| node.kind() == kind).nth(n).unwrap()
}

fn renamed(token: &SyntaxToken, text: &str) -> SyntaxToken {
    let green = token.green();
    let new = GreenToken::new(token.kind(), text)
        .with_trivia(green.leading().clone(), green.trailing().clone());
    SyntaxToken::detached(new)
}

#[test]
fn replace_tokens_renames_everywhere() {
    let tree = tree("var a = a + b;\n");
    let targets: Vec<SyntaxToken> = tree
        .root()
        .descendant_tokens()
        .filter(|token| token.kind() == NAME && token.text() == "a")
        .collect();
    assert_eq!(targets.len(), 2);

    let new = tree.root().replace_tokens(targets, |_, token| renamed(&token, "value")).unwrap();
    assert_eq!(new.text(), "var value = value + b;\n");
    assert_eq!(tree.text(), "var a = a + b;\n");
    assert!(new.is_root());
}

#[test]
fn replace_node_keeps_untouched_subtrees() {
    let tree = tree("fn f() { return 1; }\nfn g() { return 2; }\n");
    let one = nth(tree.root(), LITERAL, 0);
    let other = parse("x * y;", &ParseOptions::default());
    let product = nth(other.root(), BINARY_EXPR, 0);

    let new = tree.root().replace_node(&one, &product).unwrap();
    assert_eq!(new.text(), "fn f() { return x * y; }\nfn g() { return 2; }\n");

    let old_g = nth(tree.root(), FN_DECL, 1);
    let new_g = nth(&new, FN_DECL, 1);
    assert!(old_g.green().ptr_eq(new_g.green()));
}

#[test]
fn insert_and_replace_many_in_lists() {
    let tree = tree("var a = 1;\nvar c = 3;\n");
    let c = nth(tree.root(), VAR_STMT, 1);
    let b = nth(parse("var b = 2;\n", &ParseOptions::default()).root(), VAR_STMT, 0);

    let inserted = tree.root().insert_nodes_before(&c, [b.clone()]).unwrap();
    assert_eq!(inserted.text(), "var a = 1;\nvar b = 2;\nvar c = 3;\n");

    let appended = tree.root().insert_nodes_after(&c, [b.clone(), b]).unwrap();
    assert_eq!(appended.text(), "var a = 1;\nvar c = 3;\nvar b = 2;\nvar b = 2;\n");

    let dropped = tree.root().replace_node_with_many(&c, []).unwrap();
    assert_eq!(dropped.text(), "var a = 1;\n");
}

#[test]
fn inserting_next_to_a_plain_slot_is_an_error() {
    let tree = tree("return 1;");
    let literal = nth(tree.root(), LITERAL, 0);
    assert!(tree.root().insert_nodes_before(&literal, [literal.clone()]).is_err());
}

#[test]
fn remove_statement_without_trivia() {
    let tree = tree("var a = 1;\nvar b = 2;\nvar c = 3;\n");
    let b = nth(tree.root(), VAR_STMT, 1);
    let removed = tree.root().remove_node(&b, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(removed.text(), "var a = 1;\nvar c = 3;\n");
}

#[test]
fn remove_statement_keeping_exterior_trivia() {
    let tree = tree("var a = 1;\n    var b = 2; // two\nvar c = 3;\n");
    let b = nth(tree.root(), VAR_STMT, 1);
    let removed =
        tree.root().remove_node(&b, RemoveOptions::KEEP_EXTERIOR_TRIVIA).unwrap().unwrap();
    assert_eq!(removed.text(), "var a = 1;\n     // two\nvar c = 3;\n");
}

#[test]
fn remove_parameters_with_their_separators() {
    let tree = tree("fn f(a, b, c) {}");
    let remove = |n: usize| {
        let param = nth(tree.root(), PARAM, n);
        tree.root().remove_node(&param, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap().text()
    };
    assert_eq!(remove(0), "fn f(b, c) {}");
    assert_eq!(remove(1), "fn f(a, c) {}");
    assert_eq!(remove(2), "fn f(a, b) {}");
}

#[test]
fn removing_the_root_yields_nothing() {
    let tree = tree("var a = 1;");
    let root = tree.root().clone();
    assert!(root.remove_node(&root, RemoveOptions::KEEP_NO_TRIVIA).unwrap().is_none());

    let foreign = nth(parse("var b = 2;", &ParseOptions::default()).root(), VAR_STMT, 0);
    assert!(root.remove_node(&foreign, RemoveOptions::KEEP_NO_TRIVIA).is_err());
}

#[test]
fn removal_keeps_unbalanced_directives() {
    let text = "var a = 1;\n#if A\nvar b = 2;\n#endif\nvar c = 3;\n";
    let tree = parse(text, &ParseOptions::default().with_preprocessor_symbols(["A"]));
    let b = nth(tree.root(), VAR_STMT, 1);
    assert_eq!(b.text(), "#if A\nvar b = 2;\n");

    let options = RemoveOptions::KEEP_UNBALANCED_DIRECTIVES;
    let removed = tree.root().remove_node(&b, options).unwrap().unwrap();
    assert_eq!(removed.text(), "var a = 1;\n\n#if A\n#endif\nvar c = 3;\n");
    assert_eq!(removed.directives().len(), 2);

    let dropped = tree.root().remove_node(&b, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(dropped.text(), "var a = 1;\n#endif\nvar c = 3;\n");
}

struct Cleanup {
    removed_statements: usize,
}

impl SyntaxRewriter for Cleanup {
    fn visit_list_element(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if node.kind() == EMPTY_STMT {
            self.removed_statements += 1;
            return Ok(None);
        }
        self.visit_node(node)
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        if token.kind() == NAME && token.text().starts_with('_') {
            let green = token.green();
            let text = token.text().trim_start_matches('_');
            let new = GreenToken::new(NAME, text)
                .with_trivia(green.leading().clone(), green.trailing().clone());
            return walk_token(self, &SyntaxToken::detached(new));
        }
        walk_token(self, token)
    }

    fn visit_trivia(&mut self, trivia: &SyntaxTrivia) -> SyntaxResult<Option<GreenTrivia>> {
        Ok((!trivia.is_comment()).then(|| trivia.green().clone()))
    }
}

#[test]
fn rewriter_deletes_and_rebuilds() {
    let tree = tree("var _a = 1; // one\n;\n/* two */ f(_a, b);\n");
    let mut cleanup = Cleanup { removed_statements: 0 };
    let new = tree.root().rewrite_with(&mut cleanup).unwrap();

    assert_eq!(cleanup.removed_statements, 1);
    assert_eq!(new.text(), "var a = 1; \n f(a, b);\n");
    assert_eq!(new.options(), tree.root().options());
}

#[test]
fn rewriter_without_changes_returns_the_same_node() {
    let tree = tree("var a = 1;\n");
    let mut cleanup = Cleanup { removed_statements: 0 };
    let same = tree.root().rewrite_with(&mut cleanup).unwrap();
    assert!(same.ptr_eq(tree.root()));
}

#[test]
fn replace_trivia_and_insert_trivia() {
    let tree = tree("var a = 1; // old\n");
    let comment = tree
        .root()
        .descendant_trivia(false)
        .find(|trivia| trivia.kind() == TriviaKind::SingleLineComment)
        .unwrap();

    let replaced = tree
        .root()
        .replace_trivia([comment.clone()], |_, _| {
            SyntaxTrivia::detached(GreenTrivia::new(TriviaKind::SingleLineComment, "// new"))
        })
        .unwrap();
    assert_eq!(replaced.text(), "var a = 1; // new\n");

    let space = GreenTrivia::new(TriviaKind::Whitespace, " ");
    let padded = tree.root().insert_trivia_before(&comment, [space]).unwrap();
    assert_eq!(padded.text(), "var a = 1;  // old\n");

    let gone = tree.root().replace_trivia_with_many(&comment, []).unwrap();
    assert_eq!(gone.text(), "var a = 1; \n");
}

#[derive(Default)]
struct Counter {
    depth: WalkDepth,
    nodes: usize,
    tokens: usize,
    trivia: usize,
}

impl SyntaxWalker for Counter {
    fn depth(&self) -> WalkDepth {
        self.depth
    }

    fn visit_node(&mut self, _node: &SyntaxNode) {
        self.nodes += 1;
    }

    fn visit_token(&mut self, _token: &SyntaxToken) {
        self.tokens += 1;
    }

    fn visit_trivia(&mut self, _trivia: &SyntaxTrivia) {
        self.trivia += 1;
    }
}

#[test]
fn walker_depths() {
    let tree = tree("#if A\n#endif\nvar a;\n");
    let count = |depth| {
        let mut counter = Counter { depth, ..Counter::default() };
        walk(&mut counter, tree.root());
        (counter.nodes, counter.tokens, counter.trivia)
    };

    assert_eq!(count(WalkDepth::ROOT), (1, 0, 0));
    assert_eq!(count(WalkDepth::NODE), (3, 0, 0));
    assert_eq!(count(WalkDepth::TOKEN), (3, 4, 0));
    assert_eq!(count(WalkDepth::TRIVIA), (3, 4, 4));
    assert_eq!(count(WalkDepth::STRUCTURED_TRIVIA), (5, 9, 7));
}
