use std::fs;
use std::path::{Path, PathBuf};

use arbor_syntax::{Language as _, NodeCache, ParseOptions, SyntaxKind, SyntaxTree};
use expect_test::expect_file;

use crate::kinds::*;
use crate::{LANGUAGE, codes, parse, parse_with_cache};

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    input: PathBuf,
    expected: PathBuf,
    text: String,
}

impl TestCase {
    fn list() -> Vec<Self> {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");

        let mut cases = fs::read_dir(&test_data_dir)
            .unwrap_or_else(|err| {
                panic!("Cannot read directory {}: {err}", test_data_dir.display())
            })
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "arb" {
                    let expected = path.with_extension("tree");
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { input: path, expected, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        cases.sort();
        cases
    }
}

fn render(tree: &SyntaxTree) -> String {
    let dump = tree.root().green().debug_dump(tree.language());
    let diagnostics = tree
        .diagnostics()
        .iter()
        .map(|d| {
            let range = d.range();
            format!("  {}..{} {}", u32::from(range.start()), u32::from(range.end()), d.message())
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{dump}Errors:\n{diagnostics}")
}

#[test]
fn parse_test_data() {
    let test_cases = TestCase::list();
    assert!(!test_cases.is_empty());

    for case in test_cases {
        let tree = parse(&case.text, &ParseOptions::default());
        assert_eq!(tree.text(), case.text, "{}", case.input.display());
        expect_file![&case.expected].assert_eq(&render(&tree));
    }
}

#[track_caller]
fn check_lossless(text: &str) {
    let tree = parse(text, &ParseOptions::default());
    assert_eq!(tree.text(), text);
    assert_eq!(u32::from(tree.root().full_span().len()) as usize, text.len());
}

#[test]
fn garbage_round_trips() {
    check_lossless("");
    check_lossless("   \n\n");
    check_lossless("@@ fn ( {");
    check_lossless("class { var = ; fn (,,) } }");
    check_lossless("if (a == b c) else while");
    check_lossless("\"unterminated\n#bogus\n/* open");
    check_lossless("#if A\n#else\n#else\n#endif\n#endif\n");
}

fn messages(tree: &SyntaxTree) -> Vec<String> {
    tree.diagnostics().iter().map(|d| d.message().to_owned()).collect()
}

#[test]
fn unexpected_tokens_become_error_nodes() {
    let tree = parse("class C { 1 }", &ParseOptions::default());
    let error = tree.root().descendants().find(|node| node.kind() == ERROR).unwrap();
    assert_eq!(error.text(), "1 ");

    let diagnostics = tree.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code(), codes::UNEXPECTED);
    assert_eq!(diagnostics[0].message(), "expected a member");
    assert_eq!(u32::from(diagnostics[0].range().start()), 10);
    assert_eq!(u32::from(diagnostics[0].range().end()), 11);
}

#[test]
fn missing_block_reports_once() {
    let tree = parse("fn f()", &ParseOptions::default());
    assert_eq!(messages(&tree), ["expected a block"]);

    let block = tree.root().descendants().find(|node| node.kind() == BLOCK).unwrap();
    assert!(block.is_missing());
    assert_eq!(block.slot_count(), 3);
    assert!(block.slot(1).is_none());
}

#[test]
fn missing_tokens_sit_where_they_were_expected() {
    let tree = parse("var x = ;", &ParseOptions::default());
    assert_eq!(messages(&tree), ["expected an expression"]);

    let name_ref = tree.root().descendants().find(|node| node.kind() == NAME_REF).unwrap();
    assert!(name_ref.is_missing());
    assert_eq!(u32::from(name_ref.full_span().start()), 8);
    assert_eq!(tree.diagnostics()[0].code(), codes::EXPECTED);
}

#[test]
fn operators_bind_by_precedence() {
    let tree = parse("a = b + c * d == e;", &ParseOptions::default());
    let assignment = tree.root().descendants().find(|node| node.kind() == BINARY_EXPR).unwrap();
    assert_eq!(assignment.slot_token(1).unwrap().kind(), EQ);

    let rhs = assignment.slot_node(2).unwrap();
    assert_eq!(rhs.slot_token(1).unwrap().kind(), EQ2);
    let sum = rhs.slot_node(0).unwrap();
    assert_eq!(sum.slot_token(1).unwrap().kind(), PLUS);
    assert_eq!(sum.slot_node(2).unwrap().text(), "c * d ");
}

#[test]
fn symbols_enable_conditional_groups() {
    let text = "#if DEBUG\nvar a = 1;\n#endif\n";
    let count = |tree: &SyntaxTree| {
        tree.root().descendants().filter(|node| node.kind() == VAR_STMT).count()
    };

    let plain = parse(text, &ParseOptions::default());
    assert_eq!(count(&plain), 0);
    assert_eq!(plain.root().directives().len(), 2);
    assert_eq!(plain.text(), text);

    let options = ParseOptions::default().with_preprocessor_symbols(["DEBUG"]);
    let debug = parse(text, &options);
    assert_eq!(count(&debug), 1);
    assert_eq!(debug.root().directives().len(), 2);
    assert!(debug.options().is_defined("DEBUG"));
}

#[test]
fn a_shared_cache_reuses_identical_statements() {
    let cache = NodeCache::with_capacity_bits(16);
    let tree = parse_with_cache("f(x);\nf(x);\n", &ParseOptions::default(), &cache);
    let statements: Vec<_> =
        tree.root().descendants().filter(|node| node.kind() == EXPR_STMT).collect();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].green().ptr_eq(statements[1].green()));
    assert!(!statements[0].ptr_eq(&statements[1]));
}

#[test]
fn slot_optionality() {
    assert!(LANGUAGE.is_optional_slot(RETURN_STMT, 1));
    assert!(!LANGUAGE.is_optional_slot(RETURN_STMT, 0));
    assert!(LANGUAGE.is_optional_slot(IF_STMT, 5));
    assert!(LANGUAGE.is_optional_slot(SyntaxKind::LIST, 0));
    assert!(!LANGUAGE.is_optional_slot(FN_DECL, 1));
    assert!(LANGUAGE.is_executable_body(BLOCK));
    assert_eq!(LANGUAGE.kind_name(CLASS_DECL), "CLASS_DECL");
    assert_eq!(LANGUAGE.kind_name(SyntaxKind::SEPARATED_LIST), "SEPARATED_LIST");
}
