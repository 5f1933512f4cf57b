use std::hint::black_box;
use std::io::Cursor;

use arbor_parse::LANGUAGE;
use arbor_parse::kinds::{NAME, VAR_STMT};
use arbor_syntax::{
    GreenToken, ParseOptions, RemoveOptions, SerializeOptions, SyntaxToken, SyntaxTree,
    deserialize_from,
};
use codspeed_criterion_compat::{Criterion, criterion_group, criterion_main};

fn source(statements: usize, value: usize) -> String {
    (0..statements)
        .map(|i| {
            let init = if i == statements / 2 { value } else { i };
            format!("var v{i} = {init};\n")
        })
        .collect()
}

fn parse(text: &str) -> SyntaxTree {
    arbor_parse::parse(text, &ParseOptions::default())
}

fn benchmark_rewriting(c: &mut Criterion) {
    let tree = parse(&source(2_000, 0));
    let names: Vec<SyntaxToken> =
        tree.root().descendant_tokens().filter(|token| token.kind() == NAME).collect();
    let middle = tree.root().descendants().filter(|node| node.kind() == VAR_STMT).nth(1_000);

    let mut group = c.benchmark_group("Rewriting");
    group.bench_function("rename_all", |b| {
        b.iter(|| {
            tree.root().replace_tokens(names.iter().cloned(), |_, token| {
                let green = token.green();
                let renamed = GreenToken::new(NAME, "renamed")
                    .with_trivia(green.leading().clone(), green.trailing().clone());
                SyntaxToken::detached(renamed)
            })
        });
    });
    group.bench_function("remove_one", |b| {
        b.iter(|| tree.root().remove_nodes(middle.clone(), RemoveOptions::KEEP_EXTERIOR_TRIVIA));
    });
    group.bench_function("track_one", |b| {
        b.iter(|| tree.root().track_nodes(middle.clone()));
    });
    group.finish();
}

fn benchmark_diffing(c: &mut Criterion) {
    let old = parse(&source(2_000, 0));
    let new = parse(&source(2_000, 7));
    let shuffled = parse(&source(1_000, 0).repeat(2));

    let mut group = c.benchmark_group("Diffing");
    group.bench_function("one_token", |b| b.iter(|| black_box(new.changes_from(&old))));
    group.bench_function("reordered", |b| b.iter(|| black_box(shuffled.changes_from(&old))));
    group.bench_function("equivalence", |b| b.iter(|| new.is_equivalent_to(&old, false)));
    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let tree = parse(&source(2_000, 0));
    let mut bytes = Vec::new();
    if tree.serialize_to(&mut bytes).is_err() {
        return;
    }

    let mut group = c.benchmark_group("Serialization");
    group.bench_function("write_recursive", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            black_box(tree.serialize_to(&mut out))
        });
    });
    group.bench_function("write_iterative", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            black_box(tree.serialize_with(&mut out, SerializeOptions { recursion_limit: 0 }))
        });
    });
    group.bench_function("read", |b| {
        b.iter(|| black_box(deserialize_from(Cursor::new(&bytes), &LANGUAGE)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_rewriting, benchmark_diffing, benchmark_serialization);
criterion_main!(benches);
