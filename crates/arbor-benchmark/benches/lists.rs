use std::hint::black_box;

use arbor_parse::kinds::ARG_LIST;
use arbor_syntax::list::SeparatedSyntaxList;
use arbor_syntax::{ParseOptions, SyntaxNode, SyntaxTree};
use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

fn call_with_args(count: usize) -> SyntaxTree {
    let args = vec!["x"; count].join(", ");
    arbor_parse::parse(&format!("f({args});"), &ParseOptions::default())
}

fn arguments(tree: &SyntaxTree) -> SeparatedSyntaxList {
    let arg_list = tree.root().descendants().find(|node| node.kind() == ARG_LIST);
    SeparatedSyntaxList::from_list_node(arg_list.and_then(|node| node.slot_node(1)))
}

fn benchmark_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("Wide Lists");

    for count in [100, 1_000, 10_000] {
        let tree = call_with_args(count);
        let list = arguments(&tree);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("reverse", count), &list, |b, list| {
            b.iter(|| list.reverse().map(|arg: SyntaxNode| arg.offset()).max());
        });
        group.bench_with_input(BenchmarkId::new("forward", count), &list, |b, list| {
            b.iter(|| list.iter().map(|arg: SyntaxNode| arg.offset()).max());
        });
        group.bench_with_input(BenchmarkId::new("add", count), &list, |b, list| {
            let last = list.last();
            b.iter(|| black_box(list.add(last.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_lists);
criterion_main!(benches);
