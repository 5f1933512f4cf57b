use std::hint::black_box;

use arbor_syntax::{NodeCache, ParseOptions};
use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

static SIMPLE: &str = r#"
fn main() {
    return 42;
}
"#;

static MEDIUM: &str = r#"
class Point {
    var x = 0;
    var y = 0;

    fn length(self) {
        return self.x * self.x + self.y * self.y;
    }
}

/// Entry point.
fn main() {
    var p = Point();
    if (p.length() == 0) {
        print("origin");
    } else {
        while (p.x < 10) { p.x = p.x + 1; }
    }
#if DEBUG
    dump(p);
#endif
}
"#;

fn benchmark_parser(c: &mut Criterion) {
    let large = MEDIUM.repeat(64);
    let inputs = [("Simple", SIMPLE), ("Medium", MEDIUM), ("Large", large.as_str())];
    let options = ParseOptions::default().with_preprocessor_symbols(["DEBUG"]);

    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, text) in inputs {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), text, |b, text| {
            b.iter(|| black_box(arbor_parse::parse(text, &options)));
        });
        group.bench_with_input(BenchmarkId::new("parse_cold_cache", name), text, |b, text| {
            b.iter(|| {
                let cache = NodeCache::with_capacity_bits(12);
                black_box(arbor_parse::parse_with_cache(text, &options, &cache))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
