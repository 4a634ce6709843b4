use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tarn_lexical::grammar::script_lexer_builder;

const SOURCE: &str = r#"
class Counter extends Base {
    private count = 0;
    constructor(start) { super(); this.count = start; }
    increment() { this.count += 1; return this.count; }
}

// drive it
var c = new Counter(10);
for (var i = 0; i < 100; i++) { c.increment(); }
"#;

fn bench_tokenize(c: &mut Criterion) {
    let builder = script_lexer_builder();
    c.bench_function("tokenize class source", |b| {
        b.iter(|| {
            let tokens = builder.build(black_box(SOURCE)).tokenize().unwrap();
            black_box(tokens.len())
        })
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
