use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ignition_engine::{Engine, EngineConfig, compile_source};

fn program(statements: usize) -> String {
    let mut source = String::from("var acc = 1.5;");
    for i in 0..statements {
        if i % 10 == 0 {
            source.push_str(&format!("{{ var t{} = acc * 2; ", i));
            source.push_str(&format!("var u{} = t{} + 0.25; }}", i, i));
        } else {
            source.push_str(&format!("var v{} = acc + {} * 3 - 1;", i, i));
        }
    }
    source
}

fn bench_compile(c: &mut Criterion) {
    let source = program(500);
    let config = EngineConfig::default();
    c.bench_function("compile_500", |b| {
        b.iter(|| compile_source(black_box(&source), &config))
    });
}

fn bench_execute(c: &mut Criterion) {
    let source = program(500);
    c.bench_function("execute_500", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.execute(black_box(&source))
        })
    });
}

criterion_group!(benches, bench_compile, bench_execute);
criterion_main!(benches);
