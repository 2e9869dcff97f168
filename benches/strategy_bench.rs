/// Benchmarks for Mr. Magpie's resolution strategies.
///
/// Run with: `cargo bench`
///
/// Compares the eager whole-program closure against the demand-driven
/// backward search on synthetic programs of growing size, plus the full
/// pipeline including parsing and binding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mr_magpie::application::{AnalysisOptions, AnalyzeUsecase};
use mr_magpie::domain::ast::BoundProgram;
use mr_magpie::domain::flowgraph::FlowGraph;
use mr_magpie::domain::{bindings, flow_builder, strategy};
use mr_magpie::infrastructure::TreeSitterParser;
use mr_magpie::ports::SourceParser;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A program with `funcs` mutually referencing functions, each rebound
/// through a `chain`-long series of copies before being called. Long copy
/// chains are the worst case for the eager closure and the best case for
/// demand-driven memoization.
fn synthetic_program(funcs: usize, chain: usize) -> String {
    let mut src = String::new();
    for i in 0..funcs {
        src.push_str(&format!(
            "function f{}() {{ return f{}; }}\n",
            i,
            (i + 1) % funcs
        ));
    }
    for i in 0..funcs {
        src.push_str(&format!("var a{}_0 = f{};\n", i, i));
        for j in 1..chain {
            src.push_str(&format!("var a{}_{} = a{}_{};\n", i, j, i, j - 1));
        }
        src.push_str(&format!("a{}_{}();\n", i, chain - 1));
    }
    src
}

fn prepared_flow_graph(src: &str) -> (BoundProgram, FlowGraph) {
    let module = TreeSitterParser
        .parse("bench.js", src)
        .expect("synthetic program parses");
    let prog = bindings::bind(vec![module]);
    let fg = flow_builder::build_flow_graph(&prog).expect("flow graph builds");
    (prog, fg)
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    for &size in &[10usize, 50, 200] {
        let src = synthetic_program(size, 8);
        let (_prog, fg) = prepared_flow_graph(&src);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("oneshot", size), &fg, |b, fg| {
            b.iter(|| black_box(strategy::resolve(fg, strategy::Strategy::Oneshot)))
        });
        group.bench_with_input(BenchmarkId::new("demand", size), &fg, |b, fg| {
            b.iter(|| black_box(strategy::resolve(fg, strategy::Strategy::Demand)))
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    for &size in &[10usize, 50] {
        let sources = vec![("bench.js".to_string(), synthetic_program(size, 4))];
        group.bench_with_input(BenchmarkId::new("oneshot", size), &sources, |b, sources| {
            let usecase = AnalyzeUsecase {
                parser: &TreeSitterParser,
            };
            let options = AnalysisOptions {
                strategy: strategy::Strategy::Oneshot,
                time: false,
            };
            b.iter(|| black_box(usecase.run(sources, &options).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolution, bench_full_pipeline);
criterion_main!(benches);
