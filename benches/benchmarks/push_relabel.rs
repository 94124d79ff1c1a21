use criterion::{BatchSize, BenchmarkId, Criterion, SamplingMode, Throughput, criterion_group};
use flowtoolbox_rs::flow_graph::FlowGraphBuilder;
use flowtoolbox_rs::push_relabel::PushRelabel;
use rand::Rng;

/// A deterministic layered graph: `layers` stages of `width` nodes each,
/// every node in stage `i` connected to every node in stage `i + 1`, plus a
/// source feeding stage 0 and a sink drained by the last stage.
fn layered_graph(layers: usize, width: usize) -> (FlowGraphBuilder, usize, usize) {
    let mut rng = rand::rng();
    let mut builder = FlowGraphBuilder::new();
    let source = 0;
    let sink = 1 + layers * width;
    for n in 0..width {
        let capacity = rng.random_range(1..1000);
        builder.add_arc(source, 1 + n, capacity);
    }
    for layer in 0..layers - 1 {
        for a in 0..width {
            for b in 0..width {
                let capacity = rng.random_range(1..1000);
                builder.add_arc(1 + layer * width + a, 1 + (layer + 1) * width + b, capacity);
            }
        }
    }
    for n in 0..width {
        let capacity = rng.random_range(1..1000);
        builder.add_arc(1 + (layers - 1) * width + n, sink, capacity);
    }
    (builder, source, sink)
}

fn bench_push_relabel(c: &mut Criterion) {
    let mut group = c.benchmark_group("PushRelabel::solve, layered graph");
    group.sampling_mode(SamplingMode::Flat);
    for width in [8usize, 16, 32] {
        let layers = 6;
        group.throughput(Throughput::Elements((layers * width) as u64));
        group.bench_function(BenchmarkId::new("solve", width), |b| {
            b.iter_batched(
                || layered_graph(layers, width),
                |(builder, source, sink)| {
                    let (graph, _) = builder.build();
                    let mut solver = PushRelabel::new(graph, source, sink);
                    solver.solve()
                },
                BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(push_relabel, bench_push_relabel);
