use criterion::{BatchSize, BenchmarkId, Criterion, SamplingMode, Throughput, criterion_group};
use flowtoolbox_rs::flow_graph::FlowGraphBuilder;
use flowtoolbox_rs::min_cost_flow::MinCostFlow;
use rand::Rng;

/// A complete bipartite assignment instance: `size` left nodes, `size`
/// right nodes, unit-capacity arcs at random integer costs, balanced
/// supply/demand of exactly one unit per node.
fn assignment_instance(size: usize) -> (FlowGraphBuilder, Vec<i64>) {
    let mut rng = rand::rng();
    let mut builder = FlowGraphBuilder::new();
    for l in 0..size {
        for r in 0..size {
            let cost = rng.random_range(1..1000);
            builder.add_arc_with_cost(l, size + r, 1, cost);
        }
    }
    let mut supply = vec![0i64; 2 * size];
    for l in 0..size {
        supply[l] = 1;
    }
    for r in 0..size {
        supply[size + r] = -1;
    }
    (builder, supply)
}

fn bench_min_cost_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("MinCostFlow::solve, random assignment");
    group.sampling_mode(SamplingMode::Flat);
    for size in [8usize, 16, 24] {
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_function(BenchmarkId::new("solve", size), |b| {
            b.iter_batched(
                || assignment_instance(size),
                |(builder, supply)| {
                    let (graph, _) = builder.build();
                    let mut solver = MinCostFlow::new(graph, supply);
                    solver.solve()
                },
                BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(min_cost_flow, bench_min_cost_flow);
