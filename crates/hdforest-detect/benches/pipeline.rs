use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hdforest_core::datasets::{karate_club, ring_lattice};
use hdforest_core::{DetectConfig, Graph, HierarchyRule, NodeId};
use hdforest_detect::detect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sparse random graph with mean degree around `mean_degree`.
fn random_graph(n: NodeId, mean_degree: f64, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let p = (mean_degree / f64::from(n)).min(1.0);
    let mut edges = Vec::new();
    for a in 0..n {
        for b in (a + 1)..n {
            if rng.gen_bool(p) {
                edges.push((a, b));
            }
        }
    }
    Graph::from_edges(0..n, edges).expect("random graphs are simple")
}

fn config(rule: HierarchyRule) -> DetectConfig {
    DetectConfig {
        center_count: 2,
        auto_choose_centers: true,
        rule,
        seed: Some(7),
    }
}

fn bench_datasets(c: &mut Criterion) {
    let karate = karate_club().expect("karate").graph;
    let ring = ring_lattice(1_000).expect("ring");

    let mut group = c.benchmark_group("pipeline.datasets");
    group.bench_function("karate", |b| {
        b.iter(|| black_box(detect(&karate, &config(HierarchyRule::Maximum))));
    });
    group.bench_function("ring_1000_full", |b| {
        b.iter(|| black_box(detect(&ring, &config(HierarchyRule::Full))));
    });
    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline.random");
    for n in [500u32, 2_000, 5_000] {
        let graph = random_graph(n, 6.0, 0xC0FFEE);
        group.throughput(Throughput::Elements(u64::from(n)));
        for rule in [HierarchyRule::Full, HierarchyRule::Maximum] {
            group.bench_with_input(
                BenchmarkId::new(rule.as_str(), n),
                &graph,
                |b, graph| b.iter(|| black_box(detect(graph, &config(rule)))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_datasets, bench_random);
criterion_main!(benches);
