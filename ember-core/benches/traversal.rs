//! Traversal and persistence benchmarks over a layered graph.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ember_core::graph::{Model, NodeBuilder, NodeId};
use ember_core::serialization::Format;

/// `layers` layers of `width` nodes; every node reads two nodes of the
/// previous layer.
fn layered(layers: usize, width: usize) -> (Model, Vec<NodeId>) {
    let mut model = Model::new();
    let mut previous: Vec<NodeId> = (0..width)
        .map(|_| model.add_node(NodeBuilder::new("Input")).unwrap())
        .collect();

    for _ in 1..layers {
        let layer: Vec<NodeId> = (0..width)
            .map(|i| {
                let lhs = previous[i];
                let rhs = previous[(i + 1) % width];
                model
                    .add_node(NodeBuilder::new("Sum").input("lhs", [lhs]).input("rhs", [rhs]))
                    .unwrap()
            })
            .collect();
        previous = layer;
    }

    (model, previous)
}

fn bench_traversal(c: &mut Criterion) {
    let (model, outputs) = layered(64, 32);

    c.bench_function("full_graph_2048", |b| {
        b.iter(|| black_box(model.node_iterator(&[]).unwrap().count()))
    });

    c.bench_function("active_subgraph_single_output", |b| {
        b.iter(|| black_box(model.node_iterator(&outputs[..1]).unwrap().count()))
    });

    let bytes = model.save(Format::MessagePack).unwrap();
    c.bench_function("restore_msgpack_2048", |b| {
        b.iter(|| black_box(Model::load(&bytes, Format::MessagePack).unwrap().node_count()))
    });
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
