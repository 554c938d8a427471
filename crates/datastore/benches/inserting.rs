use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hydra_datastore::{Database, DatabaseConfig, Entity, Node, Project, Session};

fn build_network(session: &Session, node_count: usize) {
    let mut project = Entity::<Project>::new(session).unwrap();
    project.set("project_name", "bench").unwrap();
    project.set("status", "A").unwrap();
    project.save().unwrap();

    let mut network = Entity::<hydra_datastore::Network>::new(session).unwrap();
    network.set("project_id", project.id().unwrap()).unwrap();
    network.set("network_name", "bench").unwrap();
    network.set("status", "A").unwrap();
    network.save().unwrap();

    for i in 0..node_count {
        let mut node = Entity::<Node>::new(session).unwrap();
        node.set("network_id", network.id().unwrap()).unwrap();
        node.set("node_name", format!("node{}", i)).unwrap();
        node.set("node_x", i as f64).unwrap();
        node.set("node_y", 0.0).unwrap();
        node.set("status", "A").unwrap();
        node.save().unwrap();
    }
    session.commit().unwrap();
}

pub fn benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inserting");
    for size in [5, 10, 20, 50, 100, 500, 5000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            let tdir = tempfile::TempDir::new().expect("Should create");
            let db = Database::open(DatabaseConfig::new(tdir.path().join("bench.sqlite"))).unwrap();
            let session = db.session();

            b.iter(|| build_network(&session, *size as usize));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
