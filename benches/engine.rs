use std::time::Instant;

use ordtree::{Edit, Operation, ReplicaId, Tree, TreeConfig};

const COUNTS: &[u64] = &[100, 1_000, 10_000];

fn new_tree(id: u64) -> Tree {
    Tree::new(TreeConfig {
        id: ReplicaId::new(id),
        max_replicas: 2,
    })
}

fn local_appends(count: u64) -> (Tree, f64) {
    let mut tree = new_tree(0);
    let start = Instant::now();
    for i in 0..count {
        tree.apply_edit(Edit::add(i.to_be_bytes())).unwrap();
    }
    (tree, start.elapsed().as_secs_f64() * 1000.0)
}

fn remote_ingest(ops: Vec<Operation>) -> f64 {
    let mut tree = new_tree(1);
    let start = Instant::now();
    for op in ops {
        tree.apply(op).unwrap();
    }
    start.elapsed().as_secs_f64() * 1000.0
}

fn log_scan(tree: &Tree) -> f64 {
    let start = Instant::now();
    let ops = tree.operations_since(0);
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    assert_eq!(ops.len(), tree.log_len());
    elapsed
}

fn report(name: &str, count: u64, duration_ms: f64) {
    let ops_per_sec = if duration_ms > 0.0 {
        count as f64 / (duration_ms / 1000.0)
    } else {
        f64::INFINITY
    };
    println!("{name:>14}  count={count:>6}  {duration_ms:>10.3} ms  {ops_per_sec:>12.0} ops/s");
}

fn main() {
    for &count in COUNTS {
        let (tree, local_ms) = local_appends(count);
        report("local edits", count, local_ms);

        let remote_ms = remote_ingest(tree.operations_since(0));
        report("remote ingest", count, remote_ms);

        let scan_ms = log_scan(&tree);
        report("log scan", count, scan_ms);
    }
}
