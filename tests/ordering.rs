use ordtree::{Edit, Operation, ReplicaId, Tree, TreeConfig};

fn single() -> Tree {
    Tree::new(TreeConfig {
        id: ReplicaId::new(0),
        max_replicas: 1,
    })
}

fn replica(id: u64) -> Tree {
    Tree::new(TreeConfig {
        id: ReplicaId::new(id),
        max_replicas: 2,
    })
}

#[test]
fn later_insert_on_same_anchor_lands_closer_to_it() {
    let mut tree = single();
    tree.apply(Operation::batch(vec![
        Operation::add(ReplicaId::new(0), 1, [0], "a"),
        Operation::add(ReplicaId::new(0), 2, [1], "c"),
        Operation::add(ReplicaId::new(0), 3, [1], "b"),
    ]))
    .unwrap();

    assert_eq!(tree.children(&[]).unwrap(), vec![1, 3, 2]);
    assert_eq!(tree.get(&[1]), Some(&b"a"[..]));
    assert_eq!(tree.get(&[2]), Some(&b"c"[..]));
    assert_eq!(tree.get(&[3]), Some(&b"b"[..]));
    assert_eq!(tree.log_len(), 3);
}

#[test]
fn concurrent_same_anchor_inserts_order_identically_everywhere() {
    let mut a = replica(0);
    let mut b = replica(1);

    let base = a.apply_edit(Edit::add("base")).unwrap();
    b.apply(base).unwrap();

    // Both replicas insert after "base" (timestamp 2) without seeing each
    // other first.
    let from_a = Operation::add(ReplicaId::new(0), (2 << 1) | 0, [2], "xa");
    let from_b = Operation::add(ReplicaId::new(1), (2 << 1) | 1, [2], "xb");

    a.apply(from_a.clone()).unwrap();
    a.apply(from_b.clone()).unwrap();
    b.apply(from_b).unwrap();
    b.apply(from_a).unwrap();

    // Higher timestamp sits closer to the anchor on both sides.
    assert_eq!(a.children(&[]).unwrap(), vec![2, 5, 4]);
    assert_eq!(b.children(&[]).unwrap(), a.children(&[]).unwrap());
}

#[test]
fn concurrent_front_inserts_order_identically_everywhere() {
    let mut a = replica(0);
    let mut b = replica(1);

    let from_a = Operation::add(ReplicaId::new(0), (1 << 1) | 0, [0], "xa");
    let from_b = Operation::add(ReplicaId::new(1), (1 << 1) | 1, [0], "xb");

    a.apply(from_a.clone()).unwrap();
    a.apply(from_b.clone()).unwrap();
    b.apply(from_b).unwrap();
    b.apply(from_a).unwrap();

    assert_eq!(a.children(&[]).unwrap(), vec![3, 2]);
    assert_eq!(b.children(&[]).unwrap(), vec![3, 2]);
}

#[test]
fn tombstoned_sibling_still_anchors_insertions() {
    let mut tree = single();
    tree.apply(Operation::add(ReplicaId::new(0), 1, [0], "a"))
        .unwrap();
    tree.apply(Operation::add(ReplicaId::new(0), 2, [1], "b"))
        .unwrap();
    tree.apply(Operation::delete(ReplicaId::new(0), [1])).unwrap();

    // "c" anchors on the tombstone of "a" and must slot between the
    // tombstone and "b".
    tree.apply(Operation::add(ReplicaId::new(0), 4, [1], "c"))
        .unwrap();

    assert_eq!(tree.children_slice(&[]).unwrap(), vec![1, 4, 2]);
    assert_eq!(tree.children(&[]).unwrap(), vec![4, 2]);
}

#[test]
fn sibling_order_is_stable_under_unrelated_inserts() {
    let mut tree = single();
    tree.apply(Operation::batch(vec![
        Operation::add(ReplicaId::new(0), 1, [0], "a"),
        Operation::add(ReplicaId::new(0), 2, [1], "b"),
        Operation::add(ReplicaId::new(0), 3, [2], "c"),
    ]))
    .unwrap();
    assert_eq!(tree.children(&[]).unwrap(), vec![1, 2, 3]);

    // A late arrival anchored in the middle shifts only its segment.
    tree.apply(Operation::add(ReplicaId::new(0), 9, [2], "late"))
        .unwrap();
    assert_eq!(tree.children(&[]).unwrap(), vec![1, 2, 9, 3]);
}
