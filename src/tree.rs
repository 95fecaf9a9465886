use std::collections::HashMap;

use crate::clock::TimestampAllocator;
use crate::edit::{Cursor, Edit};
use crate::error::{Error, Result};
use crate::ids::{ReplicaId, Timestamp, ANCHOR_FRONT};
use crate::node::{Handle, Node};
use crate::ops::Operation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Construction parameters: the local replica and the (fixed) size of the
/// replica group, which determines how many low timestamp bits carry the
/// replica id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeConfig {
    pub id: ReplicaId,
    pub max_replicas: u64,
}

/// A logged operation with the stamp `operations_since` filters on. Adds
/// carry their own timestamp; deletes are stamped from the local
/// allocator when they land. Stamps within one log are unique.
#[derive(Clone, Debug)]
struct LogEntry {
    op: Operation,
    stamp: Timestamp,
}

/// Replicated ordered tree.
///
/// Local edits go through [`Tree::batch`] / [`Tree::apply_edit`], which
/// synthesize operations against fresh timestamps; remote operations go
/// through [`Tree::apply`]. Both paths funnel into the same application
/// logic, so a replica replaying its own broadcast converges with its
/// peers. Every effective application appends to the log; duplicates are
/// silent no-ops and failures leave the tree untouched.
#[derive(Clone, Debug)]
pub struct Tree {
    id: ReplicaId,
    clock: TimestampAllocator,
    nodes: Vec<Node>,
    /// Timestamp -> arena slot for every non-root node ever inserted.
    index: HashMap<Timestamp, Handle>,
    log: Vec<LogEntry>,
    last_operation: Operation,
}

impl Tree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            id: config.id,
            clock: TimestampAllocator::new(config.id, config.max_replicas),
            nodes: vec![Node::root()],
            index: HashMap::new(),
            log: Vec::new(),
            last_operation: Operation::batch(Vec::new()),
        }
    }

    pub fn replica(&self) -> ReplicaId {
        self.id
    }

    /// Apply one fully-formed operation, local or remote.
    ///
    /// A `Batch` is atomic: it stages against a copy and commits only if
    /// every member applies, so a failed batch leaves no trace. Nested
    /// batches flatten into the same staging pass.
    pub fn apply(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::Batch { operations } => {
                self.commit_batch(operations)?;
                Ok(())
            }
            op => {
                let mut effective = Vec::new();
                self.run(op.clone(), &mut effective)?;
                self.last_operation = op;
                Ok(())
            }
        }
    }

    /// Synthesize and apply a single local edit. Returns the operation
    /// for broadcast; `last_operation` is set to that bare operation.
    pub fn apply_edit(&mut self, edit: Edit) -> Result<Operation> {
        let mut cursor = Cursor::new();
        let op = cursor.draft(self.id, &mut self.clock, edit);
        let mut effective = Vec::new();
        self.run(op.clone(), &mut effective)?;
        self.last_operation = op.clone();
        Ok(op)
    }

    /// Consume a sequence of deferred edits as one atomic batch.
    ///
    /// Edits share a cursor that starts at the front of the root's
    /// children: `Add` anchors the next edit at the node it created,
    /// `AddBranch` descends into it. Returns the `Batch` of effective
    /// operations (duplicates suppressed), which is also recorded as
    /// `last_operation`.
    pub fn batch(&mut self, edits: impl IntoIterator<Item = Edit>) -> Result<Operation> {
        let mut staged = self.clone();
        let mut cursor = Cursor::new();
        let mut effective = Vec::new();
        for edit in edits {
            let op = cursor.draft(staged.id, &mut staged.clock, edit);
            staged.run(op, &mut effective)?;
        }
        let batch = Operation::batch(effective);
        staged.last_operation = batch.clone();
        *self = staged;
        Ok(batch)
    }

    /// Payload at `path`, or `None` when the path does not resolve or the
    /// node is tombstoned. The root never has a payload.
    pub fn get(&self, path: &[Timestamp]) -> Option<&[u8]> {
        let handle = self.lookup(path)?;
        self.nodes[handle.0].visible_payload()
    }

    /// The operation recorded by the most recent successful `apply`,
    /// `apply_edit`, or `batch` call. Freshly constructed trees report an
    /// empty batch.
    pub fn last_operation(&self) -> &Operation {
        &self.last_operation
    }

    /// Logged operations stamped strictly after `since`, in log order.
    /// Batches never appear: the log holds their members individually.
    pub fn operations_since(&self, since: Timestamp) -> Vec<Operation> {
        self.log
            .iter()
            .filter(|entry| entry.stamp > since)
            .map(|entry| entry.op.clone())
            .collect()
    }

    /// Highest stamp in the log; the value a peer hands back to
    /// `operations_since` to resume where it left off.
    pub fn latest_stamp(&self) -> Timestamp {
        self.log.iter().map(|entry| entry.stamp).max().unwrap_or(0)
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Ordered timestamps of the live children under `path`.
    pub fn children(&self, path: &[Timestamp]) -> Option<Vec<Timestamp>> {
        let handle = self.lookup(path)?;
        Some(
            self.nodes[handle.0]
                .children
                .iter()
                .filter(|&&child| !self.nodes[child.0].deleted)
                .map(|&child| self.nodes[child.0].timestamp)
                .collect(),
        )
    }

    /// Ordered timestamps of all children under `path`, tombstones
    /// included. Tombstoned siblings stay addressable as anchors, so this
    /// is the order insertion actually works against.
    pub fn children_slice(&self, path: &[Timestamp]) -> Option<Vec<Timestamp>> {
        let handle = self.lookup(path)?;
        Some(
            self.nodes[handle.0]
                .children
                .iter()
                .map(|&child| self.nodes[child.0].timestamp)
                .collect(),
        )
    }

    pub fn is_tombstoned(&self, path: &[Timestamp]) -> bool {
        self.lookup(path)
            .map(|handle| self.nodes[handle.0].deleted)
            .unwrap_or(false)
    }

    /// Whether `path` resolves at all, tombstoned or not.
    pub fn contains(&self, path: &[Timestamp]) -> bool {
        self.lookup(path).is_some()
    }

    /// Structural self-check: parent/child agreement, unique timestamps,
    /// an immortal root, and an acyclic parent chain.
    pub fn validate_invariants(&self) -> Result<()> {
        let root = &self.nodes[Handle::ROOT.0];
        if root.timestamp != 0 || root.deleted || root.parent.is_some() {
            return Err(Error::InconsistentState("malformed root".into()));
        }
        if self.index.len() != self.nodes.len() - 1 {
            return Err(Error::InconsistentState(
                "timestamp index out of step with arena".into(),
            ));
        }

        for (slot, node) in self.nodes.iter().enumerate() {
            let handle = Handle(slot);
            for &child in &node.children {
                if self.nodes[child.0].parent != Some(handle) {
                    return Err(Error::InconsistentState("child parent mismatch".into()));
                }
            }
            if slot == 0 {
                continue;
            }
            if node.timestamp == 0 {
                return Err(Error::InconsistentState("non-root node with timestamp 0".into()));
            }
            if self.index.get(&node.timestamp) != Some(&handle) {
                return Err(Error::InconsistentState("timestamp not indexed".into()));
            }
            let Some(parent) = node.parent else {
                return Err(Error::InconsistentState("orphaned node".into()));
            };
            if !self.nodes[parent.0].children.contains(&handle) {
                return Err(Error::InconsistentState("node missing from parent".into()));
            }
            // Parent chains are bounded by the arena size; anything longer
            // is a cycle.
            let mut steps = 0usize;
            let mut current = handle;
            while let Some(up) = self.nodes[current.0].parent {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(Error::InconsistentState("cycle detected".into()));
                }
                current = up;
            }
            if current != Handle::ROOT {
                return Err(Error::InconsistentState("node detached from root".into()));
            }
        }
        Ok(())
    }

    /// Apply one operation into the live state, recursing through
    /// batches. Effective (state-changing) members are logged and pushed
    /// onto `effective`; duplicates fall through silently. Checks always
    /// precede mutation, so an error leaves `self` exactly as it was.
    fn run(&mut self, op: Operation, effective: &mut Vec<Operation>) -> Result<()> {
        match op {
            Operation::Batch { operations } => {
                for inner in operations {
                    self.run(inner, effective)?;
                }
                Ok(())
            }
            Operation::Add {
                replica,
                timestamp,
                path,
                payload,
            } => {
                if self.insert_node(timestamp, &path, &payload)? {
                    let op = Operation::Add {
                        replica,
                        timestamp,
                        path,
                        payload,
                    };
                    self.log.push(LogEntry {
                        op: op.clone(),
                        stamp: timestamp,
                    });
                    effective.push(op);
                }
                Ok(())
            }
            Operation::Delete { replica, path } => {
                if self.tombstone_node(&path)? {
                    let stamp = self.clock.next();
                    let op = Operation::Delete { replica, path };
                    self.log.push(LogEntry {
                        op: op.clone(),
                        stamp,
                    });
                    effective.push(op);
                }
                Ok(())
            }
        }
    }

    fn commit_batch(&mut self, operations: Vec<Operation>) -> Result<Operation> {
        let mut staged = self.clone();
        let mut effective = Vec::new();
        for op in operations {
            staged.run(op, &mut effective)?;
        }
        let batch = Operation::batch(effective);
        staged.last_operation = batch.clone();
        *self = staged;
        Ok(batch)
    }

    /// Insert semantics of `Add`. `Ok(true)` when the tree changed,
    /// `Ok(false)` for a duplicate delivery.
    fn insert_node(&mut self, timestamp: Timestamp, path: &[Timestamp], payload: &[u8]) -> Result<bool> {
        let (&anchor, prefix) = path.split_last().ok_or(Error::NotFound(0))?;
        let parent = self.resolve(prefix)?;
        if self.in_frozen_subtree(parent) {
            return Err(Error::ParentDeleted(self.nodes[parent.0].timestamp));
        }
        if timestamp == 0 {
            return Err(Error::TimestampInUse(0));
        }
        if let Some(&existing) = self.index.get(&timestamp) {
            let node = &self.nodes[existing.0];
            if node.parent == Some(parent) && node.payload.as_deref() == Some(payload) {
                // Duplicate delivery: already applied, nothing to do.
                return Ok(false);
            }
            return Err(Error::TimestampInUse(timestamp));
        }
        let position = self.insertion_index(parent, anchor, timestamp)?;

        let handle = Handle(self.nodes.len());
        self.nodes.push(Node::leaf(timestamp, payload.to_vec(), parent));
        self.nodes[parent.0].children.insert(position, handle);
        self.index.insert(timestamp, handle);
        self.clock.observe(timestamp);
        Ok(true)
    }

    /// Tombstone semantics of `Delete`. `Ok(true)` when the tree changed,
    /// `Ok(false)` when the node was already tombstoned.
    fn tombstone_node(&mut self, path: &[Timestamp]) -> Result<bool> {
        if path.is_empty() {
            // The root is immortal and not addressable for deletion.
            return Err(Error::NotFound(0));
        }
        let target = self.resolve(path)?;
        if self.nodes[target.0].deleted {
            return Ok(false);
        }
        self.nodes[target.0].tombstone();
        Ok(true)
    }

    /// Where a new sibling with `timestamp` lands relative to `anchor`:
    /// immediately after the anchor (front for the `0` sentinel), past
    /// any sibling with a greater timestamp. Concurrent insertions on one
    /// anchor therefore order newest-first, independent of arrival order.
    fn insertion_index(&self, parent: Handle, anchor: Timestamp, timestamp: Timestamp) -> Result<usize> {
        let children = &self.nodes[parent.0].children;
        let mut position = if anchor == ANCHOR_FRONT {
            0
        } else {
            children
                .iter()
                .position(|&child| self.nodes[child.0].timestamp == anchor)
                .ok_or(Error::NotFound(anchor))?
                + 1
        };
        while position < children.len() && self.nodes[children[position].0].timestamp > timestamp {
            position += 1;
        }
        Ok(position)
    }

    fn resolve(&self, path: &[Timestamp]) -> Result<Handle> {
        let mut current = Handle::ROOT;
        for &segment in path {
            current = self
                .child_by_timestamp(current, segment)
                .ok_or(Error::NotFound(segment))?;
        }
        Ok(current)
    }

    fn lookup(&self, path: &[Timestamp]) -> Option<Handle> {
        self.resolve(path).ok()
    }

    fn child_by_timestamp(&self, parent: Handle, timestamp: Timestamp) -> Option<Handle> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].timestamp == timestamp)
    }

    /// True when `handle` or any of its ancestors is tombstoned. A
    /// tombstoned subtree never accepts new nodes.
    fn in_frozen_subtree(&self, handle: Handle) -> bool {
        let mut current = handle;
        loop {
            let node = &self.nodes[current.0];
            if node.deleted {
                return true;
            }
            match node.parent {
                Some(up) => current = up,
                None => return false,
            }
        }
    }
}
