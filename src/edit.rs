use crate::clock::TimestampAllocator;
use crate::ids::{Path, ReplicaId, Timestamp, ANCHOR_FRONT};
use crate::ops::Operation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Deferred local edit. An `Edit` captures intent without touching tree
/// state; [`Tree::batch`](crate::Tree::batch) and
/// [`Tree::apply_edit`](crate::Tree::apply_edit) turn it into a concrete
/// [`Operation`] against a fresh timestamp when they run.
///
/// `Add` and `AddBranch` insert the same way; they differ only in where
/// the *next* edit of the same batch lands. `Add` stays in the current
/// parent, anchored at the node it just made. `AddBranch` descends into
/// the new node's (empty) children.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Edit {
    Add { payload: Vec<u8> },
    AddBranch { payload: Vec<u8> },
    Delete { path: Path },
}

impl Edit {
    pub fn add(payload: impl Into<Vec<u8>>) -> Self {
        Self::Add {
            payload: payload.into(),
        }
    }

    pub fn add_branch(payload: impl Into<Vec<u8>>) -> Self {
        Self::AddBranch {
            payload: payload.into(),
        }
    }

    pub fn delete(path: impl Into<Path>) -> Self {
        Self::Delete { path: path.into() }
    }
}

/// Insertion point threaded through one batch: the parent being filled
/// (as a path) and the anchor inside it. Starts at the front of the
/// root's children; each consumed edit moves it.
#[derive(Debug)]
pub(crate) struct Cursor {
    parent: Path,
    anchor: Timestamp,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self {
            parent: Path::new(),
            anchor: ANCHOR_FRONT,
        }
    }

    /// Consume one edit: allocate a timestamp where needed, emit the
    /// operation, and advance the insertion point.
    pub(crate) fn draft(
        &mut self,
        replica: ReplicaId,
        clock: &mut TimestampAllocator,
        edit: Edit,
    ) -> Operation {
        match edit {
            Edit::Add { payload } => {
                let timestamp = clock.next();
                let op = Operation::add(replica, timestamp, self.target(), payload);
                self.anchor = timestamp;
                op
            }
            Edit::AddBranch { payload } => {
                let timestamp = clock.next();
                let op = Operation::add(replica, timestamp, self.target(), payload);
                self.parent.push(timestamp);
                self.anchor = ANCHOR_FRONT;
                op
            }
            Edit::Delete { path } => Operation::delete(replica, path),
        }
    }

    fn target(&self) -> Path {
        let mut path = self.parent.clone();
        path.push(self.anchor);
        path
    }
}
