use crate::ids::{Path, ReplicaId, Timestamp};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The unit of replication and logging.
///
/// `Add` and `Delete` address their target through a [`Path`]; for `Add`
/// the final segment is the anchor (the sibling the new node lands
/// after, or `0` for the front of the parent's children). The `replica`
/// field records authorship for diagnostics; merge behavior is carried
/// entirely by the timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    Add {
        replica: ReplicaId,
        timestamp: Timestamp,
        path: Path,
        payload: Vec<u8>,
    },
    Delete {
        replica: ReplicaId,
        path: Path,
    },
    /// Ordered sequence applied atomically: the first failing member
    /// discards the whole batch.
    Batch { operations: Vec<Operation> },
}

impl Operation {
    pub fn add(
        replica: ReplicaId,
        timestamp: Timestamp,
        path: impl Into<Path>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Add {
            replica,
            timestamp,
            path: path.into(),
            payload: payload.into(),
        }
    }

    pub fn delete(replica: ReplicaId, path: impl Into<Path>) -> Self {
        Self::Delete {
            replica,
            path: path.into(),
        }
    }

    pub fn batch(operations: Vec<Operation>) -> Self {
        Self::Batch { operations }
    }

    /// Authoring replica; `None` for batches.
    pub fn author(&self) -> Option<ReplicaId> {
        match self {
            Self::Add { replica, .. } | Self::Delete { replica, .. } => Some(*replica),
            Self::Batch { .. } => None,
        }
    }

    /// The timestamp an `Add` allocates; `None` otherwise.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Add { timestamp, .. } => Some(*timestamp),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&[Timestamp]> {
        match self {
            Self::Add { path, .. } | Self::Delete { path, .. } => Some(path),
            Self::Batch { .. } => None,
        }
    }
}
