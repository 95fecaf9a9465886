#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Composite logical timestamp: operation counter in the high bits, the
/// authoring replica in the low bits. `0` is reserved for the root node
/// and doubles as the front-insertion anchor in paths.
pub type Timestamp = u64;

/// Sequence of timestamps locating a node by traversal from the root.
pub type Path = Vec<Timestamp>;

/// The root node's timestamp.
pub const ROOT_TIMESTAMP: Timestamp = 0;

/// Anchor sentinel meaning "at the front of the parent's children".
pub const ANCHOR_FRONT: Timestamp = 0;

/// Unique identifier for a replica. A small integer that fits within the
/// replica field of a composite [`Timestamp`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplicaId(pub u64);

impl ReplicaId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}
