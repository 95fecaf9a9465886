#![forbid(unsafe_code)]
//! Operation-based ordered tree CRDT.
//!
//! Replicas edit a hierarchical, ordered tree of opaque payloads and
//! converge to identical state once every replica has observed every
//! operation, regardless of delivery order or duplication. Nodes are
//! addressed by paths of composite timestamps (operation counter in the
//! high bits, replica id in the low bits); insertions anchor after a
//! named sibling, deletions tombstone. The crate is transport-agnostic:
//! it hands out [`Operation`] values and an incremental
//! `operations_since` log and leaves moving them between replicas to the
//! embedder.

pub mod clock;
pub mod edit;
pub mod error;
pub mod ids;
mod node;
pub mod ops;
pub mod tree;

pub use clock::TimestampAllocator;
pub use edit::Edit;
pub use error::{Error, Result};
pub use ids::{Path, ReplicaId, Timestamp, ANCHOR_FRONT, ROOT_TIMESTAMP};
pub use ops::Operation;
pub use tree::{Tree, TreeConfig};
