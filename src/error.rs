use thiserror::Error;

use crate::ids::Timestamp;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A path segment (or the anchor sibling of an insertion) did not
    /// resolve to an existing node.
    #[error("no node for timestamp {0}")]
    NotFound(Timestamp),
    /// The addressed parent sits inside a tombstoned subtree; nothing can
    /// be inserted beneath it.
    #[error("parent {0} is tombstoned")]
    ParentDeleted(Timestamp),
    /// A delivered insertion reused a timestamp that is already bound to
    /// a different node or payload.
    #[error("timestamp {0} is already in use")]
    TimestampInUse(Timestamp),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
