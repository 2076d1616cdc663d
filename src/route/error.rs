use thiserror::Error;

use crate::geo::Position;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// The query coordinate snaps onto more than one network vertex
    /// at the configured tolerance.
    #[error("coordinate {0} resolves to multiple network vertices")]
    AmbiguousCoordinate(Position),

    #[error("worker terminated unexpectedly")]
    WorkerTerminated,

    #[error("worker pool has been closed")]
    PoolClosed,
}
