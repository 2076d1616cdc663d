//! Coarse-grained parallelism: independent searches dispatched onto
//! a pool of worker threads sharing one immutable preprocessed
//! graph.

#[doc(hidden)]
pub mod pool;
mod test;

#[doc(inline)]
pub use pool::{Ticket, WorkerOptions};
