// src/dispatch/mod.rs

//! Transfer dispatch layer.
//!
//! The detector decides *what* should happen; this module makes it happen
//! without ever blocking detection:
//!
//! - [`dispatcher`] owns the sending half of the action channel
//!   (fire-and-forget submission).
//! - [`pool`] owns the receiving half and runs each action as a job on a
//!   bounded number of concurrent workers, sequentially per path.
//! - [`store`] provides the `RemoteStore` trait the jobs call into, plus the
//!   backends shipped with the binary.

pub mod dispatcher;
pub mod pool;
pub mod store;

pub use dispatcher::ActionDispatcher;
pub use pool::{RemoteKeys, WorkerPool};
pub use store::{build_store, DirectoryStore, LogStore, RemoteStore, StoreFuture};
