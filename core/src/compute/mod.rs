//! Cooperative compute primitives.
//!
//! - [`CancellationToken`] - shared flag polled by cooperative work items
//! - [`Countdown`] - barrier that releases waiters once every dispatched job reported back
//! - [`WorkerPool`] - fixed-size pool of OS threads running boxed jobs

mod cancellation;
mod countdown;
mod worker_pool;

pub use cancellation::{CancellationToken, Cancelled};
pub use countdown::Countdown;
pub use worker_pool::{DEFAULT_WORKER_THREADS, Job, WorkerPool};
