use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

/// Number of worker threads used when the caller does not configure one.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Type-erased job executed on a worker thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads fed through a single job channel.
///
/// Jobs run in submission order per thread but complete in any order.
/// Dropping the pool closes the channel and joins every thread after the
/// queued jobs have drained.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use lumen_core::compute::WorkerPool;
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// {
///     let pool = WorkerPool::new(2);
///     for _ in 0..8 {
///         let counter = Arc::clone(&counter);
///         pool.submit(Box::new(move || {
///             counter.fetch_add(1, Ordering::Relaxed);
///         }));
///     }
/// }
/// assert_eq!(counter.load(Ordering::Relaxed), 8);
/// ```
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `thread_count` workers (at least one).
    pub fn new(thread_count: usize) -> Self {
        let thread_count = thread_count.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let threads = (0..thread_count)
            .filter_map(|index| {
                let receiver = Arc::clone(&receiver);
                std::thread::Builder::new()
                    .name(format!("lumen-worker-{index}"))
                    .spawn(move || worker_loop(&receiver))
                    .map_err(|e| log::error!("Failed to spawn worker thread {index}: {e}"))
                    .ok()
            })
            .collect();

        Self {
            sender: Some(sender),
            threads,
        }
    }

    /// Number of live worker threads.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Queues `job`. If no worker could be spawned the job runs inline.
    pub fn submit(&self, job: Job) {
        if self.threads.is_empty() {
            job();
            return;
        }
        if let Some(sender) = &self.sender
            && let Err(mpsc::SendError(job)) = sender.send(job)
        {
            log::warn!("Worker pool channel closed; running job inline");
            job();
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_THREADS)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

fn worker_loop(receiver: &Mutex<mpsc::Receiver<Job>>) {
    crate::set_thread_name!("lumen worker");
    loop {
        let job = receiver.lock().recv();
        match job {
            Ok(job) => job(),
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn zero_threads_clamps_to_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.thread_count(), 1);
    }

    #[test]
    fn jobs_run_on_worker_threads() {
        let main_thread = std::thread::current().id();
        let (tx, rx) = mpsc::channel();
        let pool = WorkerPool::new(2);
        pool.submit(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));
        let worker_thread = rx.recv().unwrap();
        assert_ne!(worker_thread, main_thread);
    }

    #[test]
    fn drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(3);
            for _ in 0..32 {
                let counter = Arc::clone(&counter);
                pool.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }));
            }
        }
        assert_eq!(counter.load(Ordering::Relaxed), 32);
    }
}
