use parking_lot::{Condvar, Mutex};

/// Countdown barrier for a wave of dispatched jobs.
///
/// The dispatcher calls [`add`](Countdown::add) once per job it hands to
/// worker threads; each job calls [`signal`](Countdown::signal) with its
/// identifier when it is done. [`wait`](Countdown::wait) blocks until every
/// added job has signalled. Identifiers of finished jobs accumulate until
/// they are collected with [`take_finished`](Countdown::take_finished).
pub struct Countdown {
    state: Mutex<CountdownState>,
    condition: Condvar,
}

struct CountdownState {
    pending: usize,
    finished: Vec<usize>,
}

impl Countdown {
    /// Creates a barrier with nothing pending.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CountdownState {
                pending: 0,
                finished: Vec::new(),
            }),
            condition: Condvar::new(),
        }
    }

    /// Registers `count` more outstanding jobs.
    pub fn add(&self, count: usize) {
        self.state.lock().pending += count;
    }

    /// Reports job `id` as done. Wakes waiters once nothing is pending.
    pub fn signal(&self, id: usize) {
        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(1);
        state.finished.push(id);
        if state.pending == 0 {
            self.condition.notify_all();
        }
    }

    /// Number of jobs that have not signalled yet.
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    /// Blocks until every registered job has signalled.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.pending > 0 {
            self.condition.wait(&mut state);
        }
    }

    /// Drains identifiers of jobs that signalled since the last call.
    pub fn take_finished(&self) -> Vec<usize> {
        std::mem::take(&mut self.state.lock().finished)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn wait_returns_immediately_when_empty() {
        let countdown = Countdown::new();
        countdown.wait();
        assert_eq!(countdown.pending(), 0);
    }

    #[test]
    fn wait_blocks_until_all_signalled() {
        let countdown = Arc::new(Countdown::new());
        countdown.add(3);

        let handles: Vec<_> = (0..3)
            .map(|id| {
                let countdown = Arc::clone(&countdown);
                std::thread::spawn(move || countdown.signal(id))
            })
            .collect();

        countdown.wait();
        assert_eq!(countdown.pending(), 0);
        let mut finished = countdown.take_finished();
        finished.sort_unstable();
        assert_eq!(finished, vec![0, 1, 2]);
        assert!(countdown.take_finished().is_empty());

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
