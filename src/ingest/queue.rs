//! Bounded blocking job queue with join-style draining.
//!
//! `put` blocks while the queue is full. Every item taken with `get` must be
//! acknowledged with `task_done`; `join` returns once all items ever put have
//! been acknowledged. `close` wakes idle consumers so they can exit.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct State<T> {
    items: VecDeque<T>,
    unfinished: usize,
    closed: bool,
    high_water: usize,
}

pub struct JobQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    all_done: Condvar,
}

impl<T> JobQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(State { items: VecDeque::with_capacity(capacity), unfinished: 0, closed: false, high_water: 0 }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    /// Enqueue, blocking while full. Hands the item back if the queue is closed.
    pub fn put(&self, item: T) -> Result<(), T> {
        let mut st = self.state.lock();
        while st.items.len() >= self.capacity && !st.closed {
            self.not_full.wait(&mut st);
        }
        if st.closed {
            return Err(item);
        }
        st.items.push_back(item);
        st.unfinished += 1;
        st.high_water = st.high_water.max(st.items.len());
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue, blocking while empty. None once closed and drained.
    pub fn get(&self) -> Option<T> {
        let mut st = self.state.lock();
        loop {
            if let Some(item) = st.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if st.closed {
                return None;
            }
            self.not_empty.wait(&mut st);
        }
    }

    /// Acknowledge one item previously returned by `get`.
    pub fn task_done(&self) {
        let mut st = self.state.lock();
        st.unfinished = st.unfinished.saturating_sub(1);
        if st.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every enqueued item has been acknowledged.
    pub fn join(&self) {
        let mut st = self.state.lock();
        while st.unfinished > 0 {
            self.all_done.wait(&mut st);
        }
    }

    pub fn close(&self) {
        let mut st = self.state.lock();
        st.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize { self.state.lock().items.len() }

    pub fn is_empty(&self) -> bool { self.state.lock().items.is_empty() }

    /// Most items ever queued at once.
    pub fn high_water(&self) -> usize { self.state.lock().high_water }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_and_close() {
        let q = JobQueue::new(4);
        q.put(1).unwrap();
        q.put(2).unwrap();
        assert_eq!(q.get(), Some(1));
        q.close();
        assert_eq!(q.get(), Some(2));
        assert_eq!(q.get(), None);
        assert_eq!(q.put(3), Err(3));
    }

    #[test]
    fn producer_blocks_when_full() {
        let q = JobQueue::new(900);
        let blocked_put_done = AtomicBool::new(false);
        thread::scope(|s| {
            for i in 0..900 {
                q.put(i).unwrap();
            }
            s.spawn(|| {
                q.put(900).unwrap();
                blocked_put_done.store(true, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(100));
            assert!(!blocked_put_done.load(Ordering::SeqCst), "901st put must block");
            assert_eq!(q.len(), 900);

            assert_eq!(q.get(), Some(0));
            q.task_done();
        });
        assert!(blocked_put_done.load(Ordering::SeqCst));
        assert_eq!(q.high_water(), 900);
    }

    #[test]
    fn join_waits_for_acknowledgements() {
        let q = JobQueue::new(8);
        let processed = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    while let Some(_job) = q.get() {
                        thread::sleep(Duration::from_millis(1));
                        processed.fetch_add(1, Ordering::SeqCst);
                        q.task_done();
                    }
                });
            }
            for i in 0..200 {
                q.put(i).unwrap();
            }
            q.join();
            assert_eq!(processed.load(Ordering::SeqCst), 200);
            assert!(q.high_water() <= q.capacity());
            q.close();
        });
    }
}
