use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Single-threaded deferred task queue driven by a virtual clock.
///
/// Tasks come back in due order; tasks due at the same instant come back in
/// the order they were scheduled. The clock only moves forward, and only when
/// the owner advances it.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// When the earliest pending task becomes due
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(e)| e.due)
    }

    /// Queue `task` to run `delay` after the current clock reading
    pub fn schedule(&mut self, delay: Duration, task: T) -> Duration {
        let due = self.now + delay;
        self.queue.push(Reverse(Entry {
            due,
            seq: self.seq,
            task,
        }));
        self.seq += 1;
        due
    }

    /// Pop the next task due at or before `until`, moving the clock to its due time
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        match self.queue.peek() {
            Some(Reverse(e)) if e.due <= until => {}
            _ => return None,
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Move the clock to `until` without running anything; never moves backwards
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Drain every task due at or before `until` and move the clock there
    pub fn drain_until(&mut self, until: Duration) -> Vec<T> {
        let mut tasks = Vec::new();
        while let Some(task) = self.pop_due(until) {
            tasks.push(task);
        }
        self.advance_to(until);
        tasks
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
