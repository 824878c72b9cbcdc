// Cancellable timers over a caller-driven millisecond clock

use std::collections::{BTreeMap, HashMap};

/// Handle returned for every scheduled timer; used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Timer<T> {
    generation: u64,
    payload: T,
}

/// A timer that came due
#[derive(Debug, PartialEq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    pub due_ms: u64,
    pub generation: u64,
    pub payload: T,
}

/// Pending timers ordered by deadline.
///
/// Timers with equal deadlines fire in the order they were scheduled. Nothing
/// fires on its own: the owner calls [`TimerQueue::pop_due`] with the current
/// time, which keeps every callback on the caller's thread.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: BTreeMap<(u64, u64), Timer<T>>,
    deadlines: HashMap<u64, u64>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedule `payload` to fire at `due_ms`, tagged with `generation`
    pub fn schedule(&mut self, due_ms: u64, generation: u64, payload: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((due_ms, id), Timer { generation, payload });
        self.deadlines.insert(id, due_ms);
        TimerHandle(id)
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(due_ms) => self.pending.remove(&(due_ms, handle.0)).is_some(),
            None => false,
        }
    }

    /// Cancel every timer tagged with `generation`, returning how many were dropped
    pub fn cancel_generation(&mut self, generation: u64) -> usize {
        let doomed: Vec<(u64, u64)> = self
            .pending
            .iter()
            .filter(|(_, timer)| timer.generation == generation)
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.pending.remove(key);
            self.deadlines.remove(&key.1);
        }
        doomed.len()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        count
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<T>> {
        let (&(due_ms, id), _) = self.pending.iter().next()?;
        if due_ms > now_ms {
            return None;
        }
        let timer = self.pending.remove(&(due_ms, id))?;
        self.deadlines.remove(&id);
        Some(Fired {
            handle: TimerHandle(id),
            due_ms,
            generation: timer.generation,
            payload: timer.payload,
        })
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due_ms, _)| *due_ms)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, now: u64) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(fired) = queue.pop_due(now) {
            out.push(fired.payload);
        }
        out
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(300, 1, "c");
        queue.schedule(100, 1, "a");
        queue.schedule(200, 1, "b");

        assert_eq!(queue.next_deadline(), Some(100));
        assert_eq!(drain(&mut queue, 150), vec!["a"]);
        assert_eq!(drain(&mut queue, 1000), vec!["b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let mut queue = TimerQueue::new();
        queue.schedule(50, 1, "first");
        queue.schedule(50, 1, "second");
        queue.schedule(50, 1, "third");
        assert_eq!(drain(&mut queue, 50), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_cancel_single() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(10, 1, "a");
        queue.schedule(20, 1, "b");
        assert!(queue.is_pending(a));
        assert!(queue.cancel(a));
        assert!(!queue.is_pending(a));
        assert!(!queue.cancel(a));
        assert_eq!(drain(&mut queue, 100), vec!["b"]);
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(10, 1, "a");
        assert_eq!(queue.pop_due(10).map(|f| f.handle), Some(a));
        assert!(!queue.cancel(a));
    }

    #[test]
    fn test_cancel_generation() {
        let mut queue = TimerQueue::new();
        queue.schedule(10, 1, "old-a");
        queue.schedule(20, 2, "new");
        queue.schedule(30, 1, "old-b");
        assert_eq!(queue.cancel_generation(1), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(drain(&mut queue, 100), vec!["new"]);
    }

    #[test]
    fn test_clear() {
        let mut queue = TimerQueue::new();
        queue.schedule(10, 1, "a");
        queue.schedule(10, 2, "b");
        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.next_deadline(), None);
        assert_eq!(queue.pop_due(u64::MAX), None);
    }
}
