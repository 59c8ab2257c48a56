use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::{OverflowPolicy, PushError, Ring};

/// Fixed-capacity, thread-safe FIFO with blocking wait predicates.
///
/// All state sits behind one mutex and one condition variable. Every
/// successful push or pop, and [`close`](Self::close), wakes all waiters.
///
/// Behaviour on overflow is chosen once at construction through
/// [`OverflowPolicy`]. With [`OverflowPolicy::DropOldest`] a push into a full
/// ring silently evicts the head; callers that cannot tolerate loss must pace
/// themselves with [`wait_for_not_full`](Self::wait_for_not_full) or use
/// [`OverflowPolicy::Block`].
///
/// Closing is the out-of-band end-of-stream signal: once closed, pushes are
/// rejected and [`pop_wait`](Self::pop_wait) returns `None` as soon as the
/// ring is drained.
pub struct BoundedRing<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
    policy: OverflowPolicy,
}

struct State<T> {
    ring: Ring<T>,
    closed: bool,
}

impl<T> BoundedRing<T> {
    /// Creates an empty ring.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self::from_ring(Ring::new(capacity), policy)
    }

    fn from_ring(ring: Ring<T>, policy: OverflowPolicy) -> Self {
        Self {
            state: Mutex::new(State {
                ring,
                closed: false,
            }),
            cond: Condvar::new(),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks while `pending` holds, returning the re-acquired guard.
    fn wait_while<'a, F>(
        &self,
        guard: MutexGuard<'a, State<T>>,
        pending: F,
    ) -> MutexGuard<'a, State<T>>
    where
        F: FnMut(&mut State<T>) -> bool,
    {
        self.cond
            .wait_while(guard, pending)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_until<F>(&self, mut ready: F)
    where
        F: FnMut(&Ring<T>) -> bool,
    {
        let guard = self.lock();
        drop(self.wait_while(guard, |s| !ready(&s.ring)));
    }

    /// Inserts `item` at the tail.
    ///
    /// When the ring is full, [`OverflowPolicy::Block`] waits for a free slot
    /// and [`OverflowPolicy::DropOldest`] evicts the head first. Fails only if
    /// the ring is (or becomes, while waiting) closed.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.lock();
        if self.policy == OverflowPolicy::Block {
            state = self.wait_while(state, |s| s.ring.is_full() && !s.closed);
        }
        if state.closed {
            return Err(PushError::Closed(item));
        }
        state.ring.push(item);
        drop(state);
        self.cond.notify_all();
        Ok(())
    }

    /// Removes the head without blocking. `None` if the ring is empty.
    pub fn pop(&self) -> Option<T> {
        let item = self.lock().ring.pop();
        if item.is_some() {
            self.cond.notify_all();
        }
        item
    }

    /// Removes the head, blocking until one is available.
    ///
    /// Returns `None` only when the ring is closed and empty, so a consumer
    /// looping on this never exits with items still queued.
    pub fn pop_wait(&self) -> Option<T> {
        let guard = self.lock();
        let mut state = self.wait_while(guard, |s| s.ring.is_empty() && !s.closed);
        let item = state.ring.pop();
        drop(state);
        if item.is_some() {
            self.cond.notify_all();
        }
        item
    }

    /// Marks the ring closed and wakes every waiter. Idempotent.
    ///
    /// Items already queued stay available to [`pop`](Self::pop) and
    /// [`pop_wait`](Self::pop_wait).
    pub fn close(&self) {
        self.lock().closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn count(&self) -> usize {
        self.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().ring.is_full()
    }

    pub fn is_half(&self) -> bool {
        let state = self.lock();
        state.ring.len() == state.ring.capacity() / 2
    }

    pub fn is_above_half(&self) -> bool {
        let state = self.lock();
        state.ring.len() > state.ring.capacity() / 2
    }

    pub fn is_below_half(&self) -> bool {
        let state = self.lock();
        state.ring.len() < state.ring.capacity() / 2
    }

    pub fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn wait_for_not_empty(&self) {
        self.wait_until(|r| !r.is_empty());
    }

    pub fn wait_for_not_full(&self) {
        self.wait_until(|r| !r.is_full());
    }

    pub fn wait_for_empty(&self) {
        self.wait_until(|r| r.is_empty());
    }

    pub fn wait_for_full(&self) {
        self.wait_until(|r| r.is_full());
    }

    pub fn wait_for_half(&self) {
        self.wait_until(|r| r.len() == r.capacity() / 2);
    }

    pub fn wait_for_above_half(&self) {
        self.wait_until(|r| r.len() > r.capacity() / 2);
    }

    pub fn wait_for_below_half(&self) {
        self.wait_until(|r| r.len() < r.capacity() / 2);
    }
}

impl<T: Clone> BoundedRing<T> {
    /// Clone of the head without removing it.
    pub fn front(&self) -> Option<T> {
        self.lock().ring.front().cloned()
    }

    /// Clone of the tail without removing it.
    pub fn back(&self) -> Option<T> {
        self.lock().ring.back().cloned()
    }

    /// Snapshot of the queued items, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().ring.iter().cloned().collect()
    }
}

/// Copies the current contents under lock into a new, open ring with its
/// own mutex and condition variable.
impl<T: Clone> Clone for BoundedRing<T> {
    fn clone(&self) -> Self {
        let ring = self.lock().ring.clone();
        Self::from_ring(ring, self.policy)
    }
}

impl<T> fmt::Debug for BoundedRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedRing")
            .field("len", &state.ring.len())
            .field("capacity", &state.ring.capacity())
            .field("closed", &state.closed)
            .field("policy", &self.policy)
            .finish()
    }
}
