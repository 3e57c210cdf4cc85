//! Free-list reuse for short-lived agents.

use std::fmt;

use tracing::debug;

type Factory<T> = Box<dyn FnMut() -> T + Send + 'static>;
type ResetHook<T> = Box<dyn FnMut(&mut T) + Send + 'static>;

/// Cache of pre-built objects handed out by value.
///
/// `acquire` moves an object out of the free list, so a pooled object can never
/// be live and pooled at the same time. The reset hook runs on both `acquire`
/// and `release`, so callers never observe state left behind by a previous owner.
pub struct ObjectPool<T> {
    free: Vec<T>,
    refill: usize,
    allocated: usize,
    factory: Factory<T>,
    reset: ResetHook<T>,
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("free", &self.free.len())
            .field("refill", &self.refill)
            .field("allocated", &self.allocated)
            .finish()
    }
}

impl<T> ObjectPool<T> {
    /// Create a pool holding `initial` objects built by `factory`.
    ///
    /// `refill` objects are built whenever `acquire` finds the pool empty; it is
    /// raised to one if zero is supplied.
    pub fn new<F, R>(initial: usize, refill: usize, factory: F, reset: R) -> Self
    where
        F: FnMut() -> T + Send + 'static,
        R: FnMut(&mut T) + Send + 'static,
    {
        let mut pool = Self {
            free: Vec::with_capacity(initial),
            refill: refill.max(1),
            allocated: 0,
            factory: Box::new(factory),
            reset: Box::new(reset),
        };
        pool.expand(initial);
        pool
    }

    fn expand(&mut self, count: usize) {
        self.free.reserve(count);
        for _ in 0..count {
            self.free.push((self.factory)());
        }
        self.allocated += count;
    }

    /// Take an object out of the pool, building a fresh batch first if it is empty.
    pub fn acquire(&mut self) -> T {
        if self.free.is_empty() {
            debug!(refill = self.refill, "object pool exhausted; expanding");
            self.expand(self.refill);
        }
        let mut object = match self.free.pop() {
            Some(object) => object,
            None => (self.factory)(),
        };
        (self.reset)(&mut object);
        object
    }

    /// Return an object for later reuse.
    pub fn release(&mut self, mut object: T) {
        (self.reset)(&mut object);
        self.free.push(object);
    }

    /// Number of objects waiting in the free list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Total objects ever built by the factory.
    #[must_use]
    pub const fn allocated(&self) -> usize {
        self.allocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, PartialEq)]
    struct Slot {
        value: u32,
    }

    fn slot_pool(initial: usize) -> ObjectPool<Slot> {
        ObjectPool::new(initial, 5, Slot::default, |slot: &mut Slot| slot.value = 0)
    }

    #[test]
    fn prefills_initial_objects() {
        let pool = slot_pool(10);
        assert_eq!(pool.len(), 10);
        assert_eq!(pool.allocated(), 10);
    }

    #[test]
    fn empty_pool_expands_by_refill() {
        let mut pool = slot_pool(0);
        assert!(pool.is_empty());
        let _slot = pool.acquire();
        assert_eq!(pool.allocated(), 5);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn release_then_acquire_restores_size() {
        let mut pool = slot_pool(6);
        let taken: Vec<Slot> = (0..4).map(|_| pool.acquire()).collect();
        let before = pool.len();
        assert_eq!(before, 2);
        for slot in taken {
            pool.release(slot);
        }
        assert_eq!(pool.len(), 6);
        for _ in 0..4 {
            let _ = pool.acquire();
        }
        assert_eq!(pool.len(), before);
        assert_eq!(pool.allocated(), 6);
    }

    #[test]
    fn reset_runs_on_acquire_and_release() {
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resets);
        let mut pool = ObjectPool::new(1, 1, Slot::default, move |slot: &mut Slot| {
            counter.fetch_add(1, Ordering::SeqCst);
            slot.value = 0;
        });

        let mut slot = pool.acquire();
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        slot.value = 99;
        pool.release(slot);
        assert_eq!(resets.load(Ordering::SeqCst), 2);
        assert_eq!(pool.acquire(), Slot::default());
    }
}
