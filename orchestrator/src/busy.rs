//! Single-operation gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set while an operation runs; a second operation is refused, not queued.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag busy. `None` if it already was.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, including on early returns and panics.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn guard_is_released_on_error_paths() {
        fn fails(flag: &BusyFlag) -> Result<(), ()> {
            let _g = flag.try_acquire().ok_or(())?;
            Err(())
        }
        let flag = BusyFlag::new();
        assert!(fails(&flag).is_err());
        assert!(!flag.is_busy());
    }
}
