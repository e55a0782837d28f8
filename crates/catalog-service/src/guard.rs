//! Single-flight guard for catalog refreshes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Allows at most one refresh at a time.
///
/// Acquisition never blocks: a caller that loses the race gets `None` and
/// carries on with the entries already cached.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    running: Arc<AtomicBool>,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the refresh slot, or `None` if a refresh is already running.
    pub fn try_acquire(&self) -> Option<RefreshPermit> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RefreshPermit {
                flag: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Releases the refresh slot when dropped, including on panic or when the
/// refreshing future is cancelled.
#[derive(Debug)]
pub struct RefreshPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let guard = RefreshGuard::new();

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = Arc::new(RefreshGuard::new());
        let inner = guard.clone();

        let result = thread::spawn(move || {
            let _permit = inner.try_acquire().unwrap();
            panic!("refresh blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!guard.is_running());
    }

    #[test]
    fn test_only_one_thread_wins() {
        let guard = Arc::new(RefreshGuard::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let start = Arc::new(Barrier::new(8));
        let attempted = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let winners = winners.clone();
                let start = start.clone();
                let attempted = attempted.clone();
                thread::spawn(move || {
                    start.wait();
                    let permit = guard.try_acquire();
                    if permit.is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    // hold the permit until every thread has tried
                    attempted.wait();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(!guard.is_running());
    }
}
