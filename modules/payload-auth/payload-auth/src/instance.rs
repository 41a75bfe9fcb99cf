//! Process-wide slot for a lazily built auth instance.
//!
//! The slot takes no lock while building. Concurrent first callers may each
//! run their initializer; every one of them gets the instance it built and the
//! last store wins. [`AuthInstanceSlot::reset`] clears the slot so the next
//! caller rebuilds.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

pub struct AuthInstanceSlot<T> {
    slot: ArcSwapOption<T>,
}

impl<T> AuthInstanceSlot<T> {
    /// Creates an empty slot. Usable in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: ArcSwapOption::const_empty(),
        }
    }

    /// The current instance, if one has been built.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Returns the current instance, building it with `init` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns the initializer's error; the slot stays empty in that case.
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(existing) = self.slot.load_full() {
            return Ok(existing);
        }
        let built = Arc::new(init().await?);
        self.slot.store(Some(Arc::clone(&built)));
        debug!("auth instance initialized");
        Ok(built)
    }

    /// Clears the slot. The next `get_or_try_init` builds a fresh instance;
    /// handles already given out stay valid.
    pub fn reset(&self) {
        if self.slot.swap(None).is_some() {
            debug!("auth instance reset");
        }
    }
}

impl<T> Default for AuthInstanceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AuthInstanceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInstanceSlot")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static GLOBAL: AuthInstanceSlot<String> = AuthInstanceSlot::new();

    #[tokio::test]
    async fn test_initializer_runs_once() {
        let slot = AuthInstanceSlot::<u32>::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = slot
                .get_or_try_init(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                })
                .await
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let slot = AuthInstanceSlot::<u32>::new();
        let err = slot
            .get_or_try_init(|| async { Err::<u32, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(!slot.is_initialized());

        let value = slot
            .get_or_try_init(|| async { Ok::<_, &str>(1) })
            .await
            .unwrap();
        assert_eq!(*value, 1);
    }

    #[tokio::test]
    async fn test_reset_forces_rebuild() {
        let first = GLOBAL
            .get_or_try_init(|| async { Ok::<_, ()>("first".to_owned()) })
            .await
            .unwrap();
        assert_eq!(first.as_str(), "first");

        GLOBAL.reset();
        assert!(GLOBAL.get().is_none());
        assert_eq!(first.as_str(), "first");

        let second = GLOBAL
            .get_or_try_init(|| async { Ok::<_, ()>("second".to_owned()) })
            .await
            .unwrap();
        assert_eq!(second.as_str(), "second");
        assert_eq!(GLOBAL.get().as_deref().map(String::as_str), Some("second"));

        GLOBAL.reset();
        GLOBAL.reset();
        assert!(!GLOBAL.is_initialized());
    }
}
