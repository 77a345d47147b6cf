/*!
 * Initialize-Once Slot
 *
 * Atomic construct-and-publish for lazily created shared values.
 *
 * Racing callers may each build a candidate; exactly one is published and
 * every caller observes that one. Losing candidates are handed back so the
 * caller can release them explicitly.
 */

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Result of a failed install: the published winner and the rejected candidate
pub struct Contended<T> {
    pub winner: Arc<T>,
    pub loser: Arc<T>,
}

/// Lazily populated slot with compare-and-swap publication
pub struct OnceSlot<T> {
    slot: ArcSwapOption<T>,
}

impl<T> OnceSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Current value without triggering construction
    #[inline]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Return the published value, constructing a candidate if the slot is empty.
    ///
    /// `init` may run on several threads at once; only one result is kept.
    pub fn get_or_init<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.get() {
            return existing;
        }

        match self.try_install(Arc::new(init())) {
            Ok(installed) => installed,
            Err(contended) => contended.winner,
        }
    }

    /// Publish `candidate` only if the slot is still empty
    pub fn try_install(&self, candidate: Arc<T>) -> Result<Arc<T>, Contended<T>> {
        let empty: Option<Arc<T>> = None;
        let previous = self
            .slot
            .compare_and_swap(&empty, Some(Arc::clone(&candidate)));

        match &*previous {
            None => Ok(candidate),
            Some(winner) => Err(Contended {
                winner: Arc::clone(winner),
                loser: candidate,
            }),
        }
    }

    /// Unconditionally publish `value`, returning what it replaced
    pub fn replace(&self, value: Arc<T>) -> Option<Arc<T>> {
        self.slot.swap(Some(value))
    }

    /// Empty the slot, returning the previous value
    pub fn take(&self) -> Option<Arc<T>> {
        self.slot.swap(None)
    }

    /// Empty the slot only if it still holds `current` (pointer identity)
    pub fn compare_and_clear(&self, current: &Arc<T>) -> bool {
        let expected = Some(Arc::clone(current));
        let previous = self.slot.compare_and_swap(&expected, None::<Arc<T>>);
        matches!(&*previous, Some(prev) if Arc::ptr_eq(prev, current))
    }
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
