/*!
 * Read-Copy-Update (RCU) Cell
 * Zero-contention reads for values that are replaced wholesale
 */

use arc_swap::ArcSwap;
use std::sync::Arc;

/// RCU-protected value with zero-contention reads
///
/// # Performance
///
/// - **Reads**: atomic pointer load
/// - **Writes**: build a new value, then swap
/// - **Best for**: values replaced wholesale and read on every item
///   (endpoint containers)
pub struct RcuCell<T> {
    inner: ArcSwap<T>,
}

impl<T> RcuCell<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Load current value (zero-contention)
    #[inline(always)]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace value entirely
    #[inline]
    pub fn store(&self, new_value: T) {
        self.inner.store(Arc::new(new_value));
    }

    /// Swap value and return old one
    #[inline]
    pub fn swap(&self, new_value: T) -> Arc<T> {
        self.inner.swap(Arc::new(new_value))
    }
}

impl<T: Default> Default for RcuCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RcuCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RcuCell").field(&*self.load()).finish()
    }
}
