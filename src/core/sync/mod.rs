/*!
 * Synchronization Primitives
 *
 * Lock-free publication helpers for shared configuration state:
 * - `RcuCell` for values replaced wholesale and read on hot paths
 * - `OnceSlot` for lazily constructed values published by compare-and-swap
 */

mod once;
mod rcu;

pub use once::{Contended, OnceSlot};
pub use rcu::RcuCell;
