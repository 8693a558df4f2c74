//! Process-wide MemFile registry (component O) backing global pressure
//! release (component I, spec §4.I).
//!
//! The subsystem is single-threaded per spec §5, so a `thread_local!`
//! registry of weak handles is sufficient; there is no need for the
//! `Arc`/`Mutex` machinery a genuinely shared-across-threads registry would
//! require (and the original C implementation's equivalent, a bare linked
//! list of `memfile_T *`, is likewise unsynchronized).
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::memfile::MemFileInner;

thread_local! {
    static REGISTRY: RefCell<Vec<Weak<RefCell<MemFileInner>>>> = const { RefCell::new(Vec::new()) };
}

/// Register a newly opened `MemFile` so `release_all` can reach it later.
pub(crate) fn register(handle: &Rc<RefCell<MemFileInner>>) {
    REGISTRY.with(|r| r.borrow_mut().push(Rc::downgrade(handle)));
}

/// Evict unlocked, writable-or-clean blocks across every still-live
/// `MemFile` in the process. Returns whether any block was actually
/// released, matching the boolean `release_all()` contract in spec §6.2.
///
/// Dead registry entries (the owning `MemFile` was already dropped) are
/// pruned along the way.
pub fn release_all() -> bool {
    let mut released_any = false;
    REGISTRY.with(|r| {
        let handles = r.borrow().clone();
        for weak in &handles {
            if let Some(rc) = weak.upgrade() {
                let mut inner = rc.borrow_mut();
                if inner.release_pressure() {
                    released_any = true;
                }
            }
        }
        r.borrow_mut().retain(|w| w.strong_count() > 0);
    });
    released_any
}

#[cfg(test)]
pub(crate) fn registry_len() -> usize {
    REGISTRY.with(|r| r.borrow().len())
}
