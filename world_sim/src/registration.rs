//! Process-wide kernel registration.
//!
//! Only one world may be alive at a time. The slot is taken when a world is built and
//! released when the returned guard drops.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{WorldSimError, WorldSimResult};

static KERNEL_ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub(crate) struct KernelRegistration(());

impl KernelRegistration {
    pub fn acquire() -> WorldSimResult<Self> {
        KERNEL_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| KernelRegistration(()))
            .map_err(|_| WorldSimError::AlreadyActive)
    }

    #[cfg(test)]
    pub fn is_active() -> bool {
        KERNEL_ACTIVE.load(Ordering::Acquire)
    }
}

impl Drop for KernelRegistration {
    fn drop(&mut self) {
        KERNEL_ACTIVE.store(false, Ordering::Release);
    }
}
