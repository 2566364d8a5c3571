//! Synchronization primitives for ISR-safe access.

use core::cell::RefCell;
use critical_section::Mutex;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }

    /// Consume the cell and return the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T> Sync for CriticalSectionCell<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_mutates_and_returns() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(1);
        let doubled = cell.with(|v| {
            *v += 20;
            *v * 2
        });
        assert_eq!(doubled, 42);
        assert_eq!(cell.with(|v| *v), 21);
    }

    #[test]
    fn try_with_fails_while_borrowed() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(7);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(7));
    }

    #[test]
    fn static_usage() {
        static CELL: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        CELL.with(|v| *v = 100);
        assert_eq!(CELL.with(|v| *v), 100);
    }

    #[test]
    fn into_inner_returns_value() {
        let cell = CriticalSectionCell::new(Some(5u8));
        cell.with(|v| *v = None);
        assert_eq!(cell.into_inner(), None);
    }
}
