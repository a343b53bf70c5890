/// Common interface for mutex implementations guarding the I2C host.
///
/// A single [`I2cHost`](crate::I2cHost) is usually shared between the bridge and any number of
/// expander devices.  Each of them holds a reference to the mutex and locks it for exactly one
/// transport primitive at a time; the lock is never held across a retry backoff.
/// `io-expander` already implements this trait for a number of existing mutex types:
///
/// | Mutex | Feature Name | Notes |
/// | --- | --- | --- |
/// | [`core::cell::RefCell`] | _always available_ | For sharing within a single execution context. |
/// | [`std::sync::Mutex`][mutex-std] | `std` | For platforms where `std` is available. |
/// | [`critical_section::Mutex`][mutex-cs] | `critical-section` | Use critical-section to ensure synchronized access. |
///
/// [mutex-std]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
/// [mutex-cs]: https://docs.rs/critical-section/latest/critical_section/struct.Mutex.html
///
/// For other mutex types, a custom implementation is needed.  Due to the orphan rule, it might be
/// necessary to wrap it in a newtype.
pub trait HostMutex {
    /// The I2C host that is wrapped inside this mutex.
    type Host;

    /// Create a new mutex of this type.
    fn create(v: Self::Host) -> Self;

    /// Lock the mutex and give a closure access to the host inside.
    fn lock<R, F: FnOnce(&mut Self::Host) -> R>(&self, f: F) -> R;
}

impl<T> HostMutex for core::cell::RefCell<T> {
    type Host = T;

    fn create(v: Self::Host) -> Self {
        core::cell::RefCell::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Host) -> R>(&self, f: F) -> R {
        let mut v = self.borrow_mut();
        f(&mut v)
    }
}

#[cfg(any(test, feature = "std"))]
impl<T> HostMutex for std::sync::Mutex<T> {
    type Host = T;

    fn create(v: Self::Host) -> Self {
        std::sync::Mutex::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Host) -> R>(&self, f: F) -> R {
        // A panic while holding the host leaves it in an unknown bus state either way.
        let mut v = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut v)
    }
}

#[cfg(feature = "critical-section")]
impl<T> HostMutex for critical_section::Mutex<core::cell::RefCell<T>> {
    type Host = T;

    fn create(v: Self::Host) -> Self {
        critical_section::Mutex::new(core::cell::RefCell::new(v))
    }

    fn lock<R, F: FnOnce(&mut Self::Host) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| {
            let mut v = self.borrow_ref_mut(cs);
            f(&mut v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HostMutex;

    #[test]
    fn refcell_lock_gives_mutable_access() {
        let m = <core::cell::RefCell<u32> as HostMutex>::create(1);
        m.lock(|v| *v += 41);
        assert_eq!(m.lock(|v| *v), 42);
    }

    #[test]
    fn std_mutex_lock_gives_mutable_access() {
        let m = <std::sync::Mutex<u32> as HostMutex>::create(7);
        HostMutex::lock(&m, |v| *v *= 6);
        assert_eq!(HostMutex::lock(&m, |v| *v), 42);
    }
}
