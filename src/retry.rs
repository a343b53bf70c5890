//! Bounded retries with bus recovery for I2C transfers that time out.
//!
//! A timeout on I2C usually means a peripheral is still stretching the clock or the bus is
//! contended.  Before each retry the bus is reset to idle SDA/SCL and the caller backs off for a
//! growing amount of time.  Any other failure is returned right away.
use crate::{HostMutex, I2cHost, TransportError};
use embedded_hal::delay::DelayNs;

/// Backoff in milliseconds after the 1st, 2nd and 3rd timeout.
pub const DEFAULT_BACKOFF_MS: [u32; 3] = [2, 5, 10];

/// Retry schedule for a single transport operation.
///
/// The operation is attempted once plus once per entry of the schedule.  The result of the last
/// attempt is returned as-is, timeout or not, and no bus reset follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff_ms: &'static [u32],
}

impl RetryPolicy {
    pub const fn new(backoff_ms: &'static [u32]) -> Self {
        Self { backoff_ms }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self { backoff_ms: &[] }
    }

    /// Total number of attempts, including the first one.
    pub fn attempts(&self) -> usize {
        self.backoff_ms.len() + 1
    }

    pub fn backoff_ms(&self) -> &'static [u32] {
        self.backoff_ms
    }

    /// Run `op`, calling `recover` and sleeping on `delay` after every timeout that still has a
    /// retry left.
    pub fn run<T, E, D, OP, REC>(&self, delay: &mut D, mut op: OP, mut recover: REC) -> Result<T, E>
    where
        E: TransportError,
        D: DelayNs,
        OP: FnMut() -> Result<T, E>,
        REC: FnMut(),
    {
        for (retry, &backoff) in self.backoff_ms.iter().enumerate() {
            match op() {
                Err(e) if e.is_timeout() => {
                    log::warn!(
                        "i2c timeout, resetting bus and retrying in {} ms ({}/{})",
                        backoff,
                        retry + 1,
                        self.backoff_ms.len()
                    );
                    recover();
                    delay.delay_ms(backoff);
                }
                result => return result,
            }
        }
        op()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&DEFAULT_BACKOFF_MS)
    }
}

/// Run `op` against the host behind `host`, resetting bus `port` whenever it times out.
///
/// The host is locked separately for every attempt and every reset, so other devices on the
/// same host can make progress while this one backs off.  A failing reset is ignored.
pub fn retry_on_timeout<M, H, D, T, OP>(
    host: &M,
    port: u8,
    policy: &RetryPolicy,
    delay: &mut D,
    mut op: OP,
) -> Result<T, H::Error>
where
    M: HostMutex<Host = H>,
    H: I2cHost,
    D: DelayNs,
    OP: FnMut(&mut H) -> Result<T, H::Error>,
{
    policy.run(
        delay,
        || host.lock(|h| op(h)),
        || {
            host.lock(|h| {
                if h.has_bus(port) {
                    let _ = h.reset_bus(port);
                }
            })
        },
    )
}
