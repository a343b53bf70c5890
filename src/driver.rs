use crate::retry::{retry_on_timeout, RetryPolicy};
use crate::{Error, HostMutex, I2cBridge, I2cHost};
use embedded_hal::delay::DelayNs;

/// A device attached to one bus of a shared host.
///
/// This is the part every expander driver has in common: where the chip lives and how to move
/// bytes to and from it, with or without timeout recovery.
pub(crate) struct Binding<'a, H: I2cHost, M> {
    host: &'a M,
    port: u8,
    address: u8,
    device: H::Device,
    timeout_ms: u32,
}

impl<'a, H, M> Binding<'a, H, M>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
{
    pub(crate) fn attach(
        bridge: &I2cBridge<'a, M>,
        port: u8,
        address: u8,
        timeout_ms: u32,
    ) -> Result<Self, Error<H::Error>> {
        let device = bridge.add_device(port, address)?;
        Ok(Self {
            host: bridge.host(),
            port,
            address,
            device,
            timeout_ms,
        })
    }

    pub(crate) fn port(&self) -> u8 {
        self.port
    }

    pub(crate) fn address(&self) -> u8 {
        self.address
    }

    pub(crate) fn transmit(&self, bytes: &[u8]) -> Result<(), H::Error> {
        self.host
            .lock(|h| h.transmit(&self.device, bytes, self.timeout_ms))
    }

    pub(crate) fn receive(&self, buffer: &mut [u8]) -> Result<(), H::Error> {
        self.host
            .lock(|h| h.receive(&self.device, buffer, self.timeout_ms))
    }

    pub(crate) fn transmit_retried<D: DelayNs>(
        &self,
        policy: &RetryPolicy,
        delay: &mut D,
        bytes: &[u8],
    ) -> Result<(), H::Error> {
        retry_on_timeout(self.host, self.port, policy, delay, |h| {
            h.transmit(&self.device, bytes, self.timeout_ms)
        })
    }

    pub(crate) fn receive_retried<D: DelayNs>(
        &self,
        policy: &RetryPolicy,
        delay: &mut D,
        buffer: &mut [u8],
    ) -> Result<(), H::Error> {
        retry_on_timeout(self.host, self.port, policy, delay, |h| {
            h.receive(&self.device, &mut buffer[..], self.timeout_ms)
        })
    }

    /// Detach from the host.  Failures are logged and otherwise ignored.
    pub(crate) fn detach(self) {
        let Self {
            host,
            port,
            address,
            device,
            ..
        } = self;
        if let Err(e) = host.lock(|h| h.detach(device)) {
            log::warn!(
                "detaching device {:#04x} from i2c bus {} failed: {:?}",
                address,
                port,
                e
            );
        }
    }
}
