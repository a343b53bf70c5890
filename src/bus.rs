use embedded_hal::i2c as hal_i2c;
use embedded_hal::i2c::SevenBitAddress;

/// Number of I2C ports a host may expose.
pub const MAX_PORTS: u8 = 2;

/// Classification of transport failures for the retry logic.
pub trait TransportError: core::fmt::Debug {
    /// Whether the failure was a timeout (clock stretching, bus contention, stuck bus).
    ///
    /// Only timeouts are retried.  Every other failure is reported to the caller immediately.
    fn is_timeout(&self) -> bool;
}

/// Per-device settings used when attaching a device to a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub address: SevenBitAddress,
    pub speed_hz: u32,
}

/// The I2C master driver the expanders are built on.
///
/// This is the bus-handle style interface: buses are initialized per port, devices are attached
/// to a bus and all transfers go through the returned device handle.
pub trait I2cHost {
    /// Handle for a device attached to one of the buses.
    type Device;
    type Error: TransportError;

    /// Initialize the bus on `port` as master with the given pins and clock.
    fn init_bus(&mut self, port: u8, sda: i32, scl: i32, speed_hz: u32) -> Result<(), Self::Error>;

    /// Whether a live bus exists for `port`.
    fn has_bus(&self, port: u8) -> bool;

    fn attach(&mut self, port: u8, config: DeviceConfig) -> Result<Self::Device, Self::Error>;

    fn detach(&mut self, device: Self::Device) -> Result<(), Self::Error>;

    fn transmit(
        &mut self,
        device: &Self::Device,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error>;

    fn receive(
        &mut self,
        device: &Self::Device,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error>;

    /// Return SDA/SCL to idle after a failed transfer.
    fn reset_bus(&mut self, port: u8) -> Result<(), Self::Error>;
}

/// Errors of the [`HalHost`] adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError<E> {
    /// No bus was installed for the port.
    NoBus,
    /// The underlying embedded-hal bus failed.
    Bus(E),
}

impl<E: hal_i2c::Error> TransportError for HalError<E> {
    /// embedded-hal has no timeout kind; arbitration loss is the contended-bus case worth retrying.
    fn is_timeout(&self) -> bool {
        match self {
            HalError::Bus(e) => matches!(e.kind(), hal_i2c::ErrorKind::ArbitrationLoss),
            HalError::NoBus => false,
        }
    }
}

/// Device handle of the [`HalHost`] adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalDevice {
    port: u8,
    address: SevenBitAddress,
}

impl HalDevice {
    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }
}

/// [`I2cHost`] on top of plain `embedded_hal::i2c::I2c` buses.
///
/// Buses are configured by the HAL, so pins, clock speed and transfer timeouts passed in here are
/// not applied.  A bus reset is not expressible through embedded-hal and is a no-op.
pub struct HalHost<I2C> {
    buses: [Option<I2C>; MAX_PORTS as usize],
}

impl<I2C> HalHost<I2C> {
    pub fn new() -> Self {
        Self {
            buses: core::array::from_fn(|_| None),
        }
    }

    /// Make `bus` available as `port`, returning a bus that was installed there before.
    ///
    /// If `port` is not below [`MAX_PORTS`], `bus` is handed back as the error.
    pub fn install(&mut self, port: u8, bus: I2C) -> Result<Option<I2C>, I2C> {
        match self.buses.get_mut(port as usize) {
            Some(slot) => Ok(slot.replace(bus)),
            None => Err(bus),
        }
    }

    /// Take the bus for `port` back out of the host.
    pub fn release(&mut self, port: u8) -> Option<I2C> {
        self.buses.get_mut(port as usize).and_then(Option::take)
    }

    fn bus(&mut self, port: u8) -> Option<&mut I2C> {
        self.buses.get_mut(port as usize).and_then(Option::as_mut)
    }
}

impl<I2C> Default for HalHost<I2C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I2C: hal_i2c::I2c> I2cHost for HalHost<I2C> {
    type Device = HalDevice;
    type Error = HalError<I2C::Error>;

    fn init_bus(
        &mut self,
        port: u8,
        _sda: i32,
        _scl: i32,
        _speed_hz: u32,
    ) -> Result<(), Self::Error> {
        if self.has_bus(port) {
            Ok(())
        } else {
            Err(HalError::NoBus)
        }
    }

    fn has_bus(&self, port: u8) -> bool {
        matches!(self.buses.get(port as usize), Some(Some(_)))
    }

    fn attach(&mut self, port: u8, config: DeviceConfig) -> Result<Self::Device, Self::Error> {
        if !self.has_bus(port) {
            return Err(HalError::NoBus);
        }
        Ok(HalDevice {
            port,
            address: config.address,
        })
    }

    fn detach(&mut self, _device: Self::Device) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transmit(
        &mut self,
        device: &Self::Device,
        bytes: &[u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        let bus = self.bus(device.port).ok_or(HalError::NoBus)?;
        bus.write(device.address, bytes).map_err(HalError::Bus)
    }

    fn receive(
        &mut self,
        device: &Self::Device,
        buffer: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        let bus = self.bus(device.port).ok_or(HalError::NoBus)?;
        bus.read(device.address, buffer).map_err(HalError::Bus)
    }

    fn reset_bus(&mut self, _port: u8) -> Result<(), Self::Error> {
        Ok(())
    }
}
