//! Bridge from the legacy per-port I2C configuration to the bus-handle based [`I2cHost`].
//!
//! Older code configures a port once with pins, pull-ups and clock speed.  The bridge applies
//! such a configuration to the host and remembers the clock speed per port, so devices attached
//! later run at the rate the bus was set up for.
use crate::{DeviceConfig, Error, HostMutex, I2cHost, MAX_PORTS};

/// Clock speed for devices on ports that were never configured through the bridge.
///
/// The bus may have been set up elsewhere at an unknown rate; 100 kHz is the safe choice on
/// electrically marginal buses.
pub const DEFAULT_SPEED_HZ: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cMode {
    Slave,
    Master,
}

/// Legacy style port configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyConfig {
    pub mode: I2cMode,
    pub sda_io_num: i32,
    pub scl_io_num: i32,
    pub sda_pullup_en: bool,
    pub scl_pullup_en: bool,
    /// Master clock in Hz.
    pub clk_speed: u32,
}

impl LegacyConfig {
    pub fn master(sda_io_num: i32, scl_io_num: i32, clk_speed: u32) -> Self {
        Self {
            mode: I2cMode::Master,
            sda_io_num,
            scl_io_num,
            sda_pullup_en: true,
            scl_pullup_en: true,
            clk_speed,
        }
    }
}

/// Owns the per-port speed table and hands out device attachments on a shared host.
pub struct I2cBridge<'a, M> {
    host: &'a M,
    speed_hz: [u32; MAX_PORTS as usize],
}

impl<'a, M> I2cBridge<'a, M> {
    pub fn new(host: &'a M) -> Self {
        Self {
            host,
            speed_hz: [0; MAX_PORTS as usize],
        }
    }

    /// The mutex-wrapped host this bridge operates on.
    pub fn host(&self) -> &'a M {
        self.host
    }

    /// Last speed recorded for `port`, or `0` if none was recorded or the port is invalid.
    pub fn get_speed_hz(&self, port: u8) -> u32 {
        self.speed_hz.get(port as usize).copied().unwrap_or(0)
    }

    /// Releasing a port is deliberately a no-op.
    ///
    /// Buses are shared between many devices (and often with code outside this crate), so a
    /// single user must not tear one down.
    pub fn deinit(&mut self, port: u8) {
        log::debug!("keeping i2c bus {} alive on deinit", port);
    }
}

impl<'a, H, M> I2cBridge<'a, M>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
{
    /// Apply a legacy configuration to `port`.
    ///
    /// The clock speed is only recorded for master mode, but the bus is initialized either way.
    pub fn init_from_legacy_config(
        &mut self,
        port: u8,
        config: &LegacyConfig,
    ) -> Result<(), Error<H::Error>> {
        if port >= MAX_PORTS {
            log::error!("invalid i2c port {}", port);
            return Err(Error::InvalidArgument);
        }

        if config.mode == I2cMode::Master {
            self.speed_hz[port as usize] = config.clk_speed;
        }

        self.host
            .lock(|h| {
                h.init_bus(
                    port,
                    config.sda_io_num,
                    config.scl_io_num,
                    config.clk_speed,
                )
            })
            .map_err(|e| {
                log::error!("initializing i2c bus {} failed: {:?}", port, e);
                Error::Transport(e)
            })
    }

    /// Attach a device with 7-bit `address` to the live bus on `port`.
    ///
    /// The device runs at the speed recorded for the port or [`DEFAULT_SPEED_HZ`].
    pub fn add_device(&self, port: u8, address: u8) -> Result<H::Device, Error<H::Error>> {
        if port >= MAX_PORTS || address > 0x7f {
            log::error!("invalid i2c port {} or address {:#04x}", port, address);
            return Err(Error::InvalidArgument);
        }

        let speed_hz = match self.get_speed_hz(port) {
            0 => DEFAULT_SPEED_HZ,
            hz => hz,
        };

        self.host.lock(|h| {
            if !h.has_bus(port) {
                log::error!("i2c bus {} not initialized", port);
                return Err(Error::InvalidState);
            }
            h.attach(port, DeviceConfig { address, speed_hz })
                .map_err(Error::Transport)
        })
    }
}
