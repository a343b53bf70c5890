//! Support for the `TCA9555`/`TCA9535` family "16-bit I2C I/O expander"
//!
//! Registers are accessed through a register pointer with 16-bit values sent low byte first.
//! Every transfer goes through the timeout recovery of [`RetryPolicy`], and the input register
//! is read with a separate pointer write and data read instead of a repeated-start transfer,
//! which some host drivers handle unreliably.
use crate::driver::Binding;
use crate::{Error, ExpanderConfig, ExpanderFlags, HostMutex, I2cBridge, I2cHost, RetryPolicy};
use embedded_hal::delay::DelayNs;

/// Timeout of each I2C transfer.
const I2C_TIMEOUT_MS: u32 = 150;

const IO_COUNT: u8 = 16;

/// Register values on power-up: all pins inputs, output latches high.
const DIR_REG_DEFAULT: u16 = 0xffff;
const OUT_REG_DEFAULT: u16 = 0xffff;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    InputPort0 = 0x00,
    InputPort1 = 0x01,
    OutputPort0 = 0x02,
    OutputPort1 = 0x03,
    PolarityInversion0 = 0x04,
    PolarityInversion1 = 0x05,
    Configuration0 = 0x06,
    Configuration1 = 0x07,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// 7-bit address for the given state of the address pins.
pub const fn address(a0: bool, a1: bool, a2: bool) -> u8 {
    0x20 | ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8)
}

/// `TCA95xx` "16-bit I2C I/O expander"
pub struct Tca95xx16<'a, H: I2cHost, M, D> {
    bus: Binding<'a, H, M>,
    policy: RetryPolicy,
    delay: D,
    direction: u16,
    output: u16,
}

impl<'a, H, M, D> Tca95xx16<'a, H, M, D>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
    D: DelayNs,
{
    /// Attach to the chip at 7-bit `address` on `port` and reset it.
    ///
    /// `delay` is used for the backoff between retries of timed out transfers.
    pub fn new(
        bridge: &I2cBridge<'a, M>,
        port: u8,
        address: u8,
        delay: D,
    ) -> Result<Self, Error<H::Error>> {
        Self::with_retry_policy(bridge, port, address, delay, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        bridge: &I2cBridge<'a, M>,
        port: u8,
        address: u8,
        delay: D,
        policy: RetryPolicy,
    ) -> Result<Self, Error<H::Error>> {
        log::info!("tca95xx_16bit driver version {}", env!("CARGO_PKG_VERSION"));

        let bus = Binding::attach(bridge, port, address, I2C_TIMEOUT_MS).map_err(|e| {
            log::error!("adding i2c device {:#04x} failed", address);
            e
        })?;

        let mut dev = Self {
            bus,
            policy,
            delay,
            direction: 0,
            output: 0,
        };
        if let Err(e) = crate::IoExpander::reset(&mut dev) {
            log::error!("resetting tca95xx_16bit at {:#04x} failed", address);
            dev.bus.detach();
            return Err(e);
        }
        Ok(dev)
    }

    pub fn port(&self) -> u8 {
        self.bus.port()
    }

    fn write_reg(&mut self, reg: Regs, value: u16) -> Result<(), H::Error> {
        let [low, high] = value.to_le_bytes();
        self.bus
            .transmit_retried(&self.policy, &mut self.delay, &[reg.into(), low, high])
    }
}

impl<'a, H, M, D> crate::IoExpander for Tca95xx16<'a, H, M, D>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
    D: DelayNs,
{
    type BusError = H::Error;

    fn config(&self) -> ExpanderConfig {
        ExpanderConfig {
            io_count: IO_COUNT,
            flags: ExpanderFlags {
                dir_out_bit_zero: true,
                ..Default::default()
            },
        }
    }

    fn read_input_reg(&mut self) -> Result<u32, Error<Self::BusError>> {
        self.bus
            .transmit_retried(&self.policy, &mut self.delay, &[u8::from(Regs::InputPort0)])
            .map_err(|e| {
                log::error!("read input reg TX failed: {:?}", e);
                Error::Transport(e)
            })?;

        let mut buf = [0x00; 2];
        self.bus
            .receive_retried(&self.policy, &mut self.delay, &mut buf)
            .map_err(|e| {
                log::error!("read input reg RX failed: {:?}", e);
                Error::Transport(e)
            })?;

        Ok(u16::from_le_bytes(buf) as u32)
    }

    fn write_output_reg(&mut self, value: u32) -> Result<(), Error<Self::BusError>> {
        let value = value as u16;
        self.write_reg(Regs::OutputPort0, value).map_err(|e| {
            log::error!("write output reg failed: {:?}", e);
            Error::Transport(e)
        })?;
        self.output = value;
        Ok(())
    }

    fn read_output_reg(&self) -> u32 {
        self.output as u32
    }

    fn write_direction_reg(&mut self, value: u32) -> Result<(), Error<Self::BusError>> {
        let value = value as u16;
        self.write_reg(Regs::Configuration0, value).map_err(|e| {
            log::error!("write direction reg failed: {:?}", e);
            Error::Transport(e)
        })?;
        self.direction = value;
        Ok(())
    }

    fn read_direction_reg(&self) -> u32 {
        self.direction as u32
    }

    fn reset(&mut self) -> Result<(), Error<Self::BusError>> {
        self.write_direction_reg(DIR_REG_DEFAULT as u32)?;
        self.write_output_reg(OUT_REG_DEFAULT as u32)
    }

    fn destroy(self) {
        log::debug!("removing tca95xx_16bit at {:#04x}", self.bus.address());
        self.bus.detach();
    }
}
