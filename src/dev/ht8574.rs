//! Support for the `HT8574` "8-bit I2C I/O expander" and compatible `PCF8574` style chips
//!
//! These chips have no register pointer: a single-byte write sets the output latch and a
//! single-byte read returns the pin levels.  There is no direction register either; a pin is used
//! as input by driving it high.  The direction register of this driver only exists in software.
use crate::driver::Binding;
use crate::{Error, ExpanderConfig, ExpanderFlags, HostMutex, I2cBridge, I2cHost};

/// Timeout of each I2C transfer.
const I2C_TIMEOUT_MS: u32 = 10;

const IO_COUNT: u8 = 8;

/// Output latch value on power-up.
const OUT_REG_DEFAULT: u8 = 0xff;

/// 7-bit address for the given state of the address pins.
pub const fn address(a0: bool, a1: bool, a2: bool) -> u8 {
    0x20 | ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8)
}

/// `HT8574` "8-bit I2C I/O expander"
pub struct Ht8574<'a, H: I2cHost, M> {
    bus: Binding<'a, H, M>,
    direction: u8,
    output: u8,
}

impl<'a, H, M> Ht8574<'a, H, M>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
{
    /// Attach to the chip at 7-bit `address` on `port` and reset it.
    ///
    /// If the reset fails the device is detached again and the reset error is returned.
    pub fn new(bridge: &I2cBridge<'a, M>, port: u8, address: u8) -> Result<Self, Error<H::Error>> {
        log::info!("ht8574 driver version {}", env!("CARGO_PKG_VERSION"));

        let bus = Binding::attach(bridge, port, address, I2C_TIMEOUT_MS).map_err(|e| {
            log::error!("adding i2c device {:#04x} failed", address);
            e
        })?;

        let mut dev = Self {
            bus,
            direction: 0,
            output: 0,
        };
        if let Err(e) = crate::IoExpander::reset(&mut dev) {
            log::error!("resetting ht8574 at {:#04x} failed", address);
            dev.bus.detach();
            return Err(e);
        }
        Ok(dev)
    }

    pub fn port(&self) -> u8 {
        self.bus.port()
    }
}

impl<'a, H, M> crate::IoExpander for Ht8574<'a, H, M>
where
    H: I2cHost,
    M: HostMutex<Host = H>,
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
        let mut buf = [0x00];
        self.bus.receive(&mut buf).map_err(|e| {
            log::error!("read input reg failed: {:?}", e);
            Error::Transport(e)
        })?;
        Ok(buf[0] as u32)
    }

    fn write_output_reg(&mut self, value: u32) -> Result<(), Error<Self::BusError>> {
        let value = value as u8;
        self.bus.transmit(&[value]).map_err(|e| {
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
        self.direction = value as u8;
        Ok(())
    }

    fn read_direction_reg(&self) -> u32 {
        self.direction as u32
    }

    fn reset(&mut self) -> Result<(), Error<Self::BusError>> {
        self.write_output_reg(OUT_REG_DEFAULT as u32)
    }

    fn destroy(self) {
        log::debug!("removing ht8574 at {:#04x}", self.bus.address());
        self.bus.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::Ht8574;
    use crate::testing::{Event, FakeError, FakeHost};
    use crate::{Direction, Error, HalHost, I2cBridge, IoExpander, PortExt};
    use core::cell::RefCell;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn ht8574() {
        let expectations = [
            // reset
            mock_i2c::Transaction::write(0x20, vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00]),
            mock_i2c::Transaction::read(0x20, vec![0b0100_0000]),
            mock_i2c::Transaction::write(0x20, vec![0x5a]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let host = RefCell::new(HalHost::new());
        assert!(host.borrow_mut().install(0, bus.clone()).is_ok());
        let bridge = I2cBridge::new(&host);

        let mut ht = Ht8574::new(&bridge, 0, super::address(false, false, false)).unwrap();
        assert_eq!(ht.read_output_reg(), 0xff);
        assert_eq!(ht.read_direction_reg(), 0x00);

        ht.write_output_reg(0x00).unwrap();
        assert_eq!(ht.read_output_reg(), 0x00);

        assert_eq!(ht.read_input_reg().unwrap(), 0x40);

        // truncated to the register width
        ht.write_output_reg(0x1_5a).unwrap();
        assert_eq!(ht.read_output_reg(), 0x5a);

        ht.destroy();
        bus.done();
    }

    #[test]
    fn failed_write_keeps_cache() {
        let expectations = [
            mock_i2c::Transaction::write(0x21, vec![0xff]),
            mock_i2c::Transaction::write(0x21, vec![0x0f]).with_error(ErrorKind::Other),
            mock_i2c::Transaction::read(0x21, vec![0x00]).with_error(ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let host = RefCell::new(HalHost::new());
        assert!(host.borrow_mut().install(1, bus.clone()).is_ok());
        let bridge = I2cBridge::new(&host);

        let mut ht = Ht8574::new(&bridge, 1, 0x21).unwrap();
        assert_eq!(ht.port(), 1);
        assert!(ht.write_output_reg(0x0f).is_err());
        assert_eq!(ht.read_output_reg(), 0xff);
        assert!(ht.read_input_reg().is_err());

        ht.destroy();
        bus.done();
    }

    #[test]
    fn direction_is_software_only() {
        let host = RefCell::new(FakeHost::with_buses(&[0]));
        let bridge = I2cBridge::new(&host);

        let mut ht = Ht8574::new(&bridge, 0, 0x20).unwrap();
        ht.write_direction_reg(0x1_3c).unwrap();
        assert_eq!(ht.read_direction_reg(), 0x3c);
        assert_eq!(
            host.borrow().transfers(),
            vec![Event::Transmit(0x20, vec![0xff])]
        );
    }

    #[test]
    fn timeouts_are_not_retried() {
        let host = RefCell::new(FakeHost::with_buses(&[0]));
        let bridge = I2cBridge::new(&host);
        let mut ht = Ht8574::new(&bridge, 0, 0x20).unwrap();

        host.borrow_mut().script([Err(FakeError::Timeout)]);
        let err = ht.write_output_reg(0x00).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(ht.read_output_reg(), 0xff);
        assert_eq!(host.borrow().resets(), 0);
    }

    #[test]
    fn failed_reset_detaches() {
        let mut fake = FakeHost::with_buses(&[0]);
        fake.script([Err(FakeError::Nack)]);
        let host = RefCell::new(fake);
        let bridge = I2cBridge::new(&host);

        let result = Ht8574::new(&bridge, 0, 0x20);
        assert_eq!(result.err(), Some(Error::Transport(FakeError::Nack)));
        assert_eq!(
            host.borrow().events,
            vec![
                Event::Attach {
                    port: 0,
                    address: 0x20,
                    speed_hz: crate::DEFAULT_SPEED_HZ
                },
                Event::Transmit(0x20, vec![0xff]),
                Event::Detach(0x20),
            ]
        );
    }

    #[test]
    fn construction_checks_port_and_bus() {
        let host = RefCell::new(FakeHost::with_buses(&[0]));
        let bridge = I2cBridge::new(&host);

        assert_eq!(
            Ht8574::new(&bridge, crate::MAX_PORTS, 0x20).err(),
            Some(Error::InvalidArgument)
        );
        assert_eq!(
            Ht8574::new(&bridge, 1, 0x20).err(),
            Some(Error::InvalidState)
        );
        assert!(host.borrow().events.is_empty());
    }

    #[test]
    fn destroy_swallows_detach_failure() {
        let host = RefCell::new(FakeHost::with_buses(&[0]));
        let bridge = I2cBridge::new(&host);
        let ht = Ht8574::new(&bridge, 0, 0x20).unwrap();

        host.borrow_mut().fail_detach = Some(FakeError::Nack);
        ht.destroy();
        assert_eq!(host.borrow().events.last(), Some(&Event::Detach(0x20)));
    }

    #[test]
    fn pin_level_api() {
        let host = RefCell::new(FakeHost::with_buses(&[0]));
        let bridge = I2cBridge::new(&host);
        let mut ht = Ht8574::new(&bridge, 0, 0x20).unwrap();

        // all pins start out as outputs
        ht.set_level(0x01, false).unwrap();
        ht.set_dir(0x80, Direction::Input).unwrap();
        assert_eq!(ht.read_direction_reg(), 0x80);
        assert_eq!(ht.set_level(0x80, false), Err(Error::InvalidState));

        host.borrow_mut().rx(&[0x81]);
        assert_eq!(ht.get_level(0x80).unwrap(), 0x80);

        assert_eq!(
            host.borrow().transfers(),
            vec![
                Event::Transmit(0x20, vec![0xff]),
                Event::Transmit(0x20, vec![0xfe]),
                Event::Receive(0x20, 1),
            ]
        );
    }
}
