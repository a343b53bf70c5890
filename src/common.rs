use crate::Error;

/// Bit conventions of an expander's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpanderFlags {
    /// A 0 bit in the direction register makes the pin an output.
    pub dir_out_bit_zero: bool,
    /// A 0 bit in the input register means the pin is high.
    pub input_high_bit_zero: bool,
    /// A 0 bit in the output register drives the pin high.
    pub output_high_bit_zero: bool,
}

/// Static description an expander driver declares about its chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderConfig {
    /// Number of IO pins; register values never have bits at or above this set.
    pub io_count: u8,
    pub flags: ExpanderFlags,
}

impl ExpanderConfig {
    /// Mask with one bit set for each IO pin of the chip.
    pub fn io_mask(&self) -> u32 {
        match self.io_count {
            0 => 0,
            n if n >= 32 => u32::MAX,
            n => (1 << n) - 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Register-level access every expander driver provides.
///
/// Output and direction registers are cached in the driver: reading them back never touches the
/// bus and always returns the last value that was written successfully (or the reset default).
/// A failed write leaves the cache untouched.  Values are truncated to the register width.
pub trait IoExpander {
    /// Error type of the underlying I2C host.
    type BusError;

    fn config(&self) -> ExpanderConfig;

    /// Read the current pin levels from the input register.
    fn read_input_reg(&mut self) -> Result<u32, Error<Self::BusError>>;

    fn write_output_reg(&mut self, value: u32) -> Result<(), Error<Self::BusError>>;

    fn read_output_reg(&self) -> u32;

    fn write_direction_reg(&mut self, value: u32) -> Result<(), Error<Self::BusError>>;

    fn read_direction_reg(&self) -> u32;

    /// Put the chip back into its power-up register state.
    fn reset(&mut self) -> Result<(), Error<Self::BusError>>;

    /// Detach from the bus and drop the driver.
    ///
    /// This cannot fail; a failing detach is only logged.
    fn destroy(self)
    where
        Self: Sized;
}

/// Pin-level operations on top of the register interface of any [`IoExpander`].
pub trait PortExt: IoExpander {
    /// Set the direction of all pins in `pin_mask`.
    ///
    /// The direction register is only written if it actually changes.
    fn set_dir(&mut self, pin_mask: u32, dir: Direction) -> Result<(), Error<Self::BusError>> {
        let config = self.config();
        let pin_mask = clip_mask(&config, pin_mask);

        let old = self.read_direction_reg();
        let set_bits = (dir == Direction::Output) != config.flags.dir_out_bit_zero;
        let new = if set_bits {
            old | pin_mask
        } else {
            old & !pin_mask
        };

        if new != old {
            self.write_direction_reg(new)?;
        }
        Ok(())
    }

    /// Drive all pins in `pin_mask` high (`true`) or low (`false`).
    ///
    /// All pins in the mask must currently be outputs, otherwise nothing is written and
    /// [`Error::InvalidState`] is returned.
    fn set_level(&mut self, pin_mask: u32, level: bool) -> Result<(), Error<Self::BusError>> {
        let config = self.config();
        let pin_mask = clip_mask(&config, pin_mask);

        let inputs = input_pins(&config, self.read_direction_reg()) & pin_mask;
        if inputs != 0 {
            log::error!(
                "pin {} is an input, can't set its level",
                inputs.trailing_zeros()
            );
            return Err(Error::InvalidState);
        }

        let old = self.read_output_reg();
        let set_bits = level != config.flags.output_high_bit_zero;
        let new = if set_bits {
            old | pin_mask
        } else {
            old & !pin_mask
        };

        if new != old {
            self.write_output_reg(new)?;
        }
        Ok(())
    }

    /// Read the levels of the pins in `pin_mask`; a set bit means the pin is high.
    fn get_level(&mut self, pin_mask: u32) -> Result<u32, Error<Self::BusError>> {
        let config = self.config();
        let pin_mask = clip_mask(&config, pin_mask);

        let input = self.read_input_reg()?;
        if config.flags.input_high_bit_zero {
            Ok(!input & pin_mask)
        } else {
            Ok(input & pin_mask)
        }
    }

    /// Log direction, input and output level of every pin.
    fn print_state(&mut self) -> Result<(), Error<Self::BusError>> {
        let config = self.config();
        let input = self.get_level(config.io_mask())?;
        let inputs = input_pins(&config, self.read_direction_reg());
        let output = if config.flags.output_high_bit_zero {
            !self.read_output_reg()
        } else {
            self.read_output_reg()
        };

        log::info!("current status:");
        for i in 0..config.io_count {
            let bit = 1u32 << i;
            log::info!(
                "  io{:02}: {}, input {}, output {}",
                i,
                if inputs & bit != 0 { "in " } else { "out" },
                (input & bit != 0) as u8,
                (output & bit != 0) as u8,
            );
        }
        Ok(())
    }
}

impl<T: IoExpander + ?Sized> PortExt for T {}

fn clip_mask(config: &ExpanderConfig, pin_mask: u32) -> u32 {
    let io_mask = config.io_mask();
    if pin_mask & !io_mask != 0 {
        log::warn!(
            "pin mask {:#x} out of range, bits above {} are ignored",
            pin_mask,
            config.io_count.saturating_sub(1)
        );
    }
    pin_mask & io_mask
}

/// Bits of all pins configured as inputs in the direction register value `dir`.
fn input_pins(config: &ExpanderConfig, dir: u32) -> u32 {
    let inputs = if config.flags.dir_out_bit_zero {
        dir
    } else {
        !dir
    };
    inputs & config.io_mask()
}
