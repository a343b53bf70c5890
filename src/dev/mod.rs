//! The device module contains the drivers for each of the supported port expanders.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod ht8574;
pub mod tca95xx_16bit;
