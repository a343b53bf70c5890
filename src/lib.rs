//! Drivers for I2C GPIO port-expanders with bus timeout recovery.
//!
//! Devices are attached through an [`I2cBridge`], which owns the per-port bus configuration, and
//! share one [`I2cHost`] behind a [`HostMutex`].  All drivers implement [`IoExpander`]; pin level
//! helpers for any driver come with [`PortExt`].
#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

mod bridge;
mod bus;
mod common;
pub mod dev;
mod driver;
mod error;
mod mutex;
pub mod retry;
#[cfg(test)]
mod testing;

pub use bridge::{I2cBridge, I2cMode, LegacyConfig, DEFAULT_SPEED_HZ};
pub use bus::{DeviceConfig, HalDevice, HalError, HalHost, I2cHost, TransportError, MAX_PORTS};
pub use common::{Direction, ExpanderConfig, ExpanderFlags, IoExpander, PortExt};
pub use error::Error;
pub use mutex::HostMutex;
pub use retry::RetryPolicy;

pub use dev::ht8574::Ht8574;
pub use dev::tca95xx_16bit::Tca95xx16;
