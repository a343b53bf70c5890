//! Scripted I2C host for tests that need to inject timeouts and observe bus resets.
use crate::{DeviceConfig, I2cHost, TransportError, MAX_PORTS};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeError {
    Timeout,
    Nack,
}

impl TransportError for FakeError {
    fn is_timeout(&self) -> bool {
        *self == FakeError::Timeout
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Init { port: u8, sda: i32, scl: i32, speed_hz: u32 },
    Attach { port: u8, address: u8, speed_hz: u32 },
    Detach(u8),
    Transmit(u8, Vec<u8>),
    Receive(u8, usize),
    Reset(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeDevice {
    pub port: u8,
    pub address: u8,
}

/// Every transmit/receive consumes the next scripted result; an empty script means success.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub buses: [bool; MAX_PORTS as usize],
    pub events: Vec<Event>,
    results: VecDeque<Result<(), FakeError>>,
    rx_data: VecDeque<Vec<u8>>,
    pub fail_init: Option<FakeError>,
    pub fail_attach: Option<FakeError>,
    pub fail_detach: Option<FakeError>,
    pub fail_reset: Option<FakeError>,
}

impl FakeHost {
    pub fn with_buses(ports: &[u8]) -> Self {
        let mut host = Self::default();
        for &p in ports {
            host.buses[p as usize] = true;
        }
        host
    }

    pub fn script<I: IntoIterator<Item = Result<(), FakeError>>>(&mut self, results: I) {
        self.results.extend(results);
    }

    pub fn rx(&mut self, data: &[u8]) {
        self.rx_data.push_back(data.to_vec());
    }

    pub fn next_result(&mut self) -> Result<(), FakeError> {
        self.results.pop_front().unwrap_or(Ok(()))
    }

    /// Transfers only, without attach/detach/reset bookkeeping.
    pub fn transfers(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Transmit(..) | Event::Receive(..)))
            .cloned()
            .collect()
    }

    pub fn resets(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Reset(_)))
            .count()
    }
}

impl I2cHost for FakeHost {
    type Device = FakeDevice;
    type Error = FakeError;

    fn init_bus(&mut self, port: u8, sda: i32, scl: i32, speed_hz: u32) -> Result<(), Self::Error> {
        self.events.push(Event::Init {
            port,
            sda,
            scl,
            speed_hz,
        });
        if let Some(e) = self.fail_init {
            return Err(e);
        }
        self.buses[port as usize] = true;
        Ok(())
    }

    fn has_bus(&self, port: u8) -> bool {
        self.buses.get(port as usize).copied().unwrap_or(false)
    }

    fn attach(&mut self, port: u8, config: DeviceConfig) -> Result<Self::Device, Self::Error> {
        self.events.push(Event::Attach {
            port,
            address: config.address,
            speed_hz: config.speed_hz,
        });
        if let Some(e) = self.fail_attach {
            return Err(e);
        }
        Ok(FakeDevice {
            port,
            address: config.address,
        })
    }

    fn detach(&mut self, device: Self::Device) -> Result<(), Self::Error> {
        self.events.push(Event::Detach(device.address));
        match self.fail_detach {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn transmit(
        &mut self,
        device: &Self::Device,
        bytes: &[u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.events
            .push(Event::Transmit(device.address, bytes.to_vec()));
        self.next_result()
    }

    fn receive(
        &mut self,
        device: &Self::Device,
        buffer: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.events.push(Event::Receive(device.address, buffer.len()));
        self.next_result()?;
        if let Some(data) = self.rx_data.pop_front() {
            buffer.copy_from_slice(&data);
        }
        Ok(())
    }

    fn reset_bus(&mut self, port: u8) -> Result<(), Self::Error> {
        self.events.push(Event::Reset(port));
        match self.fail_reset {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Delay that records requested millisecond sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    // backoff only ever sleeps whole milliseconds
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}
