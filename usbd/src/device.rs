//! # Device Lifecycle Wrapper
//!
//! Thin facade over the two external collaborators: the SoC USB PHY and the
//! vendored device stack. The wrapper owns exactly two states, uninitialized
//! and running, with no way back; the device keeps serving USB until system
//! reset.
//!
//! Both collaborators sit behind traits so the wrapper can be driven on the
//! host with mock implementations.

use crate::config::{Speed, StackConfig};

/// Error codes surfaced by the hardware abstraction layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyError {
    /// Allocation of the PHY context failed
    NoMem,
    /// Requested controller or target does not exist on this SoC
    NotSupported,
    /// Conflicting or malformed configuration record
    InvalidArg,
    /// Transceiver failed to come up
    HwFail,
}

/// Which controller block drives the transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyController {
    Otg,
    SerialJtag,
}

/// Which transceiver the controller is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyTarget {
    /// On-chip UTMI transceiver, required for high speed
    Utmi,
    /// On-chip full-speed transceiver
    Internal,
    /// External transceiver on the ULPI pins
    External,
}

/// OTG role of the port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtgMode {
    Device,
    Host,
}

/// Configuration record handed to the PHY on installation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyConfig {
    pub controller: PhyController,
    pub target: PhyTarget,
    pub mode: OtgMode,
    pub speed: Speed,
}

impl PhyConfig {
    /// Device role on the OTG controller through the UTMI transceiver
    pub const fn device(speed: Speed) -> Self {
        Self {
            controller: PhyController::Otg,
            target: PhyTarget::Utmi,
            mode: OtgMode::Device,
            speed,
        }
    }
}

/// The SoC USB transceiver, acquired once during init
pub trait UsbPhy {
    /// Bring the transceiver up with the given configuration
    fn install(&mut self, config: &PhyConfig) -> Result<(), PhyError>;
}

/// The vendored USB engine behind its fixed entry points
///
/// Implementations are constructed over a [`crate::DescriptorSet`], which is
/// where the enumeration callbacks for device, configuration, qualifier and
/// string descriptors get their bytes.
pub trait DeviceStack {
    /// Start the engine; past this point the host may enumerate the device
    fn init(&mut self);

    /// One event-dispatch pass: bus events, control transfers and class
    /// driver callbacks all run inside this call
    fn poll(&mut self);

    /// Whether the host has configured the device
    fn mounted(&self) -> bool;

    /// Bytes queued in the vendor receive FIFO
    fn vendor_available(&self) -> usize;

    /// Drain up to `buf.len()` bytes from the vendor receive FIFO
    ///
    /// Never blocks; returns 0 when the FIFO is empty.
    fn vendor_read(&mut self, buf: &mut [u8]) -> usize;
}

/// The JPEG Stream device: PHY plus stack behind one small API
pub struct Usbd<P, S> {
    phy: P,
    stack: S,
    config: StackConfig,
    running: bool,
}

impl<P: UsbPhy, S: DeviceStack> Usbd<P, S> {
    pub fn new(phy: P, stack: S, config: StackConfig) -> Self {
        Self { phy, stack, config, running: false }
    }

    /// Acquire the PHY in device mode and start the stack
    ///
    /// The only failure of the whole layer: PHY installation. The error is
    /// logged and handed to the caller, who decides whether boot continues.
    /// No retry happens here. Stack startup itself has no failure path.
    pub fn init(&mut self) -> Result<(), PhyError> {
        let phy_config = PhyConfig::device(self.config.max_speed);
        if let Err(err) = self.phy.install(&phy_config) {
            #[cfg(feature = "defmt")]
            defmt::error!("usbd: USB PHY install failed: {}", err);
            return Err(err);
        }
        self.stack.init();
        self.running = true;
        #[cfg(feature = "defmt")]
        defmt::info!("usbd: device stack running");
        Ok(())
    }

    /// Drive the stack forever
    ///
    /// Runs the event dispatch in an unbounded loop and must therefore own
    /// its scheduling context (a dedicated task). All USB activity of the
    /// device happens inside this loop.
    pub fn run_task(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// One dispatch pass, the body of [`Self::run_task`]; does nothing
    /// until [`Self::init`] has run
    pub fn poll(&mut self) {
        if self.running {
            self.stack.poll();
        }
    }

    /// Whether enumeration completed and the host configured the device
    pub fn mounted(&self) -> bool {
        self.running && self.stack.mounted()
    }

    /// Bytes waiting on the vendor bulk OUT pipe; 0 before init
    pub fn vendor_available(&self) -> usize {
        if self.running { self.stack.vendor_available() } else { 0 }
    }

    /// Non-blocking read from the vendor bulk OUT pipe
    ///
    /// Returns the number of bytes copied into `buf`, 0 when nothing is
    /// queued or the device was never initialized.
    pub fn vendor_read(&mut self, buf: &mut [u8]) -> usize {
        if self.running { self.stack.vendor_read(buf) } else { 0 }
    }
}
