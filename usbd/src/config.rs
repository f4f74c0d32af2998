//! # Build-Time Configuration Surface
//!
//! Typed equivalents of the compile-time knobs the vendored USB engine is
//! built with: which class drivers exist, link speed, FIFO sizes and the
//! transfer mode of the controller. Everything here is constructed once as
//! an immutable value and never touched again at runtime.

/// USB 2.0 signaling rate of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 12 Mbps, 64-byte bulk packets
    Full,
    /// 480 Mbps, 512-byte bulk packets
    High,
}

impl Speed {
    /// Maximum bulk endpoint packet size at this speed
    pub const fn bulk_packet_size(self) -> u16 {
        match self {
            Speed::Full => 64,
            Speed::High => 512,
        }
    }
}

/// How the controller moves endpoint data
///
/// DMA mode needs cache maintenance on SoCs with a data cache, so it carries
/// the cache line size the engine aligns its transfer buffers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    /// CPU-driven transfers from the interrupt handler
    SlaveIrq,
    /// Controller-driven DMA with cache-line-aligned buffers
    Dma {
        /// L1 data cache line size in bytes
        cache_line: usize,
    },
}

/// Number of instances of each device class compiled into the composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassSet {
    pub cdc: u8,
    pub msc: u8,
    pub hid: u8,
    pub midi: u8,
    pub vendor: u8,
}

impl ClassSet {
    /// The JPEG Stream composition: a single vendor bulk interface
    pub const VENDOR_ONLY: Self = Self { cdc: 0, msc: 0, hid: 0, midi: 0, vendor: 1 };

    /// Device-level (class, subclass, protocol) triad
    ///
    /// A composition containing CDC must advertise the Miscellaneous class
    /// with the Interface Association protocol so hosts group its interface
    /// pair; everything else reports class 0 and defers to the interfaces.
    pub const fn device_class_triad(&self) -> (u8, u8, u8) {
        if self.cdc > 0 { (0xEF, 0x02, 0x01) } else { (0x00, 0x00, 0x00) }
    }

    /// Interfaces the composition occupies (CDC and MIDI take two each)
    pub const fn interface_count(&self) -> u8 {
        self.cdc * 2 + self.msc + self.hid + self.midi * 2 + self.vendor
    }
}

/// The whole build-time surface consumed by the vendored USB engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackConfig {
    /// Class drivers compiled in
    pub classes: ClassSet,
    /// Highest speed the link may train to
    pub max_speed: Speed,
    /// Slave/IRQ or DMA endpoint transfers
    pub transfer_mode: TransferMode,
    /// Control endpoint max packet size (8, 16, 32 or 64)
    pub ep0_max_packet: u8,
    /// Vendor class receive FIFO, sized to absorb a burst of frame data
    pub vendor_rx_fifo: usize,
    /// Vendor class transmit FIFO, one bulk packet
    pub vendor_tx_fifo: usize,
}

impl StackConfig {
    /// Configuration the JPEG Stream device ships with: vendor-only class
    /// set, high-speed link, DMA transfers aligned to the 64-byte L1 cache
    /// line of the SoC.
    pub const fn new() -> Self {
        let max_speed = Speed::High;
        Self {
            classes: ClassSet::VENDOR_ONLY,
            max_speed,
            transfer_mode: TransferMode::Dma { cache_line: 64 },
            ep0_max_packet: 64,
            vendor_rx_fifo: 8192,
            vendor_tx_fifo: max_speed.bulk_packet_size() as usize,
        }
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new()
    }
}
