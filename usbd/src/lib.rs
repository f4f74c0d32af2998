//! # USB Device Composition Layer
//!
//! This crate provides the USB-facing identity of the JPEG Stream device:
//!
//! - **Descriptor Tables**: device, configuration and qualifier descriptors
//!   encoded bit-exactly against USB 2.0 Chapter 9
//! - **String Table**: UTF-16LE string descriptors for the host-visible names
//! - **Build-Time Configuration**: typed knobs mirroring what the vendored
//!   USB engine consumes at compile time
//! - **Lifecycle Wrapper**: init / poll-task / mounted / vendor-read facade
//!   over the external device stack and PHY
//!
//! ## Architecture
//!
//! ```text
//! Host ──► GET_DESCRIPTOR ──► device stack ──► DescriptorSet (this crate)
//!                                  │
//!                                  ▼
//! Host ──► bulk OUT 0x01 ──► vendor RX FIFO ──► Usbd::vendor_read ──► app
//! ```
//!
//! The enumeration engine, endpoint scheduling and DMA handling live in the
//! vendored USB stack and the SoC PHY. Both are reached through the
//! [`device::DeviceStack`] and [`device::UsbPhy`] traits, which keeps this
//! crate free of hardware dependencies and testable on the host.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod descriptor;
pub mod device;
pub mod strings;

// Re-export main types for convenience
pub use config::{ClassSet, Speed, StackConfig, TransferMode};
pub use descriptor::{DescriptorSet, DESCRIPTORS};
pub use device::{DeviceStack, PhyConfig, PhyError, Usbd, UsbPhy};
pub use strings::{StringIndex, StringTable, LANG_ENGLISH_US};

/// Espressif vendor ID
pub const USB_VID: u16 = 0x303A;
/// Product ID of the JPEG Stream device
pub const USB_PID: u16 = 0x4020;

/// Bulk OUT endpoint carrying JPEG frames, host to device
pub const EP_JPEG_OUT: u8 = 0x01;
/// Bulk IN endpoint, device to host
pub const EP_JPEG_IN: u8 = 0x81;

/// Host-visible manufacturer name
pub const MANUFACTURER: &str = "Espressif Systems";
/// Host-visible product name
pub const PRODUCT: &str = "Espressif Device";
/// Host-visible serial number
pub const SERIAL: &str = "123456";
/// Name of the vendor bulk interface
pub const VENDOR_INTERFACE_NAME: &str = "JPEG Stream";
