//! Sends one JPEG file to the JPEG Stream device.
//!
//! The device expects each frame prefixed with its total length (payload
//! plus the 4-byte prefix itself) as a little-endian u32, streamed over the
//! vendor bulk OUT endpoint.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};
use rusb::{DeviceHandle, GlobalContext};
use thiserror::Error;

use usbd::{EP_JPEG_OUT, USB_PID, USB_VID};

#[derive(Parser, Debug)]
#[command(version, about = "Send a JPEG frame to the JPEG Stream device")]
struct Args {
    /// JPEG file to send
    image: PathBuf,

    /// Bulk transfer timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

#[derive(Error, Debug)]
enum SendError {
    #[error("failed to read {0}: {1}")]
    Image(PathBuf, std::io::Error),
    #[error("device {USB_VID:04x}:{USB_PID:04x} not found")]
    DeviceNotFound,
    #[error("usb transfer failed: {0}")]
    Usb(#[from] rusb::Error),
}

fn main() -> Result<(), SendError> {
    env_logger::init();
    let args = Args::parse();

    let payload =
        fs::read(&args.image).map_err(|err| SendError::Image(args.image.clone(), err))?;
    debug!("read {} ({} bytes)", args.image.display(), payload.len());

    let device = open_device()?;
    let framed = frame(&payload);
    let written = device.write_bulk(
        EP_JPEG_OUT,
        &framed,
        Duration::from_millis(args.timeout_ms),
    )?;
    info!("sent {written} of {} bytes", framed.len());
    Ok(())
}

fn open_device() -> Result<DeviceHandle<GlobalContext>, SendError> {
    let device =
        rusb::open_device_with_vid_pid(USB_VID, USB_PID).ok_or(SendError::DeviceNotFound)?;
    // A kernel driver may have claimed the vendor interface; not having one
    // attached is the common case and not an error.
    let _ = device.detach_kernel_driver(0);
    device.set_active_configuration(1)?;
    device.claim_interface(0)?;
    Ok(device)
}

/// Prefix `payload` with the total frame length as a little-endian u32
fn frame(payload: &[u8]) -> Vec<u8> {
    let total = (payload.len() + 4) as u32;
    let mut framed = Vec::with_capacity(payload.len() + 4);
    framed.extend_from_slice(&total.to_le_bytes());
    framed.extend_from_slice(payload);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prefixes_total_length() {
        let framed = frame(&[0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(framed.len(), 8);
        assert_eq!(&framed[..4], &8u32.to_le_bytes());
        assert_eq!(&framed[4..], &[0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_empty_payload_still_carries_prefix() {
        let framed = frame(&[]);
        assert_eq!(framed, 4u32.to_le_bytes());
    }
}
