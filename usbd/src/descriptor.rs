//! # USB Descriptor Tables
//!
//! Chapter 9 records describing the device to the host: one device
//! descriptor, one configuration holding the vendor bulk interface, and at
//! high speed a device qualifier. Hosts parse these byte for byte, so every
//! record encodes itself into a fixed array with the exact field order and
//! little-endian widths of the specification.
//!
//! The whole set is assembled once, in const context, from a
//! [`StackConfig`]; nothing here is built or mutated at runtime.

use crate::config::{Speed, StackConfig};
use crate::strings::{StringDescriptor, StringIndex, StringTable};

/// Descriptor type codes from USB 2.0 table 9-5
pub mod descriptor_type {
    pub const DEVICE: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
    pub const DEVICE_QUALIFIER: u8 = 0x06;
    pub const OTHER_SPEED_CONFIGURATION: u8 = 0x07;
}

/// Vendor-specific interface class
pub const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

/// Bulk transfer type in endpoint attributes
const TRANSFER_BULK: u8 = 0x02;

/// BCD release numbers reported by the device
const USB_RELEASE: u16 = 0x0200;
const DEVICE_RELEASE: u16 = 0x0100;

/// Standard device descriptor, USB 2.0 section 9.6.1
#[derive(Debug, Clone, Copy)]
pub struct DeviceDescriptor {
    pub bcd_usb: u16,
    pub device_class: u8,
    pub device_subclass: u8,
    pub device_protocol: u8,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bcd_device: u16,
    pub manufacturer_index: u8,
    pub product_index: u8,
    pub serial_index: u8,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const LEN: usize = 18;

    pub const fn from_config(config: &StackConfig) -> Self {
        let (class, subclass, protocol) = config.classes.device_class_triad();
        Self {
            bcd_usb: USB_RELEASE,
            device_class: class,
            device_subclass: subclass,
            device_protocol: protocol,
            max_packet_size0: config.ep0_max_packet,
            vendor_id: crate::USB_VID,
            product_id: crate::USB_PID,
            bcd_device: DEVICE_RELEASE,
            manufacturer_index: StringIndex::Manufacturer as u8,
            product_index: StringIndex::Product as u8,
            serial_index: StringIndex::Serial as u8,
            num_configurations: 1,
        }
    }

    pub const fn encode(&self) -> [u8; Self::LEN] {
        let usb = self.bcd_usb.to_le_bytes();
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let dev = self.bcd_device.to_le_bytes();
        [
            Self::LEN as u8,
            descriptor_type::DEVICE,
            usb[0],
            usb[1],
            self.device_class,
            self.device_subclass,
            self.device_protocol,
            self.max_packet_size0,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            dev[0],
            dev[1],
            self.manufacturer_index,
            self.product_index,
            self.serial_index,
            self.num_configurations,
        ]
    }
}

/// Device qualifier, USB 2.0 section 9.6.2
///
/// Served only on links that can train to high speed; it mirrors the device
/// descriptor so the host learns what the device would look like at the
/// other speed.
#[derive(Debug, Clone, Copy)]
pub struct DeviceQualifier {
    pub bcd_usb: u16,
    pub device_class: u8,
    pub device_subclass: u8,
    pub device_protocol: u8,
    pub max_packet_size0: u8,
    pub num_configurations: u8,
}

impl DeviceQualifier {
    pub const LEN: usize = 10;

    pub const fn from_config(config: &StackConfig) -> Self {
        let (class, subclass, protocol) = config.classes.device_class_triad();
        Self {
            bcd_usb: USB_RELEASE,
            device_class: class,
            device_subclass: subclass,
            device_protocol: protocol,
            max_packet_size0: config.ep0_max_packet,
            num_configurations: 1,
        }
    }

    pub const fn encode(&self) -> [u8; Self::LEN] {
        let usb = self.bcd_usb.to_le_bytes();
        [
            Self::LEN as u8,
            descriptor_type::DEVICE_QUALIFIER,
            usb[0],
            usb[1],
            self.device_class,
            self.device_subclass,
            self.device_protocol,
            self.max_packet_size0,
            self.num_configurations,
            0x00, // bReserved
        ]
    }
}

/// Configuration descriptor header, USB 2.0 section 9.6.3
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationHeader {
    pub total_length: u16,
    pub num_interfaces: u8,
    pub configuration_value: u8,
    pub configuration_index: u8,
    pub attributes: u8,
    pub max_power_2ma: u8,
}

impl ConfigurationHeader {
    pub const LEN: usize = 9;

    /// Bit 7 of the attributes is reserved and must read as one
    pub const ATTR_RESERVED: u8 = 0x80;

    pub const fn encode(&self) -> [u8; Self::LEN] {
        let total = self.total_length.to_le_bytes();
        [
            Self::LEN as u8,
            descriptor_type::CONFIGURATION,
            total[0],
            total[1],
            self.num_interfaces,
            self.configuration_value,
            self.configuration_index,
            self.attributes,
            self.max_power_2ma,
        ]
    }
}

/// Standard interface descriptor, USB 2.0 section 9.6.5
#[derive(Debug, Clone, Copy)]
pub struct InterfaceDescriptor {
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub interface_class: u8,
    pub interface_subclass: u8,
    pub interface_protocol: u8,
    pub interface_index: u8,
}

impl InterfaceDescriptor {
    pub const LEN: usize = 9;

    pub const fn encode(&self) -> [u8; Self::LEN] {
        [
            Self::LEN as u8,
            descriptor_type::INTERFACE,
            self.interface_number,
            self.alternate_setting,
            self.num_endpoints,
            self.interface_class,
            self.interface_subclass,
            self.interface_protocol,
            self.interface_index,
        ]
    }
}

/// Standard endpoint descriptor, USB 2.0 section 9.6.6
#[derive(Debug, Clone, Copy)]
pub struct EndpointDescriptor {
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointDescriptor {
    pub const LEN: usize = 7;

    pub const fn bulk(address: u8, max_packet_size: u16) -> Self {
        Self { address, attributes: TRANSFER_BULK, max_packet_size, interval: 0 }
    }

    pub const fn encode(&self) -> [u8; Self::LEN] {
        let packet = self.max_packet_size.to_le_bytes();
        [
            Self::LEN as u8,
            descriptor_type::ENDPOINT,
            self.address,
            self.attributes,
            packet[0],
            packet[1],
            self.interval,
        ]
    }
}

/// The vendor bulk interface: one interface record and its two endpoints
#[derive(Debug, Clone, Copy)]
pub struct VendorInterface {
    pub interface_number: u8,
    pub name_index: u8,
    pub ep_out: u8,
    pub ep_in: u8,
    pub packet_size: u16,
}

impl VendorInterface {
    pub const LEN: usize = InterfaceDescriptor::LEN + 2 * EndpointDescriptor::LEN;

    pub const fn jpeg_stream(speed: Speed) -> Self {
        Self {
            interface_number: 0,
            name_index: StringIndex::VendorJpeg as u8,
            ep_out: crate::EP_JPEG_OUT,
            ep_in: crate::EP_JPEG_IN,
            packet_size: speed.bulk_packet_size(),
        }
    }

    pub const fn encode(&self) -> [u8; Self::LEN] {
        let interface = InterfaceDescriptor {
            interface_number: self.interface_number,
            alternate_setting: 0,
            num_endpoints: 2,
            interface_class: CLASS_VENDOR_SPECIFIC,
            interface_subclass: 0x00,
            interface_protocol: 0x00,
            interface_index: self.name_index,
        }
        .encode();
        let out = EndpointDescriptor::bulk(self.ep_out, self.packet_size).encode();
        let inp = EndpointDescriptor::bulk(self.ep_in, self.packet_size).encode();

        let mut bytes = [0u8; Self::LEN];
        let mut i = 0;
        while i < interface.len() {
            bytes[i] = interface[i];
            i += 1;
        }
        let mut j = 0;
        while j < out.len() {
            bytes[i + j] = out[j];
            j += 1;
        }
        let mut k = 0;
        while k < inp.len() {
            bytes[i + j + k] = inp[k];
            k += 1;
        }
        bytes
    }
}

/// Encoded length of the full configuration descriptor
pub const CONFIGURATION_LEN: usize = ConfigurationHeader::LEN + VendorInterface::LEN;

const fn encode_configuration(config: &StackConfig) -> [u8; CONFIGURATION_LEN] {
    let header = ConfigurationHeader {
        total_length: CONFIGURATION_LEN as u16,
        num_interfaces: config.classes.interface_count(),
        configuration_value: 1,
        configuration_index: StringIndex::Language as u8,
        attributes: ConfigurationHeader::ATTR_RESERVED,
        max_power_2ma: 50, // 100 mA
    }
    .encode();
    let vendor = VendorInterface::jpeg_stream(config.max_speed).encode();

    let mut bytes = [0u8; CONFIGURATION_LEN];
    let mut i = 0;
    while i < header.len() {
        bytes[i] = header[i];
        i += 1;
    }
    let mut j = 0;
    while j < vendor.len() {
        bytes[i + j] = vendor[j];
        j += 1;
    }
    bytes
}

/// Everything the stack can be asked for during enumeration
///
/// Built once from a [`StackConfig`] and a [`StringTable`]; the accessors
/// answer the four descriptor queries synchronously, without blocking or
/// allocating, as they run inside control transfer handling.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSet {
    device: [u8; DeviceDescriptor::LEN],
    qualifier: [u8; DeviceQualifier::LEN],
    configuration: [u8; CONFIGURATION_LEN],
    high_speed: bool,
    strings: StringTable,
}

impl DescriptorSet {
    pub const fn new(config: &StackConfig, strings: StringTable) -> Self {
        Self {
            device: DeviceDescriptor::from_config(config).encode(),
            qualifier: DeviceQualifier::from_config(config).encode(),
            configuration: encode_configuration(config),
            high_speed: matches!(config.max_speed, Speed::High),
            strings,
        }
    }

    /// The fixed device descriptor; always present
    pub fn device_descriptor(&self) -> &[u8] {
        &self.device
    }

    /// The full configuration descriptor
    ///
    /// The device has a single configuration, so the index the host sent is
    /// not consulted.
    pub fn configuration_descriptor(&self, _index: u8) -> &[u8] {
        &self.configuration
    }

    /// The device qualifier, present only when the link can run high speed
    pub fn device_qualifier(&self) -> Option<&[u8]> {
        self.high_speed.then_some(&self.qualifier[..])
    }

    /// Other-speed configuration
    ///
    /// The device authors a single descriptor set, so this is always absent
    /// and the stack answers the request as unsupported.
    pub fn other_speed_configuration(&self, _index: u8) -> Option<&[u8]> {
        None
    }

    /// Encode the string descriptor for `index`, `None` past the table
    pub fn string_descriptor(&self, index: u8, langid: u16) -> Option<StringDescriptor> {
        self.strings.descriptor(index, langid)
    }
}

const STRING_ENTRIES: &[&str] = &[
    crate::MANUFACTURER,
    crate::PRODUCT,
    crate::SERIAL,
    crate::VENDOR_INTERFACE_NAME,
];

/// String table of the JPEG Stream device
pub const STRINGS: StringTable = StringTable::new(STRING_ENTRIES);

/// Configuration the shipping device is built with
pub const DEFAULT_CONFIG: StackConfig = StackConfig::new();

/// Descriptor set the shipping device enumerates with
pub static DESCRIPTORS: DescriptorSet = DescriptorSet::new(&DEFAULT_CONFIG, STRINGS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassSet;

    fn u16le(bytes: &[u8]) -> u16 {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    /// Walk a configuration blob, returning (type, record) pairs
    fn walk(blob: &[u8]) -> std::vec::Vec<(u8, &[u8])> {
        let mut records = std::vec::Vec::new();
        let mut at = 0;
        while at < blob.len() {
            let len = blob[at] as usize;
            assert!(len >= 2 && at + len <= blob.len(), "malformed record");
            records.push((blob[at + 1], &blob[at..at + len]));
            at += len;
        }
        records
    }

    #[test]
    fn test_device_descriptor_identity() {
        let device = DESCRIPTORS.device_descriptor();
        assert_eq!(device.len(), 18);
        assert_eq!(device[0], 18);
        assert_eq!(device[1], descriptor_type::DEVICE);
        assert_eq!(u16le(&device[2..]), 0x0200);
        assert_eq!(&device[4..7], &[0, 0, 0]);
        assert_eq!(device[7], 64); // bMaxPacketSize0
        assert_eq!(u16le(&device[8..]), 0x303A);
        assert_eq!(u16le(&device[10..]), 0x4020);
        assert_eq!(u16le(&device[12..]), 0x0100);
        assert_eq!(device[14], StringIndex::Manufacturer as u8);
        assert_eq!(device[15], StringIndex::Product as u8);
        assert_eq!(device[16], StringIndex::Serial as u8);
        assert_eq!(device[17], 1);
    }

    #[test]
    fn test_cdc_composition_reports_misc_iad_triad() {
        let config = StackConfig {
            classes: ClassSet { cdc: 1, ..ClassSet::VENDOR_ONLY },
            ..StackConfig::new()
        };
        let device = DeviceDescriptor::from_config(&config).encode();
        assert_eq!(&device[4..7], &[0xEF, 0x02, 0x01]);
        let qualifier = DeviceQualifier::from_config(&config).encode();
        assert_eq!(&qualifier[4..7], &[0xEF, 0x02, 0x01]);
    }

    #[test]
    fn test_configuration_total_length_is_exact() {
        let blob = DESCRIPTORS.configuration_descriptor(0);
        assert_eq!(blob.len(), CONFIGURATION_LEN);
        assert_eq!(u16le(&blob[2..]) as usize, blob.len());

        // Sum of the individual records covers the blob exactly
        let covered: usize = walk(blob).iter().map(|(_, record)| record.len()).sum();
        assert_eq!(covered, blob.len());
    }

    #[test]
    fn test_configuration_layout() {
        let blob = DESCRIPTORS.configuration_descriptor(0);
        let records = walk(blob);
        let types: std::vec::Vec<u8> = records.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            types,
            [
                descriptor_type::CONFIGURATION,
                descriptor_type::INTERFACE,
                descriptor_type::ENDPOINT,
                descriptor_type::ENDPOINT,
            ]
        );

        let header = records[0].1;
        assert_eq!(header[4], 1); // bNumInterfaces
        assert_eq!(header[5], 1); // bConfigurationValue
        assert_eq!(header[6], 0); // iConfiguration
        assert_eq!(header[7], 0x80); // bus powered, reserved bit
        assert_eq!(header[8], 50); // 100 mA

        let interface = records[1].1;
        assert_eq!(interface[2], 0); // bInterfaceNumber
        assert_eq!(interface[4], 2); // bNumEndpoints
        assert_eq!(interface[5], CLASS_VENDOR_SPECIFIC);
        assert_eq!(interface[8], StringIndex::VendorJpeg as u8);

        let (out, inp) = (records[2].1, records[3].1);
        assert_eq!(out[2], crate::EP_JPEG_OUT);
        assert_eq!(inp[2], crate::EP_JPEG_IN);
        for endpoint in [out, inp] {
            assert_eq!(endpoint[3], 0x02); // bulk
            assert_eq!(u16le(&endpoint[4..]), 512); // high speed
            assert_eq!(endpoint[6], 0); // bInterval
        }
    }

    #[test]
    fn test_full_speed_set_uses_64_byte_endpoints() {
        let config = StackConfig { max_speed: Speed::Full, ..StackConfig::new() };
        let set = DescriptorSet::new(&config, STRINGS);
        let records = walk(set.configuration_descriptor(0));
        assert_eq!(u16le(&records[2].1[4..]), 64);
        assert_eq!(u16le(&records[3].1[4..]), 64);
        // No qualifier on a full-speed-only link
        assert!(set.device_qualifier().is_none());
    }

    #[test]
    fn test_qualifier_mirrors_device_descriptor() {
        let qualifier = DESCRIPTORS.device_qualifier().unwrap();
        let device = DESCRIPTORS.device_descriptor();
        assert_eq!(qualifier.len(), 10);
        assert_eq!(qualifier[0], 10);
        assert_eq!(qualifier[1], descriptor_type::DEVICE_QUALIFIER);
        assert_eq!(&qualifier[2..8], &device[2..8]); // bcdUSB, triad, ep0 size
        assert_eq!(qualifier[8], 1); // bNumConfigurations
        assert_eq!(qualifier[9], 0); // bReserved
    }

    #[test]
    fn test_string_descriptors_reachable_through_the_set() {
        let lang = DESCRIPTORS.string_descriptor(0, 0xFFFF).unwrap();
        assert_eq!(lang.as_slice(), &[0x04, 0x03, 0x09, 0x04]);

        let name = DESCRIPTORS
            .string_descriptor(StringIndex::VendorJpeg as u8, crate::LANG_ENGLISH_US)
            .unwrap();
        assert_eq!(name.len(), 2 + 2 * "JPEG Stream".len());
        assert!(DESCRIPTORS.string_descriptor(9, crate::LANG_ENGLISH_US).is_none());
    }

    #[test]
    fn test_other_speed_configuration_is_absent() {
        assert!(DESCRIPTORS.other_speed_configuration(0).is_none());
        assert!(DESCRIPTORS.other_speed_configuration(1).is_none());
    }

    #[test]
    fn test_reencode_is_idempotent() {
        let config = StackConfig::new();
        let first = DescriptorSet::new(&config, STRINGS);
        let second = DescriptorSet::new(&config, STRINGS);
        assert_eq!(first.device_descriptor(), second.device_descriptor());
        assert_eq!(
            first.configuration_descriptor(0),
            second.configuration_descriptor(0)
        );
        assert_eq!(first.device_qualifier(), second.device_qualifier());
    }
}
