//! # String Descriptor Table
//!
//! The host-visible names of the device, served as UTF-16LE string
//! descriptors during enumeration. Index 0 is not a string but the language
//! ID record, fixed to US English. The table entries are plain ASCII, so
//! encoding to UTF-16LE is zero-extension of each byte.

use heapless::Vec;

/// US English language ID, the only language the device reports
pub const LANG_ENGLISH_US: u16 = 0x0409;

/// Longest string served, in UTF-16 code units
///
/// One more unit holds the length/type header, bounding a descriptor at 32
/// units (64 bytes). Longer table entries are truncated, not rejected.
pub const MAX_STRING_UNITS: usize = 31;

/// Encoded size bound of one string descriptor in bytes
pub const STRING_DESC_CAPACITY: usize = 2 * (MAX_STRING_UNITS + 1);

/// An encoded string descriptor, ready to hand to the control endpoint
pub type StringDescriptor = Vec<u8, STRING_DESC_CAPACITY>;

/// Well-known indices into the device's string table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StringIndex {
    /// Language ID record, not a string
    Language = 0,
    Manufacturer = 1,
    Product = 2,
    Serial = 3,
    /// Name of the vendor bulk interface
    VendorJpeg = 4,
}

/// Ordered table of the device's strings, indexed from 1
///
/// Entry `n` of the table answers string index `n + 1`; index 0 is handled
/// separately as the language record.
#[derive(Debug, Clone, Copy)]
pub struct StringTable {
    entries: &'static [&'static str],
}

impl StringTable {
    pub const fn new(entries: &'static [&'static str]) -> Self {
        Self { entries }
    }

    /// Number of string entries, excluding the language record
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the descriptor for `index`
    ///
    /// Index 0 yields the 4-byte language record regardless of the langid
    /// the host asked for. Other indices encode the table entry, truncated
    /// to [`MAX_STRING_UNITS`] code units. An index past the table is
    /// answered with `None`, which the stack reports to the host as an
    /// unsupported descriptor rather than a fault.
    pub fn descriptor(&self, index: u8, _langid: u16) -> Option<StringDescriptor> {
        let mut payload = [0u8; STRING_DESC_CAPACITY];
        let len = if index == 0 {
            let lang = LANG_ENGLISH_US.to_le_bytes();
            payload[2] = lang[0];
            payload[3] = lang[1];
            4
        } else {
            let entry = *self.entries.get(index as usize - 1)?;
            let mut at = 2;
            for byte in entry.bytes().take(MAX_STRING_UNITS) {
                payload[at] = byte;
                payload[at + 1] = 0x00;
                at += 2;
            }
            at
        };
        payload[0] = len as u8;
        payload[1] = crate::descriptor::descriptor_type::STRING;
        StringDescriptor::from_slice(&payload[..len]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StringTable = StringTable::new(&[
        crate::MANUFACTURER,
        crate::PRODUCT,
        crate::SERIAL,
        crate::VENDOR_INTERFACE_NAME,
    ]);

    #[test]
    fn test_language_record_ignores_requested_langid() {
        for langid in [0u16, 0x0409, 0x0407, 0xFFFF] {
            let desc = TABLE.descriptor(0, langid).unwrap();
            assert_eq!(desc.as_slice(), &[0x04, 0x03, 0x09, 0x04]);
        }
    }

    #[test]
    fn test_product_string_encodes_utf16le() {
        let desc = TABLE
            .descriptor(StringIndex::Product as u8, LANG_ENGLISH_US)
            .unwrap();
        assert_eq!(desc[0] as usize, desc.len());
        assert_eq!(desc[1], 0x03);

        let units: std::vec::Vec<u16> = desc[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text: std::string::String = char::decode_utf16(units)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(text, "Espressif Device");
    }

    #[test]
    fn test_overlong_entry_truncates_to_31_units() {
        // 40 characters, must clamp instead of overflowing the record
        static LONG: StringTable =
            StringTable::new(&["0123456789012345678901234567890123456789"]);
        let desc = LONG.descriptor(1, LANG_ENGLISH_US).unwrap();
        assert_eq!(desc.len(), 2 + 2 * MAX_STRING_UNITS);
        assert_eq!(desc[0] as usize, desc.len());
        // Last surviving character is entry[30]
        assert_eq!(desc[desc.len() - 2], b'0');
        assert_eq!(desc[desc.len() - 1], 0x00);
    }

    #[test]
    fn test_out_of_table_index_is_absent() {
        assert!(TABLE.descriptor(5, LANG_ENGLISH_US).is_none());
        assert!(TABLE.descriptor(0xFF, LANG_ENGLISH_US).is_none());
    }

    #[test]
    fn test_serial_matches_device_identity() {
        let desc = TABLE
            .descriptor(StringIndex::Serial as u8, LANG_ENGLISH_US)
            .unwrap();
        assert_eq!(desc.len(), 2 + 2 * "123456".len());
        assert_eq!(&desc[2..4], &[b'1', 0x00]);
    }
}
