use std::io::{Cursor, Read};

use binrw::{binrw, BinRead};

pub use error::{Error, ItemError};
pub use extract::{extract_all, extract_file, Extraction, ExtractedItem, OutputDir, OutputSink};
pub use fields::{Device, FsType};
pub use naming::resolve_name;

pub mod crc;
mod error;
mod extract;
mod fields;
mod naming;

/// Size of the container header in bytes
pub const HEADER_SIZE: usize = 2048;
/// Number of item slots in the header
pub const NUM_ITEMS: usize = 31;

/// Swaps the two bits of each bit pair in `b`.
///
/// The container header is stored with this transform applied. It is its own
/// inverse.
pub const fn swap_bit_pairs(b: u8) -> u8 {
    ((b & 0x55) << 1) | ((b & 0xaa) >> 1)
}

/// Applies [`swap_bit_pairs`] to every byte of `buf`.
pub fn swap_buf(buf: &mut [u8]) {
    for b in buf {
        *b = swap_bit_pairs(*b);
    }
}

/// Upgrade container header, as stored after undoing the bit pair swap
#[binrw]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct ContainerHeader {
    /// Format tag
    pub tag: i64,
    /// Container version
    pub version: i32,
    reserved: [u8; 52],
    /// Item slots, in file order
    pub items: [ItemDescriptor; NUM_ITEMS],
}

impl ContainerHeader {
    /// Creates a header with every slot unused.
    pub fn new(tag: i64, version: i32) -> Self {
        Self {
            tag,
            version,
            reserved: [0; 52],
            items: [ItemDescriptor::EMPTY; NUM_ITEMS],
        }
    }

    /// Decodes the header from the first 2048 bytes of a container.
    ///
    /// Only the header region is unswapped; `container` itself is left untouched.
    pub fn decode(container: &[u8]) -> Result<Self, Error> {
        let raw = container
            .get(..HEADER_SIZE)
            .ok_or(Error::TruncatedHeader {
                available: container.len(),
            })?;
        let mut buf = Box::new([0u8; HEADER_SIZE]);
        buf.copy_from_slice(raw);
        swap_buf(&mut buf[..]);
        Ok(Self::read(&mut Cursor::new(&buf[..]))?)
    }

    /// Reads and decodes the header from the start of `reader`.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        reader.take(HEADER_SIZE as u64).read_to_end(&mut buf)?;
        Self::decode(&buf)
    }

    /// Returns the populated slots together with their index.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &ItemDescriptor)> {
        self.items.iter().enumerate().filter(|(_, item)| !item.is_empty())
    }
}

/// One item slot of the header
#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct ItemDescriptor {
    /// Payload size, 0 if the slot is unused
    pub length: u32,
    /// Payload offset from the start of the container
    pub offset: u32,
    /// Payload version
    pub version: i32,
    pub fstype: FsType,
    /// Checksum as stored; replaced with the computed CRC-32 on extraction
    pub checksum: u32,
    pub device: Device,
    reserved: [u8; 32],
}

impl ItemDescriptor {
    /// An unused slot
    pub const EMPTY: Self = Self::new(0, 0, 0, FsType::NONE, Device::EMPTY);

    pub const fn new(length: u32, offset: u32, version: i32, fstype: FsType, device: Device) -> Self {
        Self {
            length,
            offset,
            version,
            fstype,
            checksum: 0,
            device,
            reserved: [0; 32],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the payload's byte range within the container, if it fits in `container_len` bytes.
    pub fn payload_range(&self, container_len: usize) -> Option<std::ops::Range<usize>> {
        let start = self.offset as usize;
        let end = start.checked_add(self.length as usize)?;
        (end <= container_len).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinWrite;

    pub(crate) fn build_container(header: &ContainerHeader, payloads: &[(u32, &[u8])]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        header.write(&mut out).unwrap();
        let mut out = out.into_inner();
        assert_eq!(out.len(), HEADER_SIZE);
        swap_buf(&mut out);
        for (offset, payload) in payloads {
            let end = *offset as usize + payload.len();
            if out.len() < end {
                out.resize(end, 0);
            }
            out[*offset as usize..end].copy_from_slice(payload);
        }
        out
    }

    #[test]
    fn swap_is_involution() {
        for b in 0..=255u8 {
            assert_eq!(swap_bit_pairs(swap_bit_pairs(b)), b);
        }
        assert_eq!(swap_bit_pairs(0b0000_0001), 0b0000_0010);
        assert_eq!(swap_bit_pairs(0b1000_0000), 0b0100_0000);
        assert_eq!(swap_bit_pairs(0x55), 0xaa);
        assert_eq!(swap_bit_pairs(0xff), 0xff);
    }

    #[test]
    fn header_layout() {
        let mut hdr = ContainerHeader::new(0x1, 1);
        hdr.items[30] = ItemDescriptor::new(16, 2048, 7, FsType::EXT2, Device::new(b"/dev/mtd4"));
        let mut out = Cursor::new(Vec::new());
        hdr.write(&mut out).unwrap();
        let out = out.into_inner();
        assert_eq!(out.len(), HEADER_SIZE);
        let slot = 64 + 30 * 64;
        assert_eq!(&out[slot..slot + 4], &16u32.to_le_bytes());
        assert_eq!(&out[slot + 4..slot + 8], &2048u32.to_le_bytes());
        assert_eq!(&out[slot + 12..slot + 16], &4i32.to_le_bytes());
        assert_eq!(&out[slot + 20..slot + 29], b"/dev/mtd4");
    }

    #[test]
    fn decode_undoes_swap() {
        let mut hdr = ContainerHeader::new(0x1, 1);
        hdr.items[0] = ItemDescriptor::new(16, 2048, 3, FsType::EXT2, Device::new(b"/dev/mtd4"));
        let container = build_container(&hdr, &[(2048, &[0xaau8; 16])]);
        let decoded = ContainerHeader::decode(&container).unwrap();
        assert_eq!(decoded, hdr);
        assert_eq!(decoded.populated().map(|(i, _)| i).collect::<Vec<_>>(), vec![0usize]);
        // payload is outside the header and stays as stored
        assert_eq!(&container[2048..], &[0xaa; 16]);

        let parsed = ContainerHeader::parse(&mut Cursor::new(&container)).unwrap();
        assert_eq!(parsed, hdr);
    }

    #[test]
    fn truncated_header() {
        let container = vec![0u8; HEADER_SIZE - 1];
        assert!(matches!(
            ContainerHeader::decode(&container),
            Err(Error::TruncatedHeader { available: 2047 })
        ));
        assert!(matches!(
            ContainerHeader::parse(&mut Cursor::new(&container)),
            Err(Error::TruncatedHeader { available: 2047 })
        ));
    }

    #[test]
    fn payload_range() {
        let item = ItemDescriptor::new(16, 2048, 0, FsType::RAW, Device::new(b"0"));
        assert_eq!(item.payload_range(2064), Some(2048..2064));
        assert_eq!(item.payload_range(2063), None);
        let item = ItemDescriptor::new(u32::MAX, u32::MAX, 0, FsType::RAW, Device::new(b"0"));
        assert_eq!(item.payload_range(1 << 20), None);
    }
}
