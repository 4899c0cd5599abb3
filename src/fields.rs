use std::fmt;

use binrw::{BinRead, BinWrite};

/// Filesystem type of an item
///
/// Known identifiers are listed in [`FsType::TABLE`], anything else displays as `Unknown`.
#[derive(BinRead, BinWrite, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[brw(little)]
pub struct FsType(pub i32);

impl FsType {
    pub const NONE: Self = Self(0);
    pub const FAT: Self = Self(1);
    pub const YAFFS: Self = Self(2);
    pub const YAFFS2: Self = Self(3);
    pub const EXT2: Self = Self(4);
    pub const RAM: Self = Self(5);
    pub const RAW: Self = Self(6);
    pub const NOR: Self = Self(7);
    pub const UBIFS: Self = Self(8);

    /// Symbolic names by identifier
    pub const TABLE: [(Self, &'static str); 9] = [
        (Self::NONE, "none"),
        (Self::FAT, "fat"),
        (Self::YAFFS, "yaffs"),
        (Self::YAFFS2, "yaffs2"),
        (Self::EXT2, "ext2"),
        (Self::RAM, "ram"),
        (Self::RAW, "raw"),
        (Self::NOR, "nor"),
        (Self::UBIFS, "ubifs"),
    ];

    /// Returns the symbolic name, or `None` if the identifier isn't in the table.
    pub fn name(self) -> Option<&'static str> {
        Self::TABLE
            .iter()
            .find(|(fstype, _)| *fstype == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("Unknown"))
    }
}
impl fmt::Debug for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FsType({}, {})", self.0, self)
    }
}

/// Target device of an item
///
/// A fixed 12 byte field, NUL padded but not necessarily NUL terminated. It
/// holds a numeric flash address (`"0"`, `"0x400000"`), `/dev/null` or a
/// mount path such as `/dev/mtd3`.
#[derive(BinRead, BinWrite, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Device([u8; DEVICE_LEN]);

const DEVICE_LEN: usize = 12;

impl Device {
    pub const LEN: usize = DEVICE_LEN;
    pub const EMPTY: Self = Self([0; Self::LEN]);

    /// Creates a `Device` from `bytes`, truncated or NUL padded to 12 bytes.
    pub fn new(bytes: &[u8]) -> Self {
        let mut raw = [0u8; Self::LEN];
        let len = bytes.len().min(Self::LEN);
        raw[..len].copy_from_slice(&bytes[..len]);
        Self(raw)
    }

    /// Returns all 12 bytes, padding included.
    pub fn raw(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Returns the bytes up to the first NUL, or all 12 if there is none.
    pub fn as_bytes(&self) -> &[u8] {
        match self.0.iter().position(|b| *b == 0) {
            Some(null_idx) => &self.0[..null_idx],
            None => &self.0,
        }
    }

    /// Returns whether the field starts with an ASCII digit.
    pub fn is_numeric(&self) -> bool {
        self.0[0].is_ascii_digit()
    }

    /// Parses the field as an integer the way C `strtol(dev, NULL, 0)` does.
    ///
    /// The base is picked from the prefix (`0x` hex, `0` octal, decimal
    /// otherwise) and the longest run of valid digits is used. Returns `None`
    /// if the field doesn't start with a digit.
    pub fn parse_numeric(&self) -> Option<u64> {
        let s = self.as_bytes();
        if !s.first()?.is_ascii_digit() {
            return None;
        }
        let (radix, digits) = match s {
            [b'0', b'x' | b'X', next, ..] if next.is_ascii_hexdigit() => (16, &s[2..]),
            [b'0', ..] => (8, s),
            _ => (10, s),
        };
        Some(
            digits
                .iter()
                .map_while(|b| char::from(*b).to_digit(radix))
                .fold(0u64, |acc, digit| {
                    acc.saturating_mul(u64::from(radix))
                        .saturating_add(u64::from(digit))
                }),
        )
    }

    /// Returns the part after the last `/`, or `None` if there is no `/`.
    pub fn file_name(&self) -> Option<&[u8]> {
        let s = self.as_bytes();
        s.iter().rposition(|b| *b == b'/').map(|idx| &s[idx + 1..])
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bytes().escape_ascii())
    }
}
impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device(\"{self}\")")
    }
}
