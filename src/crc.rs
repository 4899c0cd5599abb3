/// Reflected CRC-32 polynomial (zlib, Ethernet)
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table for [`checksum`]
pub type Table = [u32; 256];

/// Table computed at compile time, used by [`crc32`].
pub static TABLE: Table = build_table();

/// Builds the 256 entry lookup table for the reflected CRC-32.
pub const fn build_table() -> Table {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Computes the CRC-32 of `bytes` using `table`.
///
/// The running value starts at `0xFFFFFFFF` and is complemented at the end.
pub fn checksum(table: &Table, bytes: &[u8]) -> u32 {
    !bytes.iter().fold(0xFFFF_FFFF, |crc: u32, &byte| {
        (crc >> 8) ^ table[((crc ^ u32::from(byte)) & 0xff) as usize]
    })
}

/// Computes the CRC-32 of `bytes` using the static [`TABLE`].
pub fn crc32(bytes: &[u8]) -> u32 {
    checksum(&TABLE, bytes)
}
