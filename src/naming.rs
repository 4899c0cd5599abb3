use crate::ItemDescriptor;

/// Partition names for the last path component of a device
const PARTITION_NAMES: [(&[u8], &str); 11] = [
    (b"mtd3", "rootfs"),
    (b"mtd4", "Settings"),
    (b"mtd5", "ProgFS"),
    (b"mtd6", "DataFS"),
    (b"mtd7", "UsrFS"),
    (b"mtd8", "UsrDisk"),
    (b"ubi0_0", "rootfs"),
    (b"ubi0_1", "Settings"),
    (b"ubi0_2", "ProgFS"),
    (b"ubi0_3", "DataFS"),
    (b"ubi0_6", "UsrDisk"),
];

/// Flash addresses the kernel image is written to
const KERNEL_ADDRESSES: [u64; 2] = [0x40_0000, 0x50_0000];

/// Returns the output file name for the item in slot `index`.
///
/// * numeric device `0`: `u-boot-nand.bin`
/// * numeric device `0x400000` or `0x500000`: `uImage`
/// * `/dev/null`: `uImage-initrd`
/// * a path: the renamed last component (`/dev/mtd3` is `rootfs`) followed by
///   `.` and the filesystem type name
/// * anything else: `idx-<index>-file.bin`
///
/// Names aren't unique, two items may resolve to the same file.
pub fn resolve_name(index: usize, item: &ItemDescriptor) -> String {
    known_name(item).unwrap_or_else(|| format!("idx-{index}-file.bin"))
}

fn known_name(item: &ItemDescriptor) -> Option<String> {
    let device = &item.device;
    if device.is_numeric() {
        return match device.parse_numeric()? {
            0 => Some("u-boot-nand.bin".to_owned()),
            addr if KERNEL_ADDRESSES.contains(&addr) => Some("uImage".to_owned()),
            _ => None,
        };
    }
    if device.as_bytes() == b"/dev/null" {
        return Some("uImage-initrd".to_owned());
    }

    let file_name = device.file_name()?;
    let base = PARTITION_NAMES
        .iter()
        .find(|(dev, _)| *dev == file_name)
        .map_or_else(|| String::from_utf8_lossy(file_name), |(_, name)| (*name).into());
    Some(format!("{base}.{}", item.fstype))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Device, FsType};
    use test_case::test_case;

    fn name(index: usize, device: &[u8], fstype: FsType) -> String {
        resolve_name(
            index,
            &ItemDescriptor::new(1, 2048, 0, fstype, Device::new(device)),
        )
    }

    #[test_case(b"/dev/mtd3", FsType::EXT2 => "rootfs.ext2")]
    #[test_case(b"/dev/mtd4", FsType::YAFFS2 => "Settings.yaffs2")]
    #[test_case(b"/dev/mtd5", FsType::YAFFS2 => "ProgFS.yaffs2")]
    #[test_case(b"/dev/mtd6", FsType::FAT => "DataFS.fat")]
    #[test_case(b"/dev/mtd7", FsType::RAW => "UsrFS.raw")]
    #[test_case(b"/dev/mtd8", FsType::NOR => "UsrDisk.nor")]
    #[test_case(b"/dev/ubi0_0", FsType::UBIFS => "rootfs.ubifs")]
    #[test_case(b"/dev/ubi0_1", FsType::UBIFS => "Settings.ubifs")]
    #[test_case(b"/dev/ubi0_2", FsType::UBIFS => "ProgFS.ubifs")]
    #[test_case(b"/dev/ubi0_3", FsType::UBIFS => "DataFS.ubifs")]
    #[test_case(b"/dev/ubi0_6", FsType::UBIFS => "UsrDisk.ubifs")]
    #[test_case(b"/dev/ubi0_4", FsType::UBIFS => "ubi0_4.ubifs"; "unlisted partition kept")]
    #[test_case(b"/dev/mtd9", FsType(42) => "mtd9.Unknown"; "unknown fstype")]
    #[test_case(b"/mnt/", FsType::RAM => ".ram"; "trailing slash")]
    fn partitions(device: &[u8], fstype: FsType) -> String {
        name(5, device, fstype)
    }

    #[test_case(b"0" => "u-boot-nand.bin")]
    #[test_case(b"00" => "u-boot-nand.bin"; "octal zero")]
    #[test_case(b"4194304" => "uImage")]
    #[test_case(b"0x400000" => "uImage"; "hex kernel")]
    #[test_case(b"0x500000" => "uImage"; "second kernel")]
    #[test_case(b"5242880" => "uImage"; "decimal second kernel")]
    #[test_case(b"0x600000" => "idx-5-file.bin"; "other address")]
    #[test_case(b"1/dev/mtd3" => "idx-5-file.bin"; "digit first wins over path")]
    fn numeric(device: &[u8]) -> String {
        name(5, device, FsType::RAW)
    }

    #[test]
    fn dev_null_ignores_fstype() {
        assert_eq!(name(1, b"/dev/null", FsType::EXT2), "uImage-initrd");
        assert_eq!(name(1, b"/dev/null", FsType(-7)), "uImage-initrd");
        // only an exact match counts
        assert_eq!(name(1, b"/dev/nullx", FsType::RAW), "nullx.raw");
    }

    #[test]
    fn fallback() {
        assert_eq!(name(0, b"", FsType::RAW), "idx-0-file.bin");
        assert_eq!(name(30, b"mtd3", FsType::RAW), "idx-30-file.bin");
        assert_eq!(name(2, b"/dev/mtdblock3", FsType::RAW), "mtdbloc.raw");
    }
}
