use std::{
    collections::BTreeMap,
    fs::{self, DirBuilder, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{crc, resolve_name, ContainerHeader, Error, ItemDescriptor, ItemError};

/// Destination for extracted payloads
pub trait OutputSink {
    /// Stores `data` under `name`, replacing anything stored under that name before.
    fn write_item(&mut self, name: &str, data: &[u8]) -> io::Result<()>;
}

/// Output directory on disk
#[derive(Clone, Debug)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Uses `path` as the output directory, creating it (owner-only on Unix) if absent.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = path.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::OutputDirectory {
                    source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
                    path: root,
                })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let mut builder = DirBuilder::new();
                builder.recursive(true);
                #[cfg(unix)]
                std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);
                if let Err(source) = builder.create(&root) {
                    return Err(Error::OutputDirectory { path: root, source });
                }
            }
            Err(source) => return Err(Error::OutputDirectory { path: root, source }),
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for OutputDir {
    fn write_item(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(self.root.join(name))?;
        file.write_all(data)?;
        file.flush()
    }
}

/// Keeps payloads in memory by name
impl OutputSink for BTreeMap<String, Vec<u8>> {
    fn write_item(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        self.insert(name.to_owned(), data.to_vec());
        Ok(())
    }
}

/// Diagnostic record of one populated slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedItem {
    /// Slot index in the header
    pub index: usize,
    /// Output file name
    pub name: String,
    /// Descriptor with `checksum` set to the CRC-32 of the payload
    pub descriptor: ItemDescriptor,
}

/// Result of a run over all slots
#[derive(Debug)]
pub struct Extraction {
    pub header: ContainerHeader,
    /// Every item whose payload was in range, in slot order, including those that failed to write
    pub items: Vec<ExtractedItem>,
    /// Per-item failures, in slot order
    pub failures: Vec<ItemError>,
}

impl Extraction {
    /// Returns whether every populated slot was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Extracts every populated slot of `container` into `sink`.
///
/// Payloads are read from `container` as stored. Only a malformed header
/// fails the whole run; an out of range payload or a failed write is
/// recorded in [`Extraction::failures`] and the next slot is processed.
pub fn extract_all<S: OutputSink + ?Sized>(
    container: &[u8],
    sink: &mut S,
) -> Result<Extraction, Error> {
    let header = ContainerHeader::decode(container)?;
    debug!(
        "container tag {:#x}, version {}, {} populated items",
        header.tag,
        header.version,
        header.populated().count()
    );

    let table = crc::build_table();
    let mut items = Vec::new();
    let mut failures = Vec::new();

    for (index, item) in header.populated() {
        let Some(range) = item.payload_range(container.len()) else {
            let err = ItemError::OutOfRange {
                index,
                device: item.device,
                offset: item.offset,
                length: item.length,
                available: container.len(),
            };
            warn!("{err}");
            failures.push(err);
            continue;
        };
        let data = &container[range];

        let mut descriptor = *item;
        descriptor.checksum = crc::checksum(&table, data);
        let name = resolve_name(index, &descriptor);
        info!(
            "item {index}: {name} ({} bytes at {:#x}, fstype {}, crc32 {:#010x})",
            descriptor.length, descriptor.offset, descriptor.fstype, descriptor.checksum
        );

        if let Err(source) = sink.write_item(&name, data) {
            let err = ItemError::Write {
                index,
                device: descriptor.device,
                name: name.clone(),
                source,
            };
            warn!("{err}");
            failures.push(err);
        }
        items.push(ExtractedItem {
            index,
            name,
            descriptor,
        });
    }

    Ok(Extraction {
        header,
        items,
        failures,
    })
}

/// Reads the container at `input` and extracts it into the directory `out`.
pub fn extract_file(input: &Path, out: &Path) -> Result<Extraction, Error> {
    let container = fs::read(input).map_err(|source| Error::InputNotFound {
        path: input.to_owned(),
        source,
    })?;
    let mut dir = OutputDir::create(out)?;
    extract_all(&container, &mut dir)
}
