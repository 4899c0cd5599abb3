use std::{io, path::PathBuf};

use thiserror::Error;

use crate::Device;

/// Errors that stop the whole run
#[derive(Error, Debug)]
pub enum Error {
    /// The container could not be opened or read.
    #[error("cannot read container {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The container is shorter than its header.
    #[error("container too short: {available} bytes, header needs 2048")]
    TruncatedHeader { available: usize },

    /// The unswapped header could not be decoded.
    #[error("malformed header: {0}")]
    Header(#[from] binrw::Error),

    /// The output directory could not be created or is not a directory.
    #[error("cannot use output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that fail a single item; extraction continues with the next slot
#[derive(Error, Debug)]
pub enum ItemError {
    /// The payload runs past the end of the container.
    #[error("item {index} ({device}): payload {offset:#x}+{length:#x} exceeds container size {available:#x}")]
    OutOfRange {
        index: usize,
        device: Device,
        offset: u32,
        length: u32,
        available: usize,
    },

    /// The output file could not be written.
    #[error("item {index} ({device}): cannot write {name}: {source}")]
    Write {
        index: usize,
        device: Device,
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ItemError {
    /// Slot index of the failed item
    pub fn index(&self) -> usize {
        match self {
            Self::OutOfRange { index, .. } | Self::Write { index, .. } => *index,
        }
    }

    /// Target device of the failed item
    pub fn device(&self) -> &Device {
        match self {
            Self::OutOfRange { device, .. } | Self::Write { device, .. } => device,
        }
    }
}
