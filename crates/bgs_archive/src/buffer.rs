//! Read-only byte buffers backing archives and terrain files

use std::{
    fmt::{self, Debug},
    fs::File,
    ops::Deref,
    path::Path,
};

use memmap2::Mmap;
use tracing::{debug, instrument};

use crate::error::Result;

/// The complete contents of an input file
///
/// Either a read-only memory map or an owned vector. Both dereference to `[u8]`, so parsers
/// never care where the bytes came from.
pub enum FileBuffer {
    /// File mapped into memory
    Mapped(Mmap),

    /// Bytes owned by this process
    Owned(Vec<u8>),
}

impl FileBuffer {
    /// Map the file at `path`.
    ///
    /// Empty files cannot be mapped and are returned as an empty owned buffer.
    #[instrument(level = "debug", err)]
    pub fn open(path: &Path) -> Result<FileBuffer> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(FileBuffer::Owned(Vec::new()));
        }

        // SAFETY: the map is read-only; callers must not truncate the file while it is open
        let mmap = unsafe { Mmap::map(&file)? };
        debug!(size = mmap.len(), "mapped file");
        Ok(FileBuffer::Mapped(mmap))
    }

    /// Number of bytes in the buffer
    pub fn len(&self) -> usize {
        self.deref().len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deref for FileBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBuffer::Mapped(map) => map,
            FileBuffer::Owned(vec) => vec,
        }
    }
}

impl AsRef<[u8]> for FileBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl From<Vec<u8>> for FileBuffer {
    fn from(value: Vec<u8>) -> Self {
        FileBuffer::Owned(value)
    }
}

impl Debug for FileBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileBuffer::Mapped(map) => write!(f, "FileBuffer::Mapped({} bytes)", map.len()),
            FileBuffer::Owned(vec) => write!(f, "FileBuffer::Owned({} bytes)", vec.len()),
        }
    }
}
