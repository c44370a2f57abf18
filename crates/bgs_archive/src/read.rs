//! Types for reading BA2 and BSA archives
//!

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

use crate::{
    ba2, bsa,
    buffer::FileBuffer,
    dds,
    error::{Error, FileNotFoundError, Result},
    name::{normalize_name, ArchiveFilter},
    types::Ba2TextureRecord,
};

/// Container variant a file was declared in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// BA2 archive of general files
    Ba2General,
    /// BA2 archive of DDS textures
    Ba2Texture,
    /// BSA version 103
    Bsa103,
    /// BSA version 104
    Bsa104,
    /// BSA version 105
    Bsa105,
}

/// Where and how a file is stored
#[derive(Debug, Clone, PartialEq)]
pub struct FileDeclaration {
    /// Index of the owning archive in the reader
    pub archive: usize,

    /// Container variant of the owning archive
    pub kind: ArchiveKind,

    /// Offset of the (first) payload in the archive buffer
    pub offset: u64,

    /// Number of payload bytes stored in the archive
    pub packed_size: u64,

    /// Size of the file once extracted
    pub unpacked_size: u64,

    /// Whether any payload is compressed
    pub compressed: bool,

    /// Chunk layout of a texture
    pub(crate) texture: Option<Box<Ba2TextureRecord>>,
}

/// A directory entry produced by the container parsers
#[derive(Debug)]
pub(crate) struct Entry {
    pub name: String,
    pub declaration: FileDeclaration,
}

/// Virtual file system over one or more archives
///
/// Archives are indexed in order. When several archives hold the same name, the one indexed
/// last wins, as with a game's load order.
///
/// ```no_run
/// use bgs_archive::{ArchiveFilter, ArchiveReader};
///
/// fn dump_meshes(data: &std::path::Path) -> bgs_archive::error::Result<()> {
///     let filter = ArchiveFilter::builder().include(vec!["meshes/".into()]).build();
///     let archives = ArchiveReader::open(data, &filter)?;
///
///     for name in archives.file_names() {
///         let bytes = archives.extract(name)?;
///         println!("{name}: {} bytes", bytes.len());
///     }
///
///     Ok(())
/// }
/// ```
pub struct ArchiveReader {
    buffers: Vec<FileBuffer>,
    labels: Vec<String>,
    files: IndexMap<String, FileDeclaration>,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("archives", &self.labels)
            .field("files", &self.files.len())
            .finish()
    }
}

/// Whether `path` names a BA2 or BSA file
fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ba2") || ext.eq_ignore_ascii_case("bsa"))
}

/// Expand a directory into the archives it directly contains, sorted by name.
fn archive_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(FileNotFoundError::Path(path.to_owned()).into());
    }
    if !path.is_dir() {
        return Ok(vec![path.to_owned()]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_archive_path(entry.path()) {
            paths.push(entry.into_path());
        } else {
            trace!(path = %entry.path().display(), "not an archive");
        }
    }

    debug!(directory = %path.display(), archives = paths.len(), "scanned directory");
    Ok(paths)
}

impl ArchiveReader {
    /// Index the archive at `path`, or every archive directly inside the directory `path`.
    #[instrument(skip(filter), err)]
    pub fn open(path: &Path, filter: &ArchiveFilter) -> Result<ArchiveReader> {
        Self::open_all(&[path], filter)
    }

    /// Index several archives or directories, later paths take precedence.
    #[instrument(skip_all, err)]
    pub fn open_all<P: AsRef<Path>>(paths: &[P], filter: &ArchiveFilter) -> Result<ArchiveReader> {
        let mut sources = Vec::new();
        for path in paths {
            for archive in archive_paths(path.as_ref())? {
                let buffer = FileBuffer::open(&archive)?;
                sources.push((archive.display().to_string(), buffer));
            }
        }

        Self::index(sources, filter)
    }

    /// Index archives that are already in memory, later buffers take precedence.
    #[instrument(skip_all, err)]
    pub fn from_buffers(buffers: Vec<FileBuffer>, filter: &ArchiveFilter) -> Result<ArchiveReader> {
        let sources = buffers
            .into_iter()
            .enumerate()
            .map(|(i, buffer)| (format!("buffer {i}"), buffer))
            .collect();

        Self::index(sources, filter)
    }

    fn index(sources: Vec<(String, FileBuffer)>, filter: &ArchiveFilter) -> Result<ArchiveReader> {
        let filter = filter.normalized();
        let mut reader = ArchiveReader {
            buffers: Vec::new(),
            labels: Vec::new(),
            files: IndexMap::new(),
        };

        for (label, buffer) in sources {
            let entries = match buffer.get(..4) {
                Some(b"BTDX") => ba2::read_directory(&buffer)?,
                Some(b"BSA\0") => bsa::read_directory(&buffer)?,
                _ => return Err(Error::InvalidArchive(label)),
            };

            let total = entries.len();
            let archive = reader.buffers.len();
            let mut kept = 0;
            for Entry {
                name,
                mut declaration,
            } in entries
            {
                if !filter.matches(&name) {
                    continue;
                }
                declaration.archive = archive;
                reader.files.insert(name, declaration);
                kept += 1;
            }

            if kept == 0 {
                debug!(archive = %label, total, "no matching files, releasing archive");
                continue;
            }

            debug!(archive = %label, total, kept, "indexed archive");
            reader.buffers.push(buffer);
            reader.labels.push(label);
        }

        Ok(reader)
    }

    /// Number of files in the index
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the index holds no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of archives that contributed files
    pub fn archive_count(&self) -> usize {
        self.buffers.len()
    }

    /// Path, or buffer position, of a contributing archive
    pub fn archive_label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Returns an iterator over all normalized file names, in indexing order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// All normalized file names, in indexing order.
    pub fn list_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Whether a file exists, `name` is normalized first
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(&normalize_name(name))
    }

    /// Storage details of a file, `name` is normalized first
    pub fn declaration(&self, name: &str) -> Option<&FileDeclaration> {
        self.files.get(&normalize_name(name))
    }

    /// Size of a file once extracted
    pub fn file_size(&self, name: &str) -> Result<u64> {
        self.lookup(name).map(|(_, declaration)| declaration.unpacked_size)
    }

    /// Extract a file into a new buffer.
    pub fn extract(&self, name: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.extract_into(&mut out, name)?;
        Ok(out)
    }

    /// Extract a file into `out`, replacing its contents.
    ///
    /// On failure the contents of `out` are unspecified.
    #[instrument(level = "debug", skip(self, out), err)]
    pub fn extract_into(&self, out: &mut Vec<u8>, name: &str) -> Result<()> {
        let (name, declaration) = self.lookup(name)?;
        let data: &[u8] = &self.buffers[declaration.archive];

        out.clear();
        let size = usize::try_from(declaration.unpacked_size)
            .map_err(|_| corrupt(name, "file is too large for this platform"))?;
        out.reserve(size);

        match &declaration.texture {
            Some(texture) => {
                dds::write_header(out, texture);
                for chunk in &texture.chunks {
                    let unpacked = chunk.unpacked_size as usize;
                    if chunk.packed_size == 0 {
                        out.extend_from_slice(payload(data, name, chunk.offset, unpacked as u64)?);
                    } else {
                        let src = payload(data, name, chunk.offset, u64::from(chunk.packed_size))?;
                        inflate_into(out, src, unpacked, name)?;
                    }
                }
            }
            None => {
                let src = payload(data, name, declaration.offset, declaration.packed_size)?;
                if declaration.compressed {
                    inflate_into(out, src, size, name)?;
                } else {
                    if src.len() != size {
                        return Err(corrupt(name, "stored size differs from file size"));
                    }
                    out.extend_from_slice(src);
                }
            }
        }

        trace!(bytes = out.len(), "extracted");
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<(&str, &FileDeclaration)> {
        self.files
            .get_key_value(&normalize_name(name))
            .map(|(name, declaration)| (name.as_str(), declaration))
            .ok_or_else(|| FileNotFoundError::Name(name.to_owned()).into())
    }
}

fn corrupt(name: &str, reason: impl Into<String>) -> Error {
    Error::CorruptEntry {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Bounds checked view of a payload.
fn payload<'a>(data: &'a [u8], name: &str, offset: u64, size: u64) -> Result<&'a [u8]> {
    offset
        .checked_add(size)
        .filter(|&end| end <= data.len() as u64)
        .map(|end| &data[offset as usize..end as usize])
        .ok_or_else(|| {
            corrupt(
                name,
                format!(
                    "{size} bytes at offset {offset} exceed the archive size of {}",
                    data.len()
                ),
            )
        })
}

/// Decompress `src` onto the end of `out`, requiring exactly `size` bytes.
fn inflate_into(out: &mut Vec<u8>, src: &[u8], size: usize, name: &str) -> Result<()> {
    let start = out.len();
    out.resize(start + size, 0);
    let written = bgs_inflate::decompress(&mut out[start..], src)?;
    if written != size {
        return Err(corrupt(
            name,
            format!("decompressed to {written} bytes, expected {size}"),
        ));
    }
    Ok(())
}
