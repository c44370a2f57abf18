//! BSA directory parsing.

use std::io::{Cursor, Read};

use binrw::BinRead;
use byteorder::{ReadBytesExt, LE};
use tracing::{debug, instrument, trace};

use crate::error::{Error, Result};
use crate::name::normalize_bytes;
use crate::read::{ArchiveKind, Entry, FileDeclaration};
use crate::types::{BsaFileRecord, BsaFlags, BsaFolderRecord, BsaHeader};

const FILE_RECORD_SIZE: u64 = 16;

fn invalid(what: &str) -> impl Fn(std::io::Error) -> Error + '_ {
    move |_| Error::InvalidDirectory(format!("{what} is truncated"))
}

/// Read a length prefixed, NUL terminated folder name.
fn read_bzstring(reader: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = reader.read_u8().map_err(invalid("folder name"))?;
    let mut name = vec![0u8; usize::from(len)];
    reader
        .read_exact(&mut name)
        .map_err(invalid("folder name"))?;
    if name.last() == Some(&0) {
        name.pop();
    }
    Ok(name)
}

/// Parse the directory of a BSA archive.
#[instrument(level = "debug", skip_all, err)]
pub(crate) fn read_directory(data: &[u8]) -> Result<Vec<Entry>> {
    let mut reader = Cursor::new(data);
    let header = BsaHeader::read(&mut reader)?;
    let kind = match header.version {
        103 => ArchiveKind::Bsa103,
        104 => ArchiveKind::Bsa104,
        105 => ArchiveKind::Bsa105,
        version => {
            return Err(Error::UnsupportedVersion {
                format: "BSA",
                version,
            })
        }
    };

    let folder_record_size = if header.version >= 105 { 24 } else { 16 };
    let directory_size = u64::from(header.folder_count) * folder_record_size
        + u64::from(header.file_count) * FILE_RECORD_SIZE;
    if u64::from(header.folder_offset) + directory_size > data.len() as u64 {
        return Err(Error::InvalidDirectory(format!(
            "{} folders and {} files do not fit in {} bytes",
            header.folder_count,
            header.file_count,
            data.len()
        )));
    }

    let flags = header.archive_flags;
    debug!(
        version = header.version,
        folders = header.folder_count,
        files = header.file_count,
        flags = flags.bits(),
        "reading BSA directory"
    );

    reader.set_position(u64::from(header.folder_offset));
    let folders = (0..header.folder_count)
        .map(|_| BsaFolderRecord::read_args(&mut reader, (header.version,)))
        .collect::<binrw::BinResult<Vec<_>>>()?;

    // file record blocks follow the folder records back to back
    let mut records = Vec::with_capacity(header.file_count as usize);
    for (folder_index, folder) in folders.iter().enumerate() {
        trace!(
            folder = folder_index,
            files = folder.count,
            position = reader.position(),
            stored_offset = folder.offset(),
            "reading file record block"
        );
        let folder_name = if flags.contains(BsaFlags::FOLDER_NAMES) {
            Some(read_bzstring(&mut reader)?)
        } else {
            None
        };
        for _ in 0..folder.count {
            if records.len() == header.file_count as usize {
                return Err(Error::InvalidDirectory(
                    "folders hold more files than the header declares".to_owned(),
                ));
            }
            let record = BsaFileRecord::read(&mut reader)?;
            records.push((folder_index, folder_name.clone(), record));
        }
    }
    if records.len() != header.file_count as usize {
        return Err(Error::InvalidDirectory(format!(
            "folders hold {} files, header declares {}",
            records.len(),
            header.file_count
        )));
    }

    let file_names = if flags.contains(BsaFlags::FILE_NAMES) {
        let remaining = data.len() as u64 - reader.position().min(data.len() as u64);
        if u64::from(header.file_names_length) > remaining {
            return Err(Error::InvalidDirectory("file name block is truncated".to_owned()));
        }
        let mut block = vec![0u8; header.file_names_length as usize];
        reader
            .read_exact(&mut block)
            .map_err(invalid("file name block"))?;
        let names: Vec<Vec<u8>> = block
            .split(|&b| b == 0)
            .take(records.len())
            .map(<[u8]>::to_vec)
            .collect();
        if names.len() < records.len() {
            return Err(Error::InvalidDirectory(format!(
                "{} file names for {} files",
                names.len(),
                records.len()
            )));
        }
        Some(names)
    } else {
        None
    };

    let embedded_names = header.version >= 104 && flags.contains(BsaFlags::EMBEDDED_NAMES);
    let compressed_by_default = flags.contains(BsaFlags::COMPRESSED);

    records
        .into_iter()
        .enumerate()
        .map(|(i, (folder_index, folder_name, record))| -> Result<Entry> {
            let mut offset = u64::from(record.offset);
            let mut size = u64::from(record.stored_size());

            let mut data_reader = Cursor::new(data);
            data_reader.set_position(offset);

            let embedded = if embedded_names {
                let name = read_bstring(&mut data_reader)?;
                let consumed = 1 + name.len() as u64;
                size = size.checked_sub(consumed).ok_or_else(|| {
                    Error::InvalidDirectory("embedded name is longer than the file".to_owned())
                })?;
                offset += consumed;
                Some(name)
            } else {
                None
            };

            let compressed = compressed_by_default != record.toggles_compression();
            let unpacked_size = if compressed {
                let unpacked = data_reader
                    .read_u32::<LE>()
                    .map_err(invalid("uncompressed size"))?;
                size = size.checked_sub(4).ok_or_else(|| {
                    Error::InvalidDirectory("compressed file has no size prefix".to_owned())
                })?;
                offset += 4;
                u64::from(unpacked)
            } else {
                size
            };

            let folder = &folders[folder_index];
            let name = match (&file_names, embedded) {
                (Some(file_names), _) => {
                    let mut path = match folder_name {
                        Some(folder_name) => folder_name,
                        None => format!("{:016x}", folder.hash).into_bytes(),
                    };
                    path.push(b'\\');
                    path.extend_from_slice(&file_names[i]);
                    path
                }
                (None, Some(embedded)) => embedded,
                (None, None) => format!("{:016x}/{:016x}", folder.hash, record.hash).into_bytes(),
            };

            Ok(Entry {
                name: normalize_bytes(&name),
                declaration: FileDeclaration {
                    archive: 0,
                    kind,
                    offset,
                    packed_size: size,
                    unpacked_size,
                    compressed,
                    texture: None,
                },
            })
        })
        .collect()
}

/// Read a length prefixed name without terminator, as embedded before file data.
fn read_bstring(reader: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = reader.read_u8().map_err(invalid("embedded name"))?;
    let mut name = vec![0u8; usize::from(len)];
    reader
        .read_exact(&mut name)
        .map_err(invalid("embedded name"))?;
    Ok(name)
}
