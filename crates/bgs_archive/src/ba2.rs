//! BA2 directory parsing.

use std::io::{Cursor, Read};

use binrw::{BinRead, BinResult};
use byteorder::{ReadBytesExt, LE};
use tracing::{debug, instrument};

use crate::dds::DDS_HEADER_SIZE;
use crate::error::{Error, Result};
use crate::name::normalize_bytes;
use crate::read::{ArchiveKind, Entry, FileDeclaration};
use crate::types::{Ba2FileRecord, Ba2Header, Ba2Kind, Ba2TextureRecord};

const SUPPORTED_VERSIONS: [u32; 5] = [1, 2, 3, 7, 8];

const GENERAL_RECORD_SIZE: u64 = 36;
const TEXTURE_RECORD_SIZE: u64 = 24;

/// Parse the directory of a BA2 archive.
#[instrument(level = "debug", skip_all, err)]
pub(crate) fn read_directory(data: &[u8]) -> Result<Vec<Entry>> {
    let mut reader = Cursor::new(data);
    let header = Ba2Header::read(&mut reader)?;
    if !SUPPORTED_VERSIONS.contains(&header.version) {
        return Err(Error::UnsupportedVersion {
            format: "BA2",
            version: header.version,
        });
    }

    let record_size = match header.kind {
        Ba2Kind::General => GENERAL_RECORD_SIZE,
        Ba2Kind::Texture => TEXTURE_RECORD_SIZE,
    };
    if u64::from(header.file_count) * record_size > data.len() as u64 {
        return Err(Error::InvalidDirectory(format!(
            "{} records do not fit in {} bytes",
            header.file_count,
            data.len()
        )));
    }

    let names = read_names(data, &header)?;
    debug!(
        version = header.version,
        kind = ?header.kind,
        files = header.file_count,
        named = names.is_some(),
        "reading BA2 directory"
    );

    let entries = match header.kind {
        Ba2Kind::General => (0..header.file_count as usize)
            .map(|i| {
                let record = Ba2FileRecord::read(&mut reader)?;
                let name = entry_name(
                    names.as_deref(),
                    i,
                    record.dir_hash,
                    record.name_hash,
                    &record.extension,
                );
                Ok(Entry {
                    name,
                    declaration: general_declaration(&record),
                })
            })
            .collect::<BinResult<Vec<_>>>()?,
        Ba2Kind::Texture => (0..header.file_count as usize)
            .map(|i| {
                let record = Ba2TextureRecord::read(&mut reader)?;
                let name = entry_name(
                    names.as_deref(),
                    i,
                    record.dir_hash,
                    record.name_hash,
                    &record.extension,
                );
                Ok(Entry {
                    name,
                    declaration: texture_declaration(record),
                })
            })
            .collect::<BinResult<Vec<_>>>()?,
    };

    Ok(entries)
}

fn read_names(data: &[u8], header: &Ba2Header) -> Result<Option<Vec<Vec<u8>>>> {
    if header.name_table_offset == 0 {
        return Ok(None);
    }

    let truncated =
        |_: std::io::Error| Error::InvalidDirectory("name table is truncated".to_owned());

    let mut reader = Cursor::new(data);
    reader.set_position(header.name_table_offset);
    (0..header.file_count)
        .map(|_| {
            let len = reader.read_u16::<LE>().map_err(truncated)?;
            let mut name = vec![0u8; usize::from(len)];
            reader.read_exact(&mut name).map_err(truncated)?;
            Ok(name)
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Name from the name table, or one made up from the hashes when the archive has none.
fn entry_name(
    names: Option<&[Vec<u8>]>,
    index: usize,
    dir_hash: u32,
    name_hash: u32,
    extension: &[u8; 4],
) -> String {
    match names.and_then(|names| names.get(index)) {
        Some(name) => normalize_bytes(name),
        None => {
            let extension: Vec<u8> = extension.iter().copied().take_while(|&b| b != 0).collect();
            normalize_bytes(
                format!(
                    "{:08x}/{:08x}.{}",
                    dir_hash,
                    name_hash,
                    String::from_utf8_lossy(&extension)
                )
                .as_bytes(),
            )
        }
    }
}

fn general_declaration(record: &Ba2FileRecord) -> FileDeclaration {
    let compressed = record.packed_size != 0;
    FileDeclaration {
        archive: 0,
        kind: ArchiveKind::Ba2General,
        offset: record.offset,
        packed_size: if compressed {
            u64::from(record.packed_size)
        } else {
            u64::from(record.unpacked_size)
        },
        unpacked_size: u64::from(record.unpacked_size),
        compressed,
        texture: None,
    }
}

fn texture_declaration(record: Ba2TextureRecord) -> FileDeclaration {
    let packed_size = record
        .chunks
        .iter()
        .map(|c| match c.packed_size {
            0 => u64::from(c.unpacked_size),
            packed => u64::from(packed),
        })
        .sum();
    let unpacked_size = DDS_HEADER_SIZE as u64
        + record
            .chunks
            .iter()
            .map(|c| u64::from(c.unpacked_size))
            .sum::<u64>();

    FileDeclaration {
        archive: 0,
        kind: ArchiveKind::Ba2Texture,
        offset: record.chunks.first().map(|c| c.offset).unwrap_or_default(),
        packed_size,
        unpacked_size,
        compressed: record.chunks.iter().any(|c| c.packed_size != 0),
        texture: Some(Box::new(record)),
    }
}
