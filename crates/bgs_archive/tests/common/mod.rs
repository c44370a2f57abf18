//! In-memory BA2 and BSA images for tests.
#![allow(dead_code)]

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use lz4_flex::frame::FrameEncoder;

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn lz4(data: &[u8]) -> Vec<u8> {
    let mut encoder = FrameEncoder::new(Vec::new());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// A file of a general BA2 archive
pub struct Ba2Entry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub compress: bool,
    /// Bytes appended after the compressed stream, counted in the packed size
    pub padding: usize,
}

impl<'a> Ba2Entry<'a> {
    pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            compress: false,
            padding: 0,
        }
    }

    pub fn zlib(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            compress: true,
            padding: 0,
        }
    }
}

fn ba2_header(out: &mut Vec<u8>, version: u32, kind: &[u8; 4], count: u32) -> usize {
    out.extend_from_slice(b"BTDX");
    put_u32(out, version);
    out.extend_from_slice(kind);
    put_u32(out, count);
    // name table offset, patched later
    let patch = out.len();
    put_u64(out, 0);
    if version == 2 || version == 3 {
        put_u64(out, 0);
    }
    if version == 3 {
        put_u32(out, 0);
    }
    patch
}

fn ba2_names<'a>(out: &mut Vec<u8>, patch: usize, names: impl Iterator<Item = &'a str>) {
    let offset = out.len() as u64;
    out[patch..patch + 8].copy_from_slice(&offset.to_le_bytes());
    for name in names {
        put_u16(out, name.len() as u16);
        out.extend_from_slice(name.as_bytes());
    }
}

/// Build a general BA2 archive.
pub fn ba2_general(version: u32, entries: &[Ba2Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    let patch = ba2_header(&mut out, version, b"GNRL", entries.len() as u32);

    let payloads: Vec<Vec<u8>> = entries
        .iter()
        .map(|e| {
            let mut payload = if e.compress {
                zlib(e.data)
            } else {
                e.data.to_vec()
            };
            payload.resize(payload.len() + e.padding, 0);
            payload
        })
        .collect();

    let mut offset = (out.len() + entries.len() * 36) as u64;
    for (entry, payload) in entries.iter().zip(&payloads) {
        put_u32(&mut out, 0x1234_5678);
        let extension = entry.name.rsplit('.').next().unwrap_or_default().as_bytes();
        let mut ext = [0u8; 4];
        ext[..extension.len().min(4)].copy_from_slice(&extension[..extension.len().min(4)]);
        out.extend_from_slice(&ext);
        put_u32(&mut out, 0x9ABC_DEF0);
        put_u32(&mut out, 0x0010_0100);
        put_u64(&mut out, offset);
        put_u32(
            &mut out,
            if entry.compress {
                payload.len() as u32
            } else {
                0
            },
        );
        put_u32(&mut out, entry.data.len() as u32);
        put_u32(&mut out, 0xBAAD_F00D);
        offset += payload.len() as u64;
    }

    for payload in &payloads {
        out.extend_from_slice(payload);
    }
    ba2_names(&mut out, patch, entries.iter().map(|e| e.name));
    out
}

/// A mip chunk of a texture
pub struct Chunk<'a> {
    pub data: &'a [u8],
    pub compress: bool,
}

/// A texture of a DX10 BA2 archive
pub struct Texture<'a> {
    pub name: &'a str,
    pub width: u16,
    pub height: u16,
    pub mip_count: u8,
    pub format: u8,
    pub cube_map: bool,
    pub chunks: Vec<Chunk<'a>>,
}

/// Build a texture BA2 archive.
pub fn ba2_textures(version: u32, textures: &[Texture]) -> Vec<u8> {
    let mut out = Vec::new();
    let patch = ba2_header(&mut out, version, b"DX10", textures.len() as u32);

    let payloads: Vec<Vec<Vec<u8>>> = textures
        .iter()
        .map(|t| {
            t.chunks
                .iter()
                .map(|c| {
                    if c.compress {
                        zlib(c.data)
                    } else {
                        c.data.to_vec()
                    }
                })
                .collect()
        })
        .collect();

    let directory: usize = textures.iter().map(|t| 24 + t.chunks.len() * 24).sum();
    let mut offset = (out.len() + directory) as u64;
    for (texture, payloads) in textures.iter().zip(&payloads) {
        put_u32(&mut out, 0x1111_1111);
        out.extend_from_slice(b"dds\0");
        put_u32(&mut out, 0x2222_2222);
        out.push(0);
        out.push(texture.chunks.len() as u8);
        put_u16(&mut out, 24);
        put_u16(&mut out, texture.height);
        put_u16(&mut out, texture.width);
        out.push(texture.mip_count);
        out.push(texture.format);
        out.push(u8::from(texture.cube_map));
        out.push(0);

        let mut mip = 0u16;
        for (chunk, payload) in texture.chunks.iter().zip(payloads) {
            put_u64(&mut out, offset);
            put_u32(
                &mut out,
                if chunk.compress {
                    payload.len() as u32
                } else {
                    0
                },
            );
            put_u32(&mut out, chunk.data.len() as u32);
            put_u16(&mut out, mip);
            put_u16(&mut out, mip);
            put_u32(&mut out, 0xBAAD_F00D);
            mip += 1;
            offset += payload.len() as u64;
        }
    }

    for payload in payloads.iter().flatten() {
        out.extend_from_slice(payload);
    }
    ba2_names(&mut out, patch, textures.iter().map(|t| t.name));
    out
}

/// A file of a BSA archive
pub struct BsaEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    /// Invert the archive's default compression for this file
    pub toggle: bool,
}

/// A folder of a BSA archive
pub struct BsaFolder<'a> {
    pub name: &'a str,
    pub files: Vec<BsaEntry<'a>>,
}

pub const FOLDER_NAMES: u32 = 1;
pub const FILE_NAMES: u32 = 2;
pub const COMPRESSED: u32 = 4;
pub const EMBEDDED_NAMES: u32 = 0x100;

/// Build a BSA archive. Compressed files use zlib before version 105 and LZ4 from it.
pub fn bsa(version: u32, flags: u32, folders: &[BsaFolder]) -> Vec<u8> {
    let file_count: usize = folders.iter().map(|f| f.files.len()).sum();
    let folder_record_size = if version >= 105 { 24 } else { 16 };
    let folder_names_length: usize = folders.iter().map(|f| f.name.len() + 1).sum();
    let file_names_length: usize = folders
        .iter()
        .flat_map(|f| &f.files)
        .map(|f| f.name.len() + 1)
        .sum();

    let mut out = Vec::new();
    out.extend_from_slice(b"BSA\0");
    for value in [
        version,
        36,
        flags,
        folders.len() as u32,
        file_count as u32,
        folder_names_length as u32,
        file_names_length as u32,
        0,
    ] {
        put_u32(&mut out, value);
    }

    let records_start = 36 + folders.len() * folder_record_size;
    let mut blocks_size = file_count * 16;
    if flags & FOLDER_NAMES != 0 {
        blocks_size += folders.iter().map(|f| f.name.len() + 2).sum::<usize>();
    }
    let mut data_offset = records_start + blocks_size;
    if flags & FILE_NAMES != 0 {
        data_offset += file_names_length;
    }

    // folder records
    let mut block_offset = records_start;
    for (i, folder) in folders.iter().enumerate() {
        put_u64(&mut out, 0xF000 + i as u64);
        put_u32(&mut out, folder.files.len() as u32);
        let offset = (block_offset + file_names_length) as u64;
        if version >= 105 {
            put_u32(&mut out, 0);
            put_u64(&mut out, offset);
        } else {
            put_u32(&mut out, offset as u32);
        }
        block_offset += folder.files.len() * 16;
        if flags & FOLDER_NAMES != 0 {
            block_offset += folder.name.len() + 2;
        }
    }

    // file record blocks, payloads collected on the side
    let mut data = Vec::new();
    for (i, folder) in folders.iter().enumerate() {
        if flags & FOLDER_NAMES != 0 {
            out.push(folder.name.len() as u8 + 1);
            out.extend_from_slice(folder.name.as_bytes());
            out.push(0);
        }
        for (j, file) in folder.files.iter().enumerate() {
            let mut payload = Vec::new();
            if version >= 104 && flags & EMBEDDED_NAMES != 0 {
                let path = format!("{}\\{}", folder.name, file.name);
                payload.push(path.len() as u8);
                payload.extend_from_slice(path.as_bytes());
            }
            let compressed = (flags & COMPRESSED != 0) != file.toggle;
            if compressed {
                put_u32(&mut payload, file.data.len() as u32);
                if version >= 105 {
                    payload.extend_from_slice(&lz4(file.data));
                } else {
                    payload.extend_from_slice(&zlib(file.data));
                }
            } else {
                payload.extend_from_slice(file.data);
            }

            put_u64(&mut out, ((i as u64) << 32) | j as u64);
            let mut size = payload.len() as u32;
            if file.toggle {
                size |= 1 << 30;
            }
            put_u32(&mut out, size);
            put_u32(&mut out, (data_offset + data.len()) as u32);
            data.extend_from_slice(&payload);
        }
    }

    if flags & FILE_NAMES != 0 {
        for file in folders.iter().flat_map(|f| &f.files) {
            out.extend_from_slice(file.name.as_bytes());
            out.push(0);
        }
    }

    assert_eq!(out.len(), data_offset);
    out.extend_from_slice(&data);
    out
}
