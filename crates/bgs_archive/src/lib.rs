//! This library handles reading files from **BA2** and **BSA** archives used by *Bethesda* games.
//!
//! # Archive Format Documentation
//!
//! Several archives are usually read together, the files of later archives replacing files
//! with the same name in earlier ones. Names are normalized before they are indexed: ASCII
//! letters are lowercased, `\` becomes `/` and control characters, non-ASCII bytes and `:`
//! become `_`. All integers are little-endian.
//!
//! ## BA2
//!
//! | Offset (bytes) | Field             | Description                                            |
//! |----------------|-------------------|--------------------------------------------------------|
//! | 0x0000         | Magic number      | 4 bytes: "BTDX"                                        |
//! | 0x0004         | Version           | 4 bytes: 1, 2, 3, 7 or 8                               |
//! | 0x0008         | Type              | 4 bytes: "GNRL" for general files, "DX10" for textures |
//! | 0x000C         | File Count        | 4 bytes: Number of records                             |
//! | 0x0010         | Name Table Offset | 8 bytes: Offset of the name table, 0 if absent         |
//! | 0x0018         | Unknown           | 8 bytes: Versions 2 and 3 only                         |
//! | 0x0020         | Compression       | 4 bytes: Version 3 only, 0 zlib, 3 LZ4                 |
//!
//! ### General Records
//!
//! | Offset (bytes) | Field             | Description                                            |
//! |----------------|-------------------|--------------------------------------------------------|
//! | 0x0000         | Name Hash         | 4 bytes                                                |
//! | 0x0004         | Extension         | 4 bytes: NUL padded                                    |
//! | 0x0008         | Directory Hash    | 4 bytes                                                |
//! | 0x000C         | Flags             | 4 bytes                                                |
//! | 0x0010         | Offset            | 8 bytes: Offset of the payload                         |
//! | 0x0018         | Packed Size       | 4 bytes: 0 when stored uncompressed                    |
//! | 0x001C         | Unpacked Size     | 4 bytes                                                |
//! | 0x0020         | Sentinel          | 4 bytes: 0xBAADF00D                                    |
//!
//! ### Texture Records
//!
//! A 24 byte record (hashes, extension, chunk count, height, width, mip count, DXGI format,
//! cube map flag) followed by one 24 byte chunk per range of mip levels: offset, packed size,
//! unpacked size, first and last mip and the 0xBAADF00D sentinel. Extraction prepends a 148 byte
//! DDS header with a DX10 extension to the concatenated chunks.
//!
//! ### Name Table
//!
//! One entry per record: a 2 byte length followed by the path.
//!
//! ## BSA
//!
//! | Offset (bytes) | Field               | Description                                          |
//! |----------------|---------------------|------------------------------------------------------|
//! | 0x0000         | Magic number        | 4 bytes: "BSA\0"                                     |
//! | 0x0004         | Version             | 4 bytes: 103, 104 or 105                             |
//! | 0x0008         | Folder Offset       | 4 bytes: Always 36                                   |
//! | 0x000C         | Archive Flags       | 4 bytes: See below                                   |
//! | 0x0010         | Folder Count        | 4 bytes                                              |
//! | 0x0014         | File Count          | 4 bytes                                              |
//! | 0x0018         | Folder Names Length | 4 bytes                                              |
//! | 0x001C         | File Names Length   | 4 bytes                                              |
//! | 0x0020         | File Flags          | 4 bytes: Content types, unused                       |
//!
//! Archive flags:
//!   - bit 0: folder names precede each folder's file records
//!   - bit 1: a block of NUL terminated file names follows the file records
//!   - bit 2: files are compressed by default
//!   - bit 8: file data starts with the file's path (104 and 105)
//!
//! Folder records (`hash u64, count u32, offset u32`, version 105 `hash u64, count u32,
//! padding u32, offset u64`) are followed by one block of file records per folder
//! (`hash u64, size u32, offset u32`). Bit 30 of a file size inverts the default compression.
//! A compressed file starts with its 4 byte uncompressed size followed by a zlib stream
//! (103, 104) or an LZ4 frame (105).
//!

mod ba2;
mod bsa;
pub mod buffer;
pub mod dds;
pub mod error;
pub mod name;
pub mod read;
pub mod types;

pub use buffer::FileBuffer;
pub use error::{Error, ErrorKind};
pub use name::{normalize_name, ArchiveFilter};
pub use read::{ArchiveKind, ArchiveReader, FileDeclaration};
