//! Base types for the directory structures of BA2 and BSA files.

use binrw::BinRead;
use bitflags::bitflags;

/// Trailing marker of every BA2 record and texture chunk
pub const RECORD_SENTINEL: u32 = 0xBAAD_F00D;

/// BA2 file header
///
/// Starts with "BTDX". Versions 2 and 3 carry 8 extra bytes, version 3 adds the compression
/// method of the archive. Every payload is self-describing, so the method is never needed.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"BTDX", little)]
pub struct Ba2Header {
    /// Format version
    pub version: u32,

    /// Whether the archive holds general files or textures
    pub kind: Ba2Kind,

    /// Number of records following the header
    pub file_count: u32,

    /// Absolute offset of the name table, 0 when names are absent
    pub name_table_offset: u64,

    #[br(if(version == 2 || version == 3))]
    pub unknown: Option<u64>,

    /// 0 zlib, 3 LZ4
    #[br(if(version == 3))]
    pub compression: Option<u32>,
}

/// The two kinds of BA2 archive
#[derive(BinRead, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ba2Kind {
    /// Arbitrary files, one payload each
    #[br(magic = b"GNRL")]
    General,

    /// DDS textures split into mip chunks
    #[br(magic = b"DX10")]
    Texture,
}

/// Record of a general BA2 archive
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Ba2FileRecord {
    pub name_hash: u32,
    pub extension: [u8; 4],
    pub dir_hash: u32,
    pub flags: u32,

    /// Absolute offset of the payload
    pub offset: u64,

    /// Size of the payload in the archive, 0 when stored uncompressed
    pub packed_size: u32,

    pub unpacked_size: u32,

    #[br(assert(sentinel == RECORD_SENTINEL))]
    pub sentinel: u32,
}

/// Record of a texture BA2 archive
#[derive(BinRead, Debug, Default, Clone, PartialEq)]
#[br(little)]
pub struct Ba2TextureRecord {
    pub name_hash: u32,
    pub extension: [u8; 4],
    pub dir_hash: u32,
    pub unknown: u8,
    pub chunk_count: u8,
    pub chunk_header_size: u16,
    pub height: u16,
    pub width: u16,
    pub mip_count: u8,

    /// `DXGI_FORMAT` of the texture
    pub format: u8,

    /// Bit 0 marks a cube map
    pub flags: u8,

    pub tile_mode: u8,

    #[br(count = chunk_count)]
    pub chunks: Vec<Ba2TextureChunk>,
}

impl Ba2TextureRecord {
    /// Whether the texture is a cube map
    pub fn is_cube_map(&self) -> bool {
        self.flags & 1 != 0
    }
}

/// One independently compressed range of mip levels
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Ba2TextureChunk {
    /// Absolute offset of the payload
    pub offset: u64,

    /// Size of the payload in the archive, 0 when stored uncompressed
    pub packed_size: u32,

    pub unpacked_size: u32,
    pub start_mip: u16,
    pub end_mip: u16,

    #[br(assert(sentinel == RECORD_SENTINEL))]
    pub sentinel: u32,
}

bitflags! {
    /// Archive wide flags of a BSA file
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct BsaFlags: u32 {
        /// File record blocks start with the folder name
        const FOLDER_NAMES = 1 << 0;
        /// A block of file names follows the file records
        const FILE_NAMES = 1 << 1;
        /// Files are compressed unless their size toggles it
        const COMPRESSED = 1 << 2;
        /// File data starts with the full path of the file (104 and 105 only)
        const EMBEDDED_NAMES = 1 << 8;
    }
}

/// BSA file header
///
/// Starts with "BSA\0", all fields are little-endian.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"BSA\0", little)]
pub struct BsaHeader {
    /// 103, 104 or 105
    pub version: u32,

    /// Absolute offset of the folder records, always 36
    pub folder_offset: u32,

    #[br(map = BsaFlags::from_bits_retain)]
    pub archive_flags: BsaFlags,

    pub folder_count: u32,
    pub file_count: u32,

    /// Total length of all folder names
    pub folder_names_length: u32,

    /// Total length of the file name block
    pub file_names_length: u32,

    /// Content types present in the archive
    pub file_flags: u32,
}

/// BSA folder record, 16 bytes before version 105 and 24 bytes from it
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little, import(version: u32))]
pub struct BsaFolderRecord {
    pub hash: u64,

    /// Number of file records in this folder
    pub count: u32,

    #[br(if(version < 105))]
    pub offset_v104: Option<u32>,

    #[br(if(version >= 105))]
    pub padding: Option<u32>,

    #[br(if(version >= 105))]
    pub offset_v105: Option<u64>,
}

impl BsaFolderRecord {
    /// Offset of the file record block, including the total file name length
    pub(crate) fn offset(&self) -> u64 {
        self.offset_v105
            .or(self.offset_v104.map(u64::from))
            .unwrap_or_default()
    }
}

/// Size bit that inverts the archive's default compression
pub const BSA_COMPRESSION_TOGGLE: u32 = 1 << 30;

/// Size bits that do not belong to the stored size
pub const BSA_SIZE_FLAGS: u32 = 0xC000_0000;

/// BSA file record
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct BsaFileRecord {
    pub hash: u64,

    /// Stored size in the low 30 bits, compression toggle in bit 30
    pub size: u32,

    /// Absolute offset of the file data
    pub offset: u32,
}

impl BsaFileRecord {
    /// Number of bytes stored in the archive for this file
    pub fn stored_size(&self) -> u32 {
        self.size & !BSA_SIZE_FLAGS
    }

    /// Whether this file's compression differs from the archive default
    pub fn toggles_compression(&self) -> bool {
        self.size & BSA_COMPRESSION_TOGGLE != 0
    }
}
