//! DDS header synthesis for texture archives.
//!
//! Texture archives store only the pixel data of each mip chunk, the header is rebuilt from
//! the record when a texture is extracted.

use crate::types::Ba2TextureRecord;

/// `"DDS "` + `DDS_HEADER` + `DDS_HEADER_DXT10`
pub const DDS_HEADER_SIZE: usize = 148;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PITCH: u32 = 0x8;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSD_LINEARSIZE: u32 = 0x8_0000;

const DDPF_FOURCC: u32 = 0x4;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDSCAPS2_CUBEMAP_ALL_FACES: u32 = 0xFE00;

const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
const D3D11_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

/// How the size of the top mip level is described for a DXGI format
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Pitch {
    /// Block compressed, bytes per 4x4 block
    Blocks(u32),
    /// Uncompressed, bytes per pixel
    Pixels(u32),
    Unknown,
}

fn pitch(format: u8) -> Pitch {
    match format {
        // BC1, BC4
        70..=72 | 79..=81 => Pitch::Blocks(8),
        // BC2, BC3, BC5, BC6H, BC7
        73..=78 | 82..=84 | 94..=99 => Pitch::Blocks(16),
        // R32G32B32A32
        1..=4 => Pitch::Pixels(16),
        // R16G16B16A16
        9..=14 => Pitch::Pixels(8),
        // R10G10B10A2, R8G8B8A8, R16G16, R32, B8G8R8A8, B8G8R8X8
        23..=43 | 87..=93 => Pitch::Pixels(4),
        // R8G8, R16, B5G6R5, B5G5R5A1
        48..=59 | 85 | 86 | 115 => Pitch::Pixels(2),
        // R8, A8
        60..=65 => Pitch::Pixels(1),
        _ => Pitch::Unknown,
    }
}

/// Write the header of a texture record to `out`.
pub fn write_header(out: &mut Vec<u8>, texture: &Ba2TextureRecord) {
    let width = u32::from(texture.width);
    let height = u32::from(texture.height);
    let mip_count = u32::from(texture.mip_count).max(1);

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_MIPMAPCOUNT;
    let pitch_or_linear_size = match pitch(texture.format) {
        Pitch::Blocks(block) => {
            flags |= DDSD_LINEARSIZE;
            width.div_ceil(4).max(1) * height.div_ceil(4).max(1) * block
        }
        Pitch::Pixels(bytes) => {
            flags |= DDSD_PITCH;
            width * bytes
        }
        Pitch::Unknown => 0,
    };

    let mut caps = DDSCAPS_TEXTURE;
    if mip_count > 1 {
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    let mut caps2 = 0;
    let mut misc = 0;
    if texture.is_cube_map() {
        caps |= DDSCAPS_COMPLEX;
        caps2 |= DDSCAPS2_CUBEMAP_ALL_FACES;
        misc |= D3D11_RESOURCE_MISC_TEXTURECUBE;
    }

    out.reserve(DDS_HEADER_SIZE);
    let mut put = |value: u32| out.extend_from_slice(&value.to_le_bytes());

    put(u32::from_le_bytes(*b"DDS "));

    // DDS_HEADER
    put(124);
    put(flags);
    put(height);
    put(width);
    put(pitch_or_linear_size);
    put(0); // depth
    put(mip_count);
    (0..11).for_each(|_| put(0));

    // DDS_PIXELFORMAT
    put(32);
    put(DDPF_FOURCC);
    put(u32::from_le_bytes(*b"DX10"));
    (0..5).for_each(|_| put(0));

    put(caps);
    put(caps2);
    (0..3).for_each(|_| put(0));

    // DDS_HEADER_DXT10
    put(u32::from(texture.format));
    put(D3D10_RESOURCE_DIMENSION_TEXTURE2D);
    put(misc);
    put(1); // array size
    put(0);
}
