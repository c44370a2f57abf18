mod common;

use std::collections::HashSet;

use bgs_archive::{ArchiveFilter, ArchiveKind, ArchiveReader, ErrorKind, FileBuffer};
use common::{
    ba2_general, ba2_textures, bsa, Ba2Entry, BsaEntry, BsaFolder, Chunk, Texture, COMPRESSED,
    EMBEDDED_NAMES, FILE_NAMES, FOLDER_NAMES,
};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn reader(archives: Vec<Vec<u8>>) -> ArchiveReader {
    reader_with(archives, &ArchiveFilter::default())
}

fn reader_with(archives: Vec<Vec<u8>>, filter: &ArchiveFilter) -> ArchiveReader {
    ArchiveReader::from_buffers(archives.into_iter().map(FileBuffer::from).collect(), filter)
        .unwrap()
}

#[traced_test]
#[test]
fn general_zlib_entry() {
    let data: Vec<u8> = (0..1024).map(|i| (i % 64) as u8).collect();
    let mut entry = Ba2Entry::zlib("Textures\\A.dds", &data);
    entry.padding = 400 - common::zlib(&data).len();
    let archive = ba2_general(1, &[entry]);

    let archives = reader(vec![archive]);
    assert_eq!(archives.list_files(), vec!["textures/a.dds".to_string()]);
    assert_eq!(archives.file_size("textures/a.dds").unwrap(), 1024);

    let declaration = archives.declaration("textures/a.dds").unwrap();
    assert_eq!(declaration.packed_size, 400);
    assert_eq!(declaration.unpacked_size, 1024);
    assert_eq!(declaration.kind, ArchiveKind::Ba2General);
    assert!(declaration.compressed);

    let extracted = archives.extract("textures/a.dds").unwrap();
    assert_eq!(extracted.len(), 1024);
    assert_eq!(extracted, data);
}

#[test]
fn all_ba2_versions() {
    for version in [1, 2, 3, 7, 8] {
        let archive = ba2_general(
            version,
            &[
                Ba2Entry::stored("meshes/a.nif", b"stored bytes"),
                Ba2Entry::zlib("meshes/b.nif", b"compressed bytes compressed bytes"),
            ],
        );

        let archives = reader(vec![archive]);
        assert_eq!(archives.len(), 2);
        assert_eq!(archives.extract("meshes/a.nif").unwrap(), b"stored bytes");
        assert_eq!(
            archives.extract("meshes/b.nif").unwrap(),
            b"compressed bytes compressed bytes"
        );
    }
}

#[test]
fn later_archive_wins() {
    let first = ba2_general(1, &[Ba2Entry::stored("meshes/x.nif", b"from A")]);
    let second = ba2_general(
        1,
        &[
            Ba2Entry::zlib("Meshes\\X.NIF", b"from B"),
            Ba2Entry::stored("meshes/y.nif", b"only B"),
        ],
    );

    let archives = reader(vec![first, second]);
    assert_eq!(archives.len(), 2);
    assert_eq!(archives.extract("meshes/x.nif").unwrap(), b"from B");
    assert_eq!(archives.declaration("meshes/x.nif").unwrap().archive, 1);
    assert_eq!(archives.archive_label(1), Some("buffer 1"));
}

#[test]
fn lookup_is_normalized() {
    let archive = ba2_general(1, &[Ba2Entry::stored("meshes/x.nif", b"x")]);
    let archives = reader(vec![archive]);

    assert!(archives.contains("Meshes\\X.NIF"));
    assert_eq!(archives.extract("Meshes\\X.NIF").unwrap(), b"x");
    assert_eq!(archives.file_size("MESHES/x.nif").unwrap(), 1);
}

#[test]
fn missing_file() {
    let archive = ba2_general(1, &[Ba2Entry::stored("meshes/x.nif", b"x")]);
    let archives = reader(vec![archive]);

    let err = archives.extract("meshes/y.nif").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        archives.file_size("meshes/y.nif").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(!archives.contains("meshes/y.nif"));
}

#[test]
fn corrupt_payload() {
    let mut archive = ba2_general(1, &[Ba2Entry::zlib("a.txt", b"some text to compress")]);
    // first byte of the payload follows the 24 byte header and one record
    archive[60 + 4] ^= 0xFF;

    let archives = reader(vec![archive]);
    let err = archives.extract("a.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn payload_outside_archive() {
    let mut archive = ba2_general(1, &[Ba2Entry::stored("a.txt", b"abc")]);
    // point the record past the end of the file
    archive[24 + 16..24 + 24].copy_from_slice(&10_000u64.to_le_bytes());

    let archives = reader(vec![archive]);
    let err = archives.extract("a.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(err.to_string().contains("a.txt"));
}

#[test]
fn unsupported_archive() {
    let err = ArchiveReader::from_buffers(
        vec![FileBuffer::from(b"BSA\0\x01\x00\x00\x00".to_vec())],
        &ArchiveFilter::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn texture_extraction() {
    let top: Vec<u8> = (0..=255u8).cycle().take(64 * 64).collect();
    let rest: Vec<u8> = vec![7u8; 32 * 32 + 16 * 16];
    let archive = ba2_textures(
        1,
        &[Texture {
            name: "textures/rock.dds",
            width: 128,
            height: 128,
            mip_count: 3,
            format: 98,
            cube_map: false,
            chunks: vec![
                Chunk {
                    data: &top,
                    compress: true,
                },
                Chunk {
                    data: &rest,
                    compress: false,
                },
            ],
        }],
    );

    let archives = reader(vec![archive]);
    let declaration = archives.declaration("textures/rock.dds").unwrap();
    assert_eq!(declaration.kind, ArchiveKind::Ba2Texture);
    let expected_size = 148 + top.len() + rest.len();
    assert_eq!(declaration.unpacked_size, expected_size as u64);

    let dds = archives.extract("textures/rock.dds").unwrap();
    assert_eq!(dds.len(), expected_size);
    assert_eq!(&dds[..4], b"DDS ");
    assert_eq!(&dds[84..88], b"DX10");
    // BC7: 32 x 32 blocks of 16 bytes
    assert_eq!(u32::from_le_bytes(dds[20..24].try_into().unwrap()), 16384);
    assert_eq!(dds[128], 98);
    assert_eq!(&dds[148..148 + top.len()], &top[..]);
    assert_eq!(&dds[148 + top.len()..], &rest[..]);
}

#[test]
fn bsa_104_zlib() {
    let archive = bsa(
        104,
        FOLDER_NAMES | FILE_NAMES | COMPRESSED,
        &[
            BsaFolder {
                name: "meshes\\rocks",
                files: vec![
                    BsaEntry {
                        name: "Rock01.nif",
                        data: b"compressed rock compressed rock",
                        toggle: false,
                    },
                    BsaEntry {
                        name: "rock02.nif",
                        data: b"stored rock",
                        toggle: true,
                    },
                ],
            },
            BsaFolder {
                name: "textures",
                files: vec![BsaEntry {
                    name: "sky.dds",
                    data: b"sky sky sky sky sky",
                    toggle: false,
                }],
            },
        ],
    );

    let archives = reader(vec![archive]);
    assert_eq!(
        archives.list_files(),
        vec![
            "meshes/rocks/rock01.nif".to_string(),
            "meshes/rocks/rock02.nif".to_string(),
            "textures/sky.dds".to_string(),
        ]
    );

    let rock = archives.declaration("meshes/rocks/rock01.nif").unwrap();
    assert_eq!(rock.kind, ArchiveKind::Bsa104);
    assert!(rock.compressed);
    assert!(!archives.declaration("meshes/rocks/rock02.nif").unwrap().compressed);

    assert_eq!(
        archives.extract("meshes\\rocks\\rock01.nif").unwrap(),
        b"compressed rock compressed rock"
    );
    assert_eq!(
        archives.extract("meshes/rocks/rock02.nif").unwrap(),
        b"stored rock"
    );
    assert_eq!(
        archives.file_size("textures/sky.dds").unwrap(),
        b"sky sky sky sky sky".len() as u64
    );
    assert_eq!(
        archives.extract("textures/sky.dds").unwrap(),
        b"sky sky sky sky sky"
    );
}

#[test]
fn bsa_105_lz4_with_embedded_names() {
    let archive = bsa(
        105,
        FOLDER_NAMES | FILE_NAMES | COMPRESSED | EMBEDDED_NAMES,
        &[BsaFolder {
            name: "sound\\fx",
            files: vec![
                BsaEntry {
                    name: "boom.wav",
                    data: b"boom boom boom boom boom boom",
                    toggle: false,
                },
                BsaEntry {
                    name: "hiss.wav",
                    data: b"hiss",
                    toggle: true,
                },
            ],
        }],
    );

    let archives = reader(vec![archive]);
    assert_eq!(
        archives.declaration("sound/fx/boom.wav").unwrap().kind,
        ArchiveKind::Bsa105
    );
    assert_eq!(
        archives.extract("sound/fx/boom.wav").unwrap(),
        b"boom boom boom boom boom boom"
    );
    assert_eq!(archives.extract("sound/fx/hiss.wav").unwrap(), b"hiss");
}

#[test]
fn bsa_embedded_names_only() {
    let archive = bsa(
        104,
        EMBEDDED_NAMES,
        &[BsaFolder {
            name: "Interface",
            files: vec![BsaEntry {
                name: "Menu.swf",
                data: b"menu",
                toggle: false,
            }],
        }],
    );

    let archives = reader(vec![archive]);
    assert_eq!(archives.list_files(), vec!["interface/menu.swf".to_string()]);
    assert_eq!(archives.extract("interface/menu.swf").unwrap(), b"menu");
}

#[test]
fn bsa_103_without_names() {
    let archive = bsa(
        103,
        COMPRESSED,
        &[BsaFolder {
            name: "meshes",
            files: vec![BsaEntry {
                name: "a.nif",
                data: b"anonymous anonymous",
                toggle: false,
            }],
        }],
    );

    let archives = reader(vec![archive]);
    let names = archives.list_files();
    assert_eq!(names, vec!["000000000000f000/0000000000000000".to_string()]);
    assert_eq!(archives.extract(&names[0]).unwrap(), b"anonymous anonymous");
}

#[test]
fn filters() {
    let archive = ba2_general(
        1,
        &[
            Ba2Entry::stored("meshes/rock.nif", b"1"),
            Ba2Entry::stored("meshes/lod/rock.nif", b"2"),
            Ba2Entry::stored("textures/rock.dds", b"3"),
        ],
    );

    let filter = ArchiveFilter::builder()
        .include(vec!["Meshes\\".into()])
        .exclude(vec!["/LOD/".into()])
        .build();
    let archives = reader_with(vec![archive.clone()], &filter);
    assert_eq!(archives.list_files(), vec!["meshes/rock.nif".to_string()]);

    let filter = ArchiveFilter::builder()
        .names(HashSet::from(["Textures\\Rock.dds".to_string()]))
        .build();
    let archives = reader_with(vec![archive], &filter);
    assert_eq!(archives.list_files(), vec!["textures/rock.dds".to_string()]);
}

#[test]
fn archives_without_matches_are_released() {
    let meshes = ba2_general(1, &[Ba2Entry::stored("meshes/a.nif", b"a")]);
    let textures = ba2_general(1, &[Ba2Entry::stored("textures/a.dds", b"b")]);

    let filter = ArchiveFilter::builder()
        .include(vec!["textures/".into()])
        .build();
    let archives = reader_with(vec![meshes, textures], &filter);

    assert_eq!(archives.archive_count(), 1);
    assert_eq!(archives.archive_label(0), Some("buffer 1"));
    assert_eq!(archives.declaration("textures/a.dds").unwrap().archive, 0);
    assert_eq!(archives.extract("textures/a.dds").unwrap(), b"b");
}

#[traced_test]
#[test]
fn open_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("b.ba2"),
        ba2_general(1, &[Ba2Entry::stored("meshes/x.nif", b"from b")]),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("A.BA2"),
        ba2_general(1, &[Ba2Entry::stored("meshes/x.nif", b"from a")]),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("c.bsa"),
        bsa(
            104,
            FOLDER_NAMES | FILE_NAMES,
            &[BsaFolder {
                name: "meshes",
                files: vec![BsaEntry {
                    name: "y.nif",
                    data: b"from c",
                    toggle: false,
                }],
            }],
        ),
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"not an archive").unwrap();
    std::fs::create_dir(dir.path().join("nested.ba2")).unwrap();

    let archives = ArchiveReader::open(dir.path(), &ArchiveFilter::default()).unwrap();
    assert_eq!(archives.archive_count(), 3);
    assert_eq!(archives.len(), 2);
    // sorted by file name: A.BA2, b.ba2, c.bsa
    assert_eq!(archives.extract("meshes/x.nif").unwrap(), b"from b");
    assert_eq!(archives.extract("meshes/y.nif").unwrap(), b"from c");

    let single =
        ArchiveReader::open(&dir.path().join("A.BA2"), &ArchiveFilter::default()).unwrap();
    assert_eq!(single.extract("meshes/x.nif").unwrap(), b"from a");

    let both = ArchiveReader::open_all(
        &[dir.path().join("b.ba2"), dir.path().join("A.BA2")],
        &ArchiveFilter::default(),
    )
    .unwrap();
    assert_eq!(both.extract("meshes/x.nif").unwrap(), b"from a");
}
