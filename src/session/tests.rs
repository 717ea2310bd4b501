use super::*;

use crate::chunk::{Chunk, ChunkStream};

fn session() -> SessionFile<ChunkStream<Chunk>> {
    SessionFile::new(ChunkFile::new(ChunkStream::new(Chunk::new())))
}

#[test]
fn ram_image_round_trip() {
    let mut image = vec![0u8; 4096];
    image[100..110].copy_from_slice(b"0123456789");

    let mut s = session();
    s.write_ram_image(&image).unwrap();
    assert_eq!(s.ram_image_size().unwrap(), Some(4096));
    assert_eq!(s.read_ram_image().unwrap(), Some(image));

    // Mostly zeroes, so the stored chunk is far smaller.
    let (_, stored) = s.chunk_file().list_chunks().unwrap()[0];
    assert!(stored < 200);
}

#[test]
fn uncompressed_ram_fallback() {
    let mut s = session();
    s.chunk_file().write_chunk(RAW_RAM_TAG, &[1, 2, 3, 4]).unwrap();
    assert_eq!(s.ram_image_size().unwrap(), Some(4));
    assert_eq!(s.read_ram_image().unwrap(), Some(vec![1, 2, 3, 4]));
}

#[test]
fn missing_chunks() {
    let mut s = session();
    assert_eq!(s.read_ram_image().unwrap(), None);
    assert_eq!(s.ram_image_size().unwrap(), None);
    assert_eq!(s.read_device().unwrap(), None);
    assert!(!s.includes_bug_fix(BugFixes::BYTESWAPPED_STRUCTS).unwrap());
}

#[test]
fn bug_fixes_written_on_finish() {
    let mut s = session();
    s.write_device("PalmIIIc").unwrap();
    s.fix_bug(BugFixes::BYTESWAPPED_STRUCTS);
    let file = s.finish().unwrap();

    let mut reopened = SessionFile::new(file);
    assert!(reopened.includes_bug_fix(BugFixes::BYTESWAPPED_STRUCTS).unwrap());
    assert_eq!(reopened.read_device().unwrap().as_deref(), Some("PalmIIIc"));

    let mut file = reopened.finish().unwrap();
    let bugs = file
        .list_chunks()
        .unwrap()
        .into_iter()
        .filter(|(tag, _)| *tag == BUGS_TAG)
        .count();
    assert_eq!(bugs, 1);
}

#[test]
fn can_reload_flag() {
    let mut s = session();
    assert!(!s.can_reload());
    s.set_can_reload(true);
    assert!(s.can_reload());
}

#[test]
fn truncated_compressed_chunk() {
    let mut s = session();
    s.chunk_file().write_chunk(RLE_RAM_TAG, &[0, 0]).unwrap();
    assert!(matches!(
        s.read_ram_image(),
        Err(CoreError::ChunkSize { expected: 4, actual: 2, .. })
    ));
}

#[test]
fn inflated_unpacked_size() {
    let mut s = session();
    let mut packed = u32::MAX.to_be_bytes().to_vec();
    packed.extend_from_slice(&[0x81, 0xAA]);
    s.chunk_file().write_chunk(RLE_RAM_TAG, &packed).unwrap();
    assert!(matches!(s.read_ram_image(), Err(CoreError::Other(_))));
}

#[test]
fn bank_state_is_raw() {
    let tag = Tag::new(b"lcd ");
    let mut s = session();
    s.write_bank_state(tag, &[5, 6, 7]).unwrap();
    assert_eq!(s.read_bank_state(tag).unwrap(), Some(vec![5, 6, 7]));
    s.write_rom_name("palmos40-en-color.rom").unwrap();
    assert_eq!(
        s.read_rom_name().unwrap().as_deref(),
        Some("palmos40-en-color.rom")
    );
}
