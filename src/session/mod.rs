//! Saved emulator sessions on top of [`ChunkFile`].

pub mod rle;

use std::io::{Read, Seek, Write};

use crate::chunk::{ChunkFile, Tag};
use crate::error::{CoreError, Result};

pub const DEVICE_TAG: Tag = Tag::new(b"DStr");
pub const ROM_NAME_TAG: Tag = Tag::new(b"ROMn");
pub const BUGS_TAG: Tag = Tag::new(b"bugz");
pub const RLE_RAM_TAG: Tag = Tag::new(b"cram");
pub const RAW_RAM_TAG: Tag = Tag::new(b"ram ");

/// File-format fixes a session was written with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BugFixes(pub u32);

impl BugFixes {
    pub const BYTESWAPPED_STRUCTS: BugFixes = BugFixes(1);

    pub fn contains(self, other: BugFixes) -> bool {
        self.0 & other.0 != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    /// PackBits, prefixed by the unpacked size as a big-endian u32.
    Rle,
}

pub struct SessionFile<S> {
    file: ChunkFile<S>,
    can_reload: bool,
    bug_fixes: BugFixes,
    read_bug_fixes: bool,
    changed_bug_fixes: bool,
}

impl<S: Read + Write + Seek> SessionFile<S> {
    pub fn new(file: ChunkFile<S>) -> Self {
        Self {
            file,
            can_reload: false,
            bug_fixes: BugFixes::default(),
            read_bug_fixes: false,
            changed_bug_fixes: false,
        }
    }

    pub fn chunk_file(&mut self) -> &mut ChunkFile<S> {
        &mut self.file
    }

    /// Write back pending bug-fix flags and hand back the chunk file.
    pub fn finish(mut self) -> Result<ChunkFile<S>> {
        if self.changed_bug_fixes {
            self.file.write_int(BUGS_TAG, self.bug_fixes.0)?;
        }
        self.file.flush()?;
        Ok(self.file)
    }

    /// Whether a partially failed load may still be reloaded silently.
    pub fn can_reload(&self) -> bool {
        self.can_reload
    }

    pub fn set_can_reload(&mut self, can_reload: bool) {
        self.can_reload = can_reload;
    }

    pub fn fix_bug(&mut self, fix: BugFixes) {
        self.bug_fixes.0 |= fix.0;
        self.changed_bug_fixes = true;
    }

    pub fn includes_bug_fix(&mut self, fix: BugFixes) -> Result<bool> {
        if !self.read_bug_fixes {
            if let Some(bits) = self.file.read_int::<u32>(BUGS_TAG)? {
                self.bug_fixes.0 |= bits;
            }
            self.read_bug_fixes = true;
        }
        Ok(self.bug_fixes.contains(fix))
    }

    pub fn read_chunk(&mut self, tag: Tag, compression: Compression) -> Result<Option<Vec<u8>>> {
        let Some(len) = self.file.find_chunk(tag)? else {
            return Ok(None);
        };
        let mut raw = vec![0u8; len as usize];
        self.file.get_mut().read_exact(&mut raw)?;

        match compression {
            Compression::None => Ok(Some(raw)),
            Compression::Rle if raw.is_empty() => Ok(Some(raw)),
            Compression::Rle => {
                if raw.len() < 4 {
                    return Err(CoreError::ChunkSize {
                        tag,
                        expected: 4,
                        actual: raw.len(),
                    });
                }
                let unpacked = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
                rle::decode(&raw[4..], unpacked).map(Some)
            }
        }
    }

    pub fn write_chunk(&mut self, tag: Tag, data: &[u8], compression: Compression) -> Result<()> {
        match compression {
            Compression::None => self.file.write_chunk(tag, data),
            Compression::Rle => {
                let len = u32::try_from(data.len())
                    .map_err(|_| CoreError::Other(format!("chunk {tag} is larger than 4 GiB")))?;
                let mut packed = Vec::with_capacity(4 + rle::worst_size(data.len()));
                packed.extend_from_slice(&len.to_be_bytes());
                rle::encode(data, &mut packed);
                log::debug!("chunk {tag}: packed {} bytes into {}", data.len(), packed.len());
                self.file.write_chunk(tag, &packed)
            }
        }
    }

    /// RAM image, compressed or from older uncompressed sessions.
    pub fn read_ram_image(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(image) = self.read_chunk(RLE_RAM_TAG, Compression::Rle)? {
            return Ok(Some(image));
        }
        self.read_chunk(RAW_RAM_TAG, Compression::None)
    }

    pub fn write_ram_image(&mut self, image: &[u8]) -> Result<()> {
        self.write_chunk(RLE_RAM_TAG, image, Compression::Rle)
    }

    /// Size of the RAM image in bytes, without unpacking it.
    pub fn ram_image_size(&mut self) -> Result<Option<u32>> {
        if let Some(len) = self.file.find_chunk(RLE_RAM_TAG)? {
            if len < 4 {
                return Ok(Some(0));
            }
            let mut raw = [0u8; 4];
            self.file.get_mut().read_exact(&mut raw)?;
            return Ok(Some(u32::from_be_bytes(raw)));
        }
        self.file.find_chunk(RAW_RAM_TAG)
    }

    pub fn read_device(&mut self) -> Result<Option<String>> {
        self.file.read_string(DEVICE_TAG)
    }

    pub fn write_device(&mut self, device: &str) -> Result<()> {
        self.file.write_string(DEVICE_TAG, device)
    }

    pub fn read_rom_name(&mut self) -> Result<Option<String>> {
        self.file.read_string(ROM_NAME_TAG)
    }

    pub fn write_rom_name(&mut self, name: &str) -> Result<()> {
        self.file.write_string(ROM_NAME_TAG, name)
    }

    /// Register bank state, stored uncompressed under the bank's own tag.
    pub fn read_bank_state(&mut self, tag: Tag) -> Result<Option<Vec<u8>>> {
        self.read_chunk(tag, Compression::None)
    }

    pub fn write_bank_state(&mut self, tag: Tag, state: &[u8]) -> Result<()> {
        self.write_chunk(tag, state, Compression::None)
    }
}

#[cfg(test)]
mod tests;
