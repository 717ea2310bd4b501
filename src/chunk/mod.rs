//! Tagged chunk files.
//!
//! A chunk file is a flat sequence of `[tag: u32 BE][length: u32 BE][payload]`
//! records with no index or trailer. Writes always append; lookups scan from
//! the start and return the first record with a matching tag.

mod buffer;

pub use buffer::{Chunk, ChunkStream};

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{CoreError, Result};

const HEADER_LEN: u64 = 8;

/// Four-character record tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl Tag {
    pub const fn new(code: &[u8; 4]) -> Self {
        Tag(u32::from_be_bytes(*code))
    }

    pub fn bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            bytes.iter().try_for_each(|&b| write!(f, "{}", b as char))
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

/// Scalars stored big-endian in their native width.
pub trait ChunkInt: Sized + Copy {
    const SIZE: usize;
    fn from_be_slice(bytes: &[u8]) -> Self;
    fn write_be(self, out: &mut Vec<u8>);
}

macro_rules! chunk_int {
    ($($t:ty),* $(,)?) => {
        $(impl ChunkInt for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$t>::from_be_bytes(raw)
            }

            fn write_be(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        })*
    };
}

chunk_int!(u8, i8, u16, i16, u32, i32);

pub struct ChunkFile<S> {
    stream: S,
}

impl<S: Read + Write + Seek> ChunkFile<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Locate the first record tagged `tag`. On success the stream is left at
    /// the start of its payload and the payload length is returned.
    pub fn find_chunk(&mut self, tag: Tag) -> Result<Option<u32>> {
        let file_len = self.stream.seek(SeekFrom::End(0))?;
        let mut offset = self.stream.seek(SeekFrom::Start(0))?;

        while offset < file_len {
            let (chunk_tag, len) = self.read_header(offset, file_len)?;
            if chunk_tag == tag {
                return Ok(Some(len));
            }
            offset = self.stream.seek(SeekFrom::Current(len as i64))?;
        }
        Ok(None)
    }

    /// Read the payload of the first record tagged `tag` into `chunk`.
    pub fn read_chunk(&mut self, tag: Tag, chunk: &mut Chunk) -> Result<bool> {
        let Some(len) = self.find_chunk(tag)? else {
            return Ok(false);
        };
        self.read_payload(len, chunk)?;
        Ok(true)
    }

    /// Read the `index`th record in file order, whatever its tag.
    pub fn read_chunk_at(&mut self, index: usize, chunk: &mut Chunk) -> Result<Option<Tag>> {
        let file_len = self.stream.seek(SeekFrom::End(0))?;
        let mut offset = self.stream.seek(SeekFrom::Start(0))?;
        let mut remaining = index;

        while offset < file_len {
            let (tag, len) = self.read_header(offset, file_len)?;
            if remaining == 0 {
                self.read_payload(len, chunk)?;
                return Ok(Some(tag));
            }
            offset = self.stream.seek(SeekFrom::Current(len as i64))?;
            remaining -= 1;
        }
        Ok(None)
    }

    /// Tags and payload lengths of every record, in file order.
    pub fn list_chunks(&mut self) -> Result<Vec<(Tag, u32)>> {
        let file_len = self.stream.seek(SeekFrom::End(0))?;
        let mut offset = self.stream.seek(SeekFrom::Start(0))?;
        let mut out = Vec::new();

        while offset < file_len {
            let (tag, len) = self.read_header(offset, file_len)?;
            out.push((tag, len));
            offset = self.stream.seek(SeekFrom::Current(len as i64))?;
        }
        Ok(out)
    }

    pub fn read_int<T: ChunkInt>(&mut self, tag: Tag) -> Result<Option<T>> {
        let Some(len) = self.find_chunk(tag)? else {
            return Ok(None);
        };
        if (len as usize) < T::SIZE {
            return Err(CoreError::ChunkSize {
                tag,
                expected: T::SIZE,
                actual: len as usize,
            });
        }
        let mut raw = [0u8; 4];
        self.stream.read_exact(&mut raw[..T::SIZE])?;
        Ok(Some(T::from_be_slice(&raw)))
    }

    /// Strings are stored without a terminator. Invalid UTF-8 is replaced.
    pub fn read_string(&mut self, tag: Tag) -> Result<Option<String>> {
        let Some(len) = self.find_chunk(tag)? else {
            return Ok(None);
        };
        let mut raw = vec![0u8; len as usize];
        self.stream.read_exact(&mut raw)?;
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Append a record. Existing records with the same tag are left in place.
    pub fn write_chunk(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len())
            .map_err(|_| CoreError::Other(format!("chunk {tag} is larger than 4 GiB")))?;
        self.stream.seek(SeekFrom::End(0))?;
        self.stream.write_all(&tag.0.to_be_bytes())?;
        self.stream.write_all(&len.to_be_bytes())?;
        self.stream.write_all(data)?;
        log::trace!("wrote chunk {tag} ({len} bytes)");
        Ok(())
    }

    pub fn write_int<T: ChunkInt>(&mut self, tag: Tag, value: T) -> Result<()> {
        let mut raw = Vec::with_capacity(T::SIZE);
        value.write_be(&mut raw);
        self.write_chunk(tag, &raw)
    }

    pub fn write_string(&mut self, tag: Tag, s: &str) -> Result<()> {
        self.write_chunk(tag, s.as_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    /// Read the record header at `offset`. A length running past the end
    /// of the stream is rejected before anything is sized from it.
    fn read_header(&mut self, offset: u64, file_len: u64) -> Result<(Tag, u32)> {
        let mut header = [0u8; HEADER_LEN as usize];
        self.stream.read_exact(&mut header)?;
        let tag = Tag(u32::from_be_bytes([header[0], header[1], header[2], header[3]]));
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        let available = file_len.saturating_sub(offset + HEADER_LEN);
        if u64::from(len) > available {
            return Err(CoreError::ChunkSize {
                tag,
                expected: len as usize,
                actual: available as usize,
            });
        }
        Ok((tag, len))
    }

    fn read_payload(&mut self, len: u32, chunk: &mut Chunk) -> Result<()> {
        chunk.set_length(len as usize);
        self.stream.read_exact(chunk.as_mut_slice())?;
        Ok(())
    }
}
