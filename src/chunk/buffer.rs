use std::borrow::BorrowMut;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Growth headroom added whenever a chunk has to reallocate.
const SLUSH: usize = 100;

/// A growable byte buffer holding one chunk payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_length(len: usize) -> Self {
        let mut chunk = Self::new();
        chunk.set_length(len);
        chunk
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resize the payload. Growing past the allocation reserves extra room;
    /// a length of zero releases the allocation.
    pub fn set_length(&mut self, len: usize) {
        if len > self.data.capacity() {
            self.data.reserve_exact(len + SLUSH - self.data.len());
        } else if len == 0 {
            self.data = Vec::new();
            return;
        }
        self.data.resize(len, 0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for Chunk {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Seekable stream over a chunk, owned (`ChunkStream<Chunk>`) or borrowed
/// (`ChunkStream<&mut Chunk>`). Writes past the end grow the chunk.
pub struct ChunkStream<C> {
    chunk: C,
    pos: u64,
}

impl<C: BorrowMut<Chunk>> ChunkStream<C> {
    pub fn new(chunk: C) -> Self {
        Self { chunk, pos: 0 }
    }

    pub fn into_inner(self) -> C {
        self.chunk
    }

    pub fn chunk(&self) -> &Chunk {
        self.chunk.borrow()
    }

    fn chunk_mut(&mut self) -> &mut Chunk {
        self.chunk.borrow_mut()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn set_length(&mut self, len: usize) {
        self.chunk_mut().set_length(len);
    }
}

impl<C: BorrowMut<Chunk>> Read for ChunkStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.pos as usize;
        let data = self.chunk().as_slice();
        let start = start.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl<C: BorrowMut<Chunk>> Write for ChunkStream<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let start = self.pos as usize;
        let end = start + buf.len();
        let chunk = self.chunk_mut();
        if end > chunk.len() {
            chunk.set_length(end);
        }
        chunk.as_mut_slice()[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: BorrowMut<Chunk>> Seek for ChunkStream<C> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.chunk().len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => len + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of chunk",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}
