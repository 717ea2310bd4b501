use std::any::Any;
use std::sync::Arc;

use super::{read_be, write_be, AccessSize, RegisterBank};
use crate::chunk::Tag;
use crate::error::{CoreError, Result};
use crate::screen::Screen;
use crate::session::{Compression, RLE_RAM_TAG};

/// Main memory. Writes landing in the LCD frame buffer mark the screen dirty.
pub struct RamBank {
    base: u32,
    data: Vec<u8>,
    screen: Arc<Screen>,
}

impl RamBank {
    pub fn new(base: u32, size: usize, screen: Arc<Screen>) -> Self {
        Self {
            base,
            data: vec![0; size],
            screen,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// `len` bytes at absolute address `addr`, if they are all backed.
    pub fn slice(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let start = addr.checked_sub(self.base)? as usize;
        self.data.get(start..start.checked_add(len)?)
    }
}

impl RegisterBank for RamBank {
    fn name(&self) -> &'static str {
        "RAM"
    }

    fn base(&self) -> u32 {
        self.base
    }

    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn tag(&self) -> Tag {
        RLE_RAM_TAG
    }

    fn compression(&self) -> Compression {
        Compression::Rle
    }

    fn reset(&mut self) {
        self.data.fill(0);
    }

    fn read(&mut self, addr: u32, size: AccessSize) -> u32 {
        let offset = addr.wrapping_sub(self.base);
        read_be(size, |i| {
            self.data
                .get(offset.wrapping_add(i) as usize)
                .copied()
                .unwrap_or(0)
        })
    }

    fn write(&mut self, addr: u32, size: AccessSize, value: u32) {
        let offset = addr.wrapping_sub(self.base);
        let data = &mut self.data;
        write_be(size, value, |i, b| {
            if let Some(slot) = data.get_mut(offset.wrapping_add(i) as usize) {
                *slot = b;
            }
        });
        if self.screen.in_frame_buffer(addr) {
            self.screen.mark_dirty(addr, size.bytes());
        }
    }

    fn save_state(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn load_state(&mut self, state: &[u8]) -> Result<()> {
        if state.len() != self.data.len() {
            return Err(CoreError::ChunkSize {
                tag: self.tag(),
                expected: self.data.len(),
                actual: state.len(),
            });
        }
        self.data.copy_from_slice(state);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
