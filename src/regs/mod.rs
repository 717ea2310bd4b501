//! Memory-mapped peripherals and the address decoder that routes to them.

mod device;
pub mod lcd;
mod ram;

pub use device::{Device, LCD_REGS_BASE, RAM_BASE};
pub use lcd::LcdController;
pub use ram::RamBank;

use std::any::Any;
use std::io::{Read, Seek, Write};

use crate::chunk::Tag;
use crate::error::{CoreError, Result};
use crate::session::{Compression, SessionFile};

/// Width of a bus access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessSize {
    Byte = 1,
    Word = 2,
    Long = 4,
}

impl AccessSize {
    pub fn bytes(self) -> u32 {
        self as u32
    }

    pub fn mask(self) -> u32 {
        match self {
            AccessSize::Byte => 0xFF,
            AccessSize::Word => 0xFFFF,
            AccessSize::Long => 0xFFFF_FFFF,
        }
    }
}

/// Assemble a big-endian value from consecutive byte reads.
pub(crate) fn read_be(size: AccessSize, mut byte: impl FnMut(u32) -> u8) -> u32 {
    (0..size.bytes()).fold(0, |acc, i| (acc << 8) | byte(i) as u32)
}

/// Split a big-endian value into consecutive byte writes.
pub(crate) fn write_be(size: AccessSize, value: u32, mut byte: impl FnMut(u32, u8)) {
    let n = size.bytes();
    for i in 0..n {
        byte(i, (value >> (8 * (n - 1 - i))) as u8);
    }
}

/// One peripheral occupying `[base, base + size)` of the address space.
pub trait RegisterBank: Any + Send {
    fn name(&self) -> &'static str;
    fn base(&self) -> u32;
    fn size(&self) -> u32;

    /// Session chunk holding this bank's state.
    fn tag(&self) -> Tag;

    fn compression(&self) -> Compression {
        Compression::None
    }

    fn reset(&mut self);
    fn read(&mut self, addr: u32, size: AccessSize) -> u32;
    fn write(&mut self, addr: u32, size: AccessSize, value: u32);

    fn save_state(&self) -> Result<Vec<u8>>;
    fn load_state(&mut self, state: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn contains(&self, addr: u32) -> bool {
        addr.wrapping_sub(self.base()) < self.size()
    }

    /// Last address covered, inclusive.
    fn last(&self) -> u32 {
        self.base().wrapping_add(self.size().saturating_sub(1))
    }
}

/// Routes accesses to the bank that owns the address.
#[derive(Default)]
pub struct BankDispatcher {
    /// Sorted by base address, never overlapping.
    banks: Vec<Box<dyn RegisterBank>>,
}

impl BankDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, bank: Box<dyn RegisterBank>) -> Result<()> {
        let (base, last) = (bank.base() as u64, bank.last() as u64);
        if let Some(other) = self
            .banks
            .iter()
            .find(|b| base <= b.last() as u64 && (b.base() as u64) <= last)
        {
            return Err(CoreError::BankOverlap {
                base: bank.base(),
                last: bank.last(),
                other: other.name(),
            });
        }

        log::debug!(
            "mapped {} at 0x{:08X}..=0x{:08X}",
            bank.name(),
            bank.base(),
            bank.last()
        );
        let at = self.banks.partition_point(|b| b.base() < bank.base());
        self.banks.insert(at, bank);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    fn find(&self, addr: u32) -> Option<usize> {
        let after = self.banks.partition_point(|b| b.base() <= addr);
        let index = after.checked_sub(1)?;
        self.banks[index].contains(addr).then_some(index)
    }

    pub fn read(&mut self, addr: u32, size: AccessSize) -> Result<u32> {
        let index = self.find(addr).ok_or(CoreError::Unmapped(addr))?;
        Ok(self.banks[index].read(addr, size) & size.mask())
    }

    pub fn write(&mut self, addr: u32, size: AccessSize, value: u32) -> Result<()> {
        let index = self.find(addr).ok_or(CoreError::Unmapped(addr))?;
        let bank = &mut self.banks[index];
        #[cfg(feature = "trace_screen_writes")]
        log::trace!("{} <= 0x{:X} @ 0x{addr:08X}", bank.name(), value & size.mask());
        bank.write(addr, size, value & size.mask());
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for bank in &mut self.banks {
            bank.reset();
        }
    }

    pub fn bank<T: RegisterBank>(&self) -> Option<&T> {
        self.banks.iter().find_map(|b| b.as_any().downcast_ref::<T>())
    }

    pub fn bank_mut<T: RegisterBank>(&mut self) -> Option<&mut T> {
        self.banks
            .iter_mut()
            .find_map(|b| b.as_any_mut().downcast_mut::<T>())
    }

    pub fn save<S: Read + Write + Seek>(&self, session: &mut SessionFile<S>) -> Result<()> {
        for bank in &self.banks {
            let state = bank.save_state()?;
            session.write_chunk(bank.tag(), &state, bank.compression())?;
        }
        Ok(())
    }

    /// Restore every bank. A bank missing from the session is reset and the
    /// session is marked as not silently reloadable.
    pub fn load<S: Read + Write + Seek>(&mut self, session: &mut SessionFile<S>) -> Result<bool> {
        let mut complete = true;
        for bank in &mut self.banks {
            match session.read_chunk(bank.tag(), bank.compression())? {
                Some(state) => bank.load_state(&state)?,
                None => {
                    log::warn!("session has no {} state, using defaults", bank.name());
                    bank.reset();
                    complete = false;
                }
            }
        }
        if !complete {
            session.set_can_reload(false);
        }
        Ok(complete)
    }
}
