//! Frame-buffer dirty tracking.
//!
//! The emulation thread widens a dirty address span on every write into the
//! LCD frame buffer; the UI thread drains it once per frame through
//! [`Screen::get_bits`]. The span lives behind a mutex, so the two sides need
//! no other coordination to keep it consistent.

use parking_lot::Mutex;

use crate::pixmap::PixMap;

/// Lowest emulated address.
pub const EMU_NULL: u32 = 0;
/// One past the highest emulated address.
pub const EMU_EOM: u32 = u32::MAX;

pub const LED_RED: u16 = 0x01;
pub const LED_GREEN: u16 = 0x02;

/// Hardware queries the display pipeline depends on.
pub trait Hal {
    fn lcd_screen_on(&self) -> bool;
    fn lcd_backlight_on(&self) -> bool;
    /// Bitmask of [`LED_RED`] and [`LED_GREEN`].
    fn led_state(&self) -> u16;
    fn lcd_has_frame(&self) -> bool;
    fn vibrate_on(&self) -> bool;
    /// Address span `[begin, end)` of the frame buffer.
    fn lcd_begin_end(&self) -> (u32, u32);
    /// Fill `info.image` plus the first/last scanlines covered by
    /// `info.screen_low..info.screen_high`.
    fn lcd_scanlines(&mut self, info: &mut ScreenUpdateInfo);
}

/// What changed on the LCD since the last frame.
#[derive(Debug, Default)]
pub struct ScreenUpdateInfo {
    pub image: PixMap<'static>,
    pub first_line: i32,
    pub last_line: i32,
    pub left_margin: i32,
    pub lcd_on: bool,
    pub screen_low: u32,
    pub screen_high: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DirtyState {
    low: u32,
    high: u32,
    begin: u32,
    end: u32,
}

impl DirtyState {
    const CLEAN: DirtyState = DirtyState {
        low: EMU_EOM,
        high: EMU_NULL,
        begin: EMU_NULL,
        end: EMU_NULL,
    };

    fn all_dirty(&mut self) {
        self.low = EMU_NULL;
        self.high = EMU_EOM;
    }
}

#[derive(Debug)]
pub struct Screen {
    state: Mutex<DirtyState>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    /// Nothing dirty, no known frame buffer.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DirtyState::CLEAN),
        }
    }

    pub fn initialize(&self) {
        *self.state.lock() = DirtyState::CLEAN;
    }

    /// Everything dirty, frame buffer forgotten.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = DirtyState::CLEAN;
        state.all_dirty();
    }

    /// Everything dirty, frame buffer re-read from the hardware.
    pub fn load(&self, hal: &impl Hal) {
        let (begin, end) = hal.lcd_begin_end();
        let mut state = self.state.lock();
        state.all_dirty();
        state.begin = begin;
        state.end = end;
    }

    /// Widen the dirty span to cover `[address, address + size)`.
    pub fn mark_dirty(&self, address: u32, size: u32) {
        let end = address.saturating_add(size);
        let mut state = self.state.lock();
        // Both bounds: writes can land below the low mark and above the high
        // mark within the same frame.
        if address < state.low {
            state.low = address;
        }
        if end > state.high {
            state.high = end;
        }
        #[cfg(feature = "trace_screen_writes")]
        log::trace!(
            "dirty 0x{address:08X}+{size} -> 0x{:08X}..0x{:08X}",
            state.low,
            state.high
        );
    }

    /// Mark everything dirty and pick up a moved frame buffer.
    pub fn invalidate_all(&self, hal: &impl Hal) {
        let (begin, end) = hal.lcd_begin_end();
        let mut state = self.state.lock();
        state.all_dirty();
        if (begin, end) != (state.begin, state.end) {
            log::debug!(
                "LCD frame buffer now 0x{begin:08X}..0x{end:08X} (was 0x{:08X}..0x{:08X})",
                state.begin,
                state.end
            );
            state.begin = begin;
            state.end = end;
        }
    }

    /// Whether `address` falls in the frame buffer picked up by the last
    /// [`Screen::load`] or [`Screen::invalidate_all`].
    pub fn in_frame_buffer(&self, address: u32) -> bool {
        let state = self.state.lock();
        address >= state.begin && address < state.end
    }

    /// Current dirty span, for inspection.
    pub fn dirty_range(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.low, state.high)
    }

    /// Drain the dirty span, clipped to the frame buffer, into `info`.
    ///
    /// Returns false when nothing inside the frame buffer changed. Scanlines
    /// are fetched only when the LCD is on.
    pub fn get_bits(&self, hal: &mut impl Hal, info: &mut ScreenUpdateInfo) -> bool {
        info.lcd_on = hal.lcd_screen_on();

        let (begin, end) = hal.lcd_begin_end();
        {
            let mut state = self.state.lock();
            info.screen_low = state.low.max(begin);
            info.screen_high = state.high.min(end);
            state.low = EMU_EOM;
            state.high = EMU_NULL;
        }

        if info.screen_low >= info.screen_high {
            return false;
        }

        if info.lcd_on {
            hal.lcd_scanlines(info);
        }
        true
    }
}
