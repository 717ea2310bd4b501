//! LCD controller modelled on the DragonBall on-chip LCD block.
//!
//! Only the registers the display path needs are decoded; other offsets read
//! as zero and ignore writes. Backlight, LED and vibrator lines come from
//! board GPIOs on real hardware and are latched here in one extra register.

use std::any::Any;

use super::{read_be, write_be, AccessSize, RegisterBank, RamBank};
use crate::chunk::Tag;
use crate::error::Result;
use crate::geometry::Point;
use crate::pixmap::{PixMap, PixMapFormat, Rgb};
use crate::screen::{ScreenUpdateInfo, LED_GREEN, LED_RED};

/// Screen starting address.
pub const LSSA: u32 = 0x00;
/// Virtual page width, in 16-bit words.
pub const LVPW: u32 = 0x05;
/// Screen width in pixels.
pub const LXMAX: u32 = 0x08;
/// Screen height minus one.
pub const LYMAX: u32 = 0x0A;
/// Panel interface config; bits 0-1 select 1, 2 or 4 bits per pixel.
pub const LPICF: u32 = 0x20;
/// Clocking control; bit 7 enables the display.
pub const LCKCON: u32 = 0x27;
/// Pixel offset of the first displayed pixel.
pub const LPOSR: u32 = 0x2D;
/// Grey palette mapping for 2-bit mode, four 4-bit levels.
pub const LGPMR: u32 = 0x32;
/// Board control lines.
pub const BOARD: u32 = 0x40;

pub const LCKCON_LCDON: u8 = 0x80;

pub const BOARD_BACKLIGHT: u8 = 0x01;
pub const BOARD_LED_RED: u8 = 0x02;
pub const BOARD_LED_GREEN: u8 = 0x04;
pub const BOARD_VIBRATE: u8 = 0x08;

const BANK_SIZE: u32 = 0x100;

#[derive(Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct LcdController {
    base: u32,
    lssa: u32,
    lvpw: u8,
    lxmax: u16,
    lymax: u16,
    lpicf: u8,
    lckcon: u8,
    lposr: u8,
    lgpmr: u16,
    board: u8,
    has_frame: bool,
    fore_color: Rgb,
    back_color: Rgb,
    lit_color: Rgb,
}

impl LcdController {
    pub fn new(base: u32) -> Self {
        let mut lcd = Self {
            base,
            lssa: 0,
            lvpw: 0,
            lxmax: 0,
            lymax: 0,
            lpicf: 0,
            lckcon: 0,
            lposr: 0,
            lgpmr: 0,
            board: 0,
            has_frame: true,
            fore_color: Rgb::BLACK,
            back_color: Rgb::new(0x7B, 0x8C, 0x5A),
            lit_color: Rgb::new(0x64, 0xF0, 0xDC),
        };
        lcd.reset();
        lcd
    }

    /// Panel colors for "off" pixels with and without backlight, and "on" pixels.
    pub fn set_colors(&mut self, back: Rgb, lit: Rgb, fore: Rgb) {
        self.back_color = back;
        self.lit_color = lit;
        self.fore_color = fore;
    }

    pub fn set_has_frame(&mut self, has_frame: bool) {
        self.has_frame = has_frame;
    }

    pub fn depth(&self) -> u32 {
        match self.lpicf & 0x03 {
            0 => 1,
            1 => 2,
            _ => 4,
        }
    }

    pub fn width(&self) -> i32 {
        self.lxmax as i32
    }

    pub fn height(&self) -> i32 {
        self.lymax as i32 + 1
    }

    pub fn row_bytes(&self) -> usize {
        let packed = (self.width() as usize * self.depth() as usize).div_ceil(8);
        (self.lvpw as usize * 2).max(packed)
    }

    pub fn screen_on(&self) -> bool {
        self.lckcon & LCKCON_LCDON != 0
    }

    pub fn backlight_on(&self) -> bool {
        self.board & BOARD_BACKLIGHT != 0
    }

    pub fn vibrate_on(&self) -> bool {
        self.board & BOARD_VIBRATE != 0
    }

    pub fn has_frame(&self) -> bool {
        self.has_frame
    }

    pub fn led_state(&self) -> u16 {
        let mut state = 0;
        if self.board & BOARD_LED_RED != 0 {
            state |= LED_RED;
        }
        if self.board & BOARD_LED_GREEN != 0 {
            state |= LED_GREEN;
        }
        state
    }

    /// Frame buffer span `[begin, end)`.
    pub fn frame_range(&self) -> (u32, u32) {
        let len = self.row_bytes() as u32 * self.height() as u32;
        (self.lssa, self.lssa.saturating_add(len))
    }

    fn palette(&self) -> Vec<Rgb> {
        let back = if self.backlight_on() {
            self.lit_color
        } else {
            self.back_color
        };
        let mix = |level: u32| {
            let blend = |b: u8, f: u8| (b as i32 + (f as i32 - b as i32) * level as i32 / 15) as u8;
            Rgb::new(
                blend(back.red, self.fore_color.red),
                blend(back.green, self.fore_color.green),
                blend(back.blue, self.fore_color.blue),
            )
        };

        match self.depth() {
            1 => vec![mix(0), mix(15)],
            2 => (0..4)
                .map(|i| mix((self.lgpmr >> (4 * i)) as u32 & 0x0F))
                .collect(),
            _ => (0..16).map(mix).collect(),
        }
    }

    /// Copy the frame buffer out of `ram` and work out which scanlines the
    /// dirty span in `info` touches.
    pub fn scanlines(&self, ram: &RamBank, info: &mut ScreenUpdateInfo) {
        let format = match self.depth() {
            1 => PixMapFormat::Indexed1,
            2 => PixMapFormat::Indexed2,
            _ => PixMapFormat::Indexed4,
        };
        let row_bytes = self.row_bytes();
        let (begin, _) = self.frame_range();

        let mut image = PixMap::with_size(Point::new(self.width(), self.height()), format);
        image.set_row_bytes(row_bytes);
        image.set_color_table(&self.palette());
        let len = image.buffer_len();
        match ram.slice(begin, len) {
            Some(src) => image.bits_mut().copy_from_slice(src),
            None => log::warn!("LCD frame buffer 0x{begin:08X}+{len} is outside RAM"),
        }

        let rb = row_bytes.max(1) as u32;
        info.image = image;
        info.first_line = ((info.screen_low - begin) / rb) as i32;
        info.last_line = ((info.screen_high - begin - 1) / rb + 1) as i32;
        info.left_margin = (self.lposr & 0x0F) as i32;
    }

    fn read_byte(&self, offset: u32) -> u8 {
        match offset {
            0x00..=0x03 => (self.lssa >> (8 * (3 - offset))) as u8,
            LVPW => self.lvpw,
            0x08 => (self.lxmax >> 8) as u8,
            0x09 => self.lxmax as u8,
            0x0A => (self.lymax >> 8) as u8,
            0x0B => self.lymax as u8,
            LPICF => self.lpicf,
            LCKCON => self.lckcon,
            LPOSR => self.lposr,
            0x32 => (self.lgpmr >> 8) as u8,
            0x33 => self.lgpmr as u8,
            BOARD => self.board,
            _ => 0,
        }
    }

    fn write_byte(&mut self, offset: u32, value: u8) {
        match offset {
            0x00..=0x03 => {
                let shift = 8 * (3 - offset);
                // The start address is word aligned.
                let lssa = (self.lssa & !(0xFF << shift)) | ((value as u32) << shift);
                self.lssa = lssa & !1;
            }
            LVPW => self.lvpw = value,
            0x08 => self.lxmax = (self.lxmax & 0x00FF) | ((value as u16) << 8),
            0x09 => self.lxmax = (self.lxmax & 0xFF00) | value as u16,
            0x0A => self.lymax = (self.lymax & 0x00FF) | ((value as u16) << 8),
            0x0B => self.lymax = (self.lymax & 0xFF00) | value as u16,
            LPICF => self.lpicf = value,
            LCKCON => self.lckcon = value,
            LPOSR => self.lposr = value,
            0x32 => self.lgpmr = (self.lgpmr & 0x00FF) | ((value as u16) << 8),
            0x33 => self.lgpmr = (self.lgpmr & 0xFF00) | value as u16,
            BOARD => self.board = value,
            _ => log::trace!("LCD write to unknown offset 0x{offset:02X}"),
        }
    }
}

impl RegisterBank for LcdController {
    fn name(&self) -> &'static str {
        "LCD"
    }

    fn base(&self) -> u32 {
        self.base
    }

    fn size(&self) -> u32 {
        BANK_SIZE
    }

    fn tag(&self) -> Tag {
        Tag::new(b"LCDr")
    }

    /// Power-on state: 160x160 at 1 bpp, display off.
    fn reset(&mut self) {
        self.lssa = 0;
        self.lvpw = 10;
        self.lxmax = 160;
        self.lymax = 159;
        self.lpicf = 0;
        self.lckcon = 0;
        self.lposr = 0;
        self.lgpmr = 0xFA50;
        self.board = 0;
    }

    fn read(&mut self, addr: u32, size: AccessSize) -> u32 {
        let offset = addr.wrapping_sub(self.base);
        read_be(size, |i| self.read_byte(offset + i))
    }

    fn write(&mut self, addr: u32, size: AccessSize, value: u32) {
        let offset = addr.wrapping_sub(self.base);
        write_be(size, value, |i, b| self.write_byte(offset + i, b));
    }

    fn save_state(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    fn load_state(&mut self, state: &[u8]) -> Result<()> {
        let (lcd, _): (LcdController, usize) =
            bincode::decode_from_slice(state, bincode::config::standard())?;
        *self = lcd;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
