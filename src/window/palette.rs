//! Shared palettes for hosts that draw through a 256-color display.
//!
//! 256 entries = 20 reserved by the host + skin colors + LCD colors. Shallow
//! LCDs fit their whole palette next to 220 skin colors; deeper ones get 172
//! quantized LCD colors and 64 skin colors.

use super::{current_skin, HostWindow, Window};
use crate::error::Result;
use crate::pixmap::{PixMapFormat, RgbList};
use crate::quantizer::Quantizer;
use crate::screen::{Hal, ScreenUpdateInfo};

const COLOR_BITS: u32 = 6;
const POLITE_SKIN_COLORS: usize = 64;
const GREEDY_SKIN_COLORS: usize = 220;

/// The C library's reference `rand`, so palette shuffles are repeatable.
struct AnsiRand(u32);

impl AnsiRand {
    fn new(seed: u32) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.0 / 65_536) % 32_768
    }
}

impl<H: HostWindow, D: Hal> Window<H, D> {
    /// Palette covering both the LCD contents in `info` and the case.
    pub fn system_colors(&mut self, info: &ScreenUpdateInfo) -> Result<RgbList> {
        let image = &info.image;
        let lcd_colors = self.prefs.lcd_colors.max(1);

        if image.depth() <= 4 {
            let mut colors = image.color_table().to_vec();
            colors.extend(self.current_skin_colors(false)?);
            return Ok(colors);
        }

        let mut colors = if image.depth() == 8 {
            // Quantize the palette itself, not the image, so the result
            // holds until the palette changes. Shuffling spreads the merged
            // entries across the spectrum.
            let mut table = image.color_table().to_vec();
            let mut rng = AnsiRand::new(1);
            let len = table.len();
            for ii in 0..len {
                let jj = rng.next() as usize % len;
                table.swap(ii, jj);
            }
            let mut q = Quantizer::new(lcd_colors, COLOR_BITS);
            q.process_color_table(&table);
            q.color_table()
        } else {
            let mut q = Quantizer::new(lcd_colors, COLOR_BITS);
            if matches!(image.format(), PixMapFormat::Rgb24 | PixMapFormat::Argb32) {
                q.process_image(image)?;
            } else {
                let mut copy = image.clone();
                copy.convert_to_format(PixMapFormat::Rgb24)?;
                q.process_image(&copy)?;
            }
            q.color_table()
        };

        colors.extend(self.current_skin_colors(true)?);
        Ok(colors)
    }

    /// Quantized colors of the current skin, cached per mode. `polite`
    /// leaves room for [`crate::env::DEFAULT_LCD_COLORS`] LCD entries.
    pub fn current_skin_colors(&mut self, polite: bool) -> Result<RgbList> {
        let mut index = 0;
        if self.debug_mode {
            index |= 0x01;
        } else if self.gremlin_mode {
            index |= 0x02;
        }
        if self.active {
            index |= 0x04;
        }
        if polite {
            index |= 0x08;
        }

        if self.skin_colors[index].is_empty() {
            let mode = self.skin_mode();
            let skin = current_skin(&mut self.skin_current, &self.skin_base, mode);
            let max = if polite {
                POLITE_SKIN_COLORS
            } else {
                GREEDY_SKIN_COLORS
            };
            let mut q = Quantizer::new(max, COLOR_BITS);
            q.process_image(skin)?;
            self.skin_colors[index] = q.color_table();
        }
        Ok(self.skin_colors[index].clone())
    }
}
