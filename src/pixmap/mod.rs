//! Resizable pixel buffers in indexed and direct-color layouts.

mod convert;
mod mask;

pub use convert::{copy_rect, is_supported};

use std::cell::OnceCell;

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::region::Region;

use convert::{direct_ops, Pixel};

/// Pixel layouts. Declaration order matters: `depth` indexes a table by it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bincode::Encode, bincode::Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixMapFormat {
    #[default]
    Indexed1,
    Indexed2,
    Indexed4,
    Indexed8,
    Rgb555,
    Bgr555,
    Rgb565,
    Bgr565,
    Rgb24,
    Bgr24,
    Argb32,
    Abgr32,
    Rgba32,
    Bgra32,
}

const DEPTHS: [u32; 14] = [1, 2, 4, 8, 16, 16, 16, 16, 24, 24, 32, 32, 32, 32];

impl PixMapFormat {
    pub const ALL: [PixMapFormat; 14] = [
        Self::Indexed1,
        Self::Indexed2,
        Self::Indexed4,
        Self::Indexed8,
        Self::Rgb555,
        Self::Bgr555,
        Self::Rgb565,
        Self::Bgr565,
        Self::Rgb24,
        Self::Bgr24,
        Self::Argb32,
        Self::Abgr32,
        Self::Rgba32,
        Self::Bgra32,
    ];

    /// Bits per pixel.
    pub fn depth(self) -> u32 {
        DEPTHS[self as usize]
    }

    pub fn is_indexed(self) -> bool {
        self.depth() <= 8
    }
}

/// One palette entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bincode::Encode, bincode::Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

pub type RgbList = Vec<Rgb>;

/// Recoloring applied by [`PixMap::convert_to_color`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tint {
    Gray = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
}

enum Pixels<'a> {
    /// Allocated on first access.
    Owned(OnceCell<Vec<u8>>),
    Borrowed(&'a mut [u8]),
}

/// A 2D pixel buffer.
///
/// Changing the size, depth or row stride drops an owned buffer; the next
/// access allocates a zeroed one. A borrowed buffer (see [`PixMap::set_bits`])
/// stays attached and is never freed by the pixmap.
pub struct PixMap<'a> {
    size: Point,
    format: PixMapFormat,
    row_bytes: usize,
    colors: RgbList,
    pixels: Pixels<'a>,
}

impl Default for PixMap<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PixMap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixMap")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("row_bytes", &self.row_bytes)
            .field("colors", &self.colors.len())
            .field("owned", &self.is_owned())
            .finish()
    }
}

/// Deep copy into an owned buffer.
impl Clone for PixMap<'_> {
    fn clone(&self) -> Self {
        let mut copy = PixMap {
            size: self.size,
            format: self.format,
            row_bytes: self.row_bytes,
            colors: self.colors.clone(),
            pixels: Pixels::Owned(OnceCell::new()),
        };
        copy.copy_pixel_buffer(self);
        copy
    }
}

impl<'a> PixMap<'a> {
    pub fn new() -> Self {
        Self {
            size: Point::new(0, 0),
            format: PixMapFormat::Indexed1,
            row_bytes: 0,
            colors: Vec::new(),
            pixels: Pixels::Owned(OnceCell::new()),
        }
    }

    /// Convenience constructor for an owned buffer of the given shape.
    pub fn with_size(size: Point, format: PixMapFormat) -> Self {
        let mut pm = Self::new();
        pm.set_format(format);
        pm.set_size(size);
        pm
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn set_size(&mut self, size: Point) {
        if self.size != size {
            self.size = size;
            self.row_bytes = self.determine_row_bytes();
            self.invalidate();
        }
    }

    pub fn depth(&self) -> u32 {
        self.format.depth()
    }

    pub fn format(&self) -> PixMapFormat {
        self.format
    }

    /// Switching between formats of equal depth keeps the buffer.
    pub fn set_format(&mut self, format: PixMapFormat) {
        let old_depth = self.depth();
        self.format = format;
        if old_depth != self.depth() {
            self.row_bytes = self.determine_row_bytes();
            self.invalidate();
        }
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn set_row_bytes(&mut self, row_bytes: usize) {
        if self.row_bytes != row_bytes {
            self.row_bytes = row_bytes;
            self.invalidate();
        }
    }

    pub fn color_table(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn set_color_table(&mut self, colors: &[Rgb]) {
        self.colors = colors.to_vec();
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.pixels, Pixels::Owned(_))
    }

    /// Bytes covered by `height * row_bytes`.
    pub fn buffer_len(&self) -> usize {
        self.size.y.max(0) as usize * self.row_bytes
    }

    pub fn bits(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Owned(cell) => cell.get_or_init(|| vec![0; self.buffer_len()]),
            Pixels::Borrowed(bits) => bits,
        }
    }

    pub fn bits_mut(&mut self) -> &mut [u8] {
        let len = self.buffer_len();
        match &mut self.pixels {
            Pixels::Owned(cell) => {
                cell.get_or_init(|| vec![0; len]);
                cell.get_mut().map(Vec::as_mut_slice).unwrap_or_default()
            }
            Pixels::Borrowed(bits) => bits,
        }
    }

    /// Adopt a caller-owned buffer without copying.
    pub fn set_bits(&mut self, bits: &'a mut [u8]) {
        self.invalidate();
        debug_assert!(bits.len() >= self.buffer_len(), "borrowed buffer too small");
        self.pixels = Pixels::Borrowed(bits);
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.row_bytes;
        &self.bits()[start..start + self.row_bytes]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.row_bytes;
        let rb = self.row_bytes;
        &mut self.bits_mut()[start..start + rb]
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(Point::new(0, 0), self.size)
    }

    /// Produce a closed 1-bit outline of this image in `dest`: every pixel
    /// that a flood from the border cannot reach without crossing a dark
    /// pixel is set.
    pub fn create_mask(&self, dest: &mut PixMap<'_>) -> Result<()> {
        let colors = [Rgb::WHITE, Rgb::BLACK];

        let mut src = PixMap::new();
        src.set_size(self.size);
        src.set_format(PixMapFormat::Indexed1);
        src.set_color_table(&colors);
        let rect = self.bounds();
        copy_rect(&mut src, self, rect, rect)?;

        dest.set_size(self.size);
        dest.set_format(PixMapFormat::Indexed1);
        dest.set_color_table(&colors);

        let row_bytes = src.row_bytes();
        let height = src.size().y.max(0) as usize;
        mask::make_mask(dest.bits_mut(), src.bits(), row_bytes, height);
        Ok(())
    }

    /// Scan-convert the set bits of a 1-bit pixmap into a region.
    pub fn create_region(&self) -> Region {
        debug_assert_eq!(self.format, PixMapFormat::Indexed1);
        let mut region = Region::new();
        let width = self.size.x.max(0);
        for yy in 0..self.size.y.max(0) {
            let row = self.row(yy as usize);
            let mut start = 0;
            let mut inside = false;
            for xx in 0..width {
                let now = row[(xx / 8) as usize] & (0x80 >> (xx % 8)) != 0;
                if now && !inside {
                    start = xx;
                } else if !now && inside {
                    add_run(&mut region, yy, start, xx);
                }
                inside = now;
            }
            if inside {
                add_run(&mut region, yy, start, width);
            }
        }
        region
    }

    /// Blend toward white (positive `percent`) or black (negative).
    pub fn change_tone(&mut self, percent: i32) {
        self.change_tone_lines(percent, 0, self.size.y);
    }

    /// [`PixMap::change_tone`] restricted to rows `first..last`. Indexed
    /// pixmaps adjust their palette instead, ignoring the range.
    pub fn change_tone_lines(&mut self, percent: i32, first: i32, last: i32) {
        assert!((-100..=100).contains(&percent), "tone percent out of range: {percent}");
        let amount = percent * 255 / 100;
        self.adjust(first, last, |p| tone(p, amount));
    }

    pub fn convert_to_color(&mut self, tint: Tint) {
        self.convert_to_color_lines(tint, 0, self.size.y);
    }

    pub fn convert_to_color_lines(&mut self, tint: Tint, first: i32, last: i32) {
        self.adjust(first, last, |p| recolor(p, tint));
    }

    fn adjust(&mut self, first: i32, last: i32, f: impl Fn(&mut Pixel)) {
        if self.format.is_indexed() {
            for rgb in &mut self.colors {
                let mut p = Pixel { r: rgb.red, g: rgb.green, b: rgb.blue, a: 0 };
                f(&mut p);
                *rgb = Rgb::new(p.r, p.g, p.b);
            }
            return;
        }
        let Some(ops) = direct_ops(self.format) else {
            log::warn!("no pixel accessors for {:?}", self.format);
            return;
        };
        let width = self.size.x.max(0) as usize;
        let first = first.max(0) as usize;
        let last = last.clamp(0, self.size.y.max(0)) as usize;
        for yy in first..last {
            let row = self.row_mut(yy);
            for px in row.chunks_exact_mut(ops.bytes).take(width) {
                let mut p = (ops.get)(px);
                f(&mut p);
                (ops.put)(px, p);
            }
        }
    }

    /// Mirror the image vertically.
    pub fn flip_scanlines(&mut self) {
        let rb = self.row_bytes;
        let height = self.size.y.max(0) as usize;
        if rb == 0 || height < 2 {
            return;
        }
        let bits = &mut self.bits_mut()[..height * rb];
        let (mut top, mut bottom) = (0, height - 1);
        while bottom > top {
            let (upper, lower) = bits.split_at_mut(bottom * rb);
            upper[top * rb..(top + 1) * rb].swap_with_slice(&mut lower[..rb]);
            top += 1;
            bottom -= 1;
        }
    }

    /// Re-encode the pixels in another format.
    pub fn convert_to_format(&mut self, format: PixMapFormat) -> Result<()> {
        let mut dest = PixMap::new();
        dest.set_size(self.size);
        dest.set_format(format);
        dest.set_color_table(&self.colors);
        let rect = self.bounds();
        copy_rect(&mut dest, self, rect, rect)?;

        self.set_format(format);
        self.row_bytes = dest.row_bytes;
        self.copy_pixel_buffer(&dest);
        Ok(())
    }

    fn determine_row_bytes(&self) -> usize {
        let width = self.size.x.max(0) as usize;
        ((width * self.depth() as usize + 31) & !31) / 8
    }

    fn invalidate(&mut self) {
        if let Pixels::Owned(cell) = &mut self.pixels {
            *cell = OnceCell::new();
        }
    }

    fn copy_pixel_buffer(&mut self, other: &PixMap<'_>) {
        self.invalidate();
        let len = self.buffer_len();
        if let Pixels::Borrowed(bits) = &self.pixels {
            if bits.len() < len {
                self.pixels = Pixels::Owned(OnceCell::new());
            }
        }
        let src = other.bits();
        let n = len.min(src.len());
        self.bits_mut()[..n].copy_from_slice(&src[..n]);
    }
}

fn add_run(region: &mut Region, y: i32, left: i32, right: i32) {
    let run = Rect::new(left, y, right, y + 1);
    if region.is_empty() {
        region.set_rect(run);
    } else {
        region.union_with(&Region::from_rect(run));
    }
}

fn tone(p: &mut Pixel, amount: i32) {
    let shift = |v: u8| -> u8 {
        let v32 = v as i32;
        let delta = if amount >= 0 {
            amount - v32 * amount / 255
        } else {
            v32 * amount / 255
        };
        (v32 + delta) as u8
    };
    p.r = shift(p.r);
    p.g = shift(p.g);
    p.b = shift(p.b);
}

fn recolor(p: &mut Pixel, tint: Tint) {
    let gray = (p.r as f64 * 0.2990 + p.g as f64 * 0.5870 + p.b as f64 * 0.1140) as u8;
    (p.r, p.g, p.b) = match tint {
        Tint::Gray => (gray, gray, gray),
        Tint::Red => (gray, 0, 0),
        Tint::Green => (0, gray, 0),
        Tint::Blue => (0, 0, gray),
    };
}

#[cfg(test)]
mod tests;
