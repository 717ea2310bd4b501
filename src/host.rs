//! Host-side pixel buffers: conversion into a caller-owned RGB565 buffer and
//! an in-memory [`HostWindow`] that composes the whole device image.

use std::path::Path;

use image::RgbImage;

use crate::error::{CoreError, Result};
use crate::geometry::{Point, Rect};
use crate::pixmap::{copy_rect, PixMap, PixMapFormat, Rgb};
use crate::screen::ScreenUpdateInfo;
use crate::window::HostWindow;

/// Convert rows `first_line..last_line` of `src` into `dest`, a 16-bit
/// RGB565 buffer `src` wide (twice that when `scale` is set), doubling
/// pixels on the way if asked.
///
/// When scaling, rows `first_line..last_line` of `dest` serve as
/// scratch space before the doubled rows are written, so a buffer that
/// keeps other content there needs repainting afterwards.
pub fn convert_pixmap_to_host(
    src: &PixMap<'_>,
    dest: &mut [u8],
    first_line: i32,
    last_line: i32,
    scale: bool,
) -> Result<()> {
    let factor = if scale { 2 } else { 1 };
    let factor_point = Point::new(factor, factor);
    let src_size = src.size();
    let row_bytes = src_size.x.max(0) as usize * 2 * factor as usize;

    let needed = row_bytes * (src_size.y.max(0) * factor) as usize;
    if dest.len() < needed {
        return Err(CoreError::Other(format!(
            "host buffer holds {} bytes, {needed} needed",
            dest.len()
        )));
    }

    let mut wrapper = PixMap::new();
    wrapper.set_size(src_size * factor_point);
    wrapper.set_format(PixMapFormat::Rgb565);
    wrapper.set_row_bytes(row_bytes);
    wrapper.set_color_table(src.color_table());
    wrapper.set_bits(dest);

    let src_bounds = Rect::new(0, first_line, src_size.x, last_line);
    copy_rect(&mut wrapper, src, src_bounds * factor_point, src_bounds)
}

fn to_565(c: Rgb) -> [u8; 2] {
    let v = ((c.red as u16 & 0xF8) << 8) | ((c.green as u16 & 0xFC) << 3) | (c.blue as u16 >> 3);
    v.to_ne_bytes()
}

fn from_565(px: [u8; 2]) -> Rgb {
    let v = u16::from_ne_bytes(px);
    let r = ((v & 0xF800) >> 8) as u8;
    let g = ((v & 0x07E0) >> 3) as u8;
    let b = ((v & 0x001F) << 3) as u8;
    Rgb::new(r | (r >> 5), g | (g >> 6), b | (b >> 5))
}

/// A window that draws into an RGB565 frame buffer in memory.
#[derive(Debug, Default)]
pub struct FrameBufferHost {
    size: Point,
    buffer: Vec<u8>,
    led: Option<Rgb>,
    vibrating: bool,
    /// Window line ranges touched since the last [`FrameBufferHost::take_updates`].
    updates: Vec<(i32, i32)>,
}

impl FrameBufferHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn row_bytes(&self) -> usize {
        self.size.x.max(0) as usize * 2
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn led(&self) -> Option<Rgb> {
        self.led
    }

    pub fn vibrating(&self) -> bool {
        self.vibrating
    }

    pub fn take_updates(&mut self) -> Vec<(i32, i32)> {
        std::mem::take(&mut self.updates)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        if !self.bounds().contains(Point::new(x, y)) {
            return None;
        }
        let at = y as usize * self.row_bytes() + x as usize * 2;
        Some(from_565([self.buffer[at], self.buffer[at + 1]]))
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(Point::new(0, 0), self.size)
    }

    /// Fill `r`, clipped to the window.
    fn fill(&mut self, r: Rect, color: Rgb) {
        let r = r & self.bounds();
        if r.is_empty() {
            return;
        }
        let px = to_565(color);
        let row_bytes = self.row_bytes();
        for yy in r.top..r.bottom {
            let row = yy as usize * row_bytes;
            let span = &mut self.buffer[row + r.left as usize * 2..row + r.right as usize * 2];
            for dest in span.chunks_exact_mut(2) {
                dest.copy_from_slice(&px);
            }
        }
    }

    /// The composed window as 8-bit RGB.
    pub fn to_image(&self) -> Result<RgbImage> {
        let mut bits = self.buffer.clone();
        let mut src = PixMap::with_size(self.size, PixMapFormat::Rgb565);
        src.set_row_bytes(self.row_bytes());
        src.set_bits(&mut bits);

        let (width, height) = (self.size.x.max(0) as u32, self.size.y.max(0) as u32);
        let mut rgb = PixMap::with_size(self.size, PixMapFormat::Rgb24);
        rgb.set_row_bytes(width as usize * 3);
        let bounds = self.bounds();
        copy_rect(&mut rgb, &src, bounds, bounds)?;

        RgbImage::from_raw(width, height, rgb.bits().to_vec())
            .ok_or_else(|| CoreError::Other("frame buffer size mismatch".into()))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image()?.save_with_format(path, image::ImageFormat::Png)?;
        log::info!("wrote {}x{} window to {}", self.size.x, self.size.y, path.display());
        Ok(())
    }
}

impl HostWindow for FrameBufferHost {
    fn window_reset(&mut self, size: Point) {
        self.size = size;
        self.buffer = vec![0; self.row_bytes() * size.y.max(0) as usize];
        self.updates.clear();
    }

    fn paint_case(&mut self, skin: &PixMap<'_>) {
        let size = skin.size();
        if size != self.size {
            log::warn!(
                "skin is {}x{}, window is {}x{}; case not drawn",
                size.x,
                size.y,
                self.size.x,
                self.size.y
            );
            return;
        }
        match convert_pixmap_to_host(skin, &mut self.buffer, 0, size.y, false) {
            Ok(()) => self.updates.push((0, size.y)),
            Err(err) => log::warn!("case not drawn: {err}"),
        }
    }

    fn rect_frame(&mut self, r: Rect, pen: Point, color: Rgb) {
        let lines = (r.top, r.bottom);
        let mut r = r;
        for _ in 0..pen.x.max(0) {
            if r.is_empty() {
                break;
            }
            self.fill(Rect::new(r.left, r.top, r.right, r.top + 1), color);
            self.fill(Rect::new(r.left, r.bottom - 1, r.right, r.bottom), color);
            self.fill(Rect::new(r.left, r.top, r.left + 1, r.bottom), color);
            self.fill(Rect::new(r.right - 1, r.top, r.right, r.bottom), color);
            r.inset(1, 1);
        }
        self.updates.push(lines);
    }

    fn led_enable(&mut self, on: bool) {
        if !on {
            self.led = None;
        }
    }

    /// Fill the ellipse inscribed in `bounds`.
    fn paint_led(&mut self, bounds: Rect, color: Rgb) {
        self.led = Some(color);
        let (w, h) = (bounds.width() as i64, bounds.height() as i64);
        if w <= 0 || h <= 0 {
            return;
        }
        let (cx2, cy2) = ((bounds.left + bounds.right) as i64, (bounds.top + bounds.bottom) as i64);
        for yy in bounds.top..bounds.bottom {
            let dy = 2 * yy as i64 + 1 - cy2;
            for xx in bounds.left..bounds.right {
                let dx = 2 * xx as i64 + 1 - cx2;
                if dx * dx * h * h + dy * dy * w * w <= w * w * h * h {
                    self.fill(Rect::new(xx, yy, xx + 1, yy + 1), color);
                }
            }
        }
        self.updates.push((bounds.top, bounds.bottom));
    }

    fn paint_lcd(&mut self, info: &ScreenUpdateInfo, src: Rect, dest: Rect, scaled: bool) {
        let factor = if scaled { 2 } else { 1 };
        let lcd_size = info.image.size() * Point::new(factor, factor);
        let lcd_row_bytes = lcd_size.x.max(0) as usize * 2;
        let mut lcd = vec![0; lcd_row_bytes * lcd_size.y.max(0) as usize];
        if let Err(err) =
            convert_pixmap_to_host(&info.image, &mut lcd, info.first_line, info.last_line, scaled)
        {
            log::warn!("LCD not drawn: {err}");
            return;
        }

        // Columns that exist in both the LCD image and the window.
        let left = src.left.max(0).max(-dest.left + src.left);
        let right = src.right.min(lcd_size.x).min(self.size.x - dest.left + src.left);
        if right <= left {
            return;
        }
        let bytes = (right - left) as usize * 2;
        let row_bytes = self.row_bytes();

        for (yy, wy) in (src.top..src.bottom).zip(dest.top..) {
            if yy < 0 || yy >= lcd_size.y || wy < 0 || wy >= self.size.y {
                continue;
            }
            let from = yy as usize * lcd_row_bytes + left as usize * 2;
            let wx = dest.left + (left - src.left);
            let to = wy as usize * row_bytes + wx as usize * 2;
            self.buffer[to..to + bytes].copy_from_slice(&lcd[from..from + bytes]);
        }
        self.updates.push((dest.top, dest.bottom));
    }

    fn vibration_start(&mut self) {
        self.vibrating = true;
    }

    fn vibration_stop(&mut self) {
        self.vibrating = false;
    }
}
