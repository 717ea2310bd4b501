//! Scanline converters between every pair of pixel formats, plus the
//! blit entry point that drives them.

use crate::error::{CoreError, Result};
use crate::geometry::Rect;

use super::{PixMap, PixMapFormat, Rgb};

/// Unpacked channel values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Byte layout of a direct-color pixel.
pub(crate) trait Layout {
    const BYTES: usize;
    fn get(px: &[u8]) -> Pixel;
    fn put(px: &mut [u8], p: Pixel);
}

/// Native-endian 5-6-5. Expanding a 5- or 6-bit channel replicates its top
/// bits into the low bits, so full scale maps to 0xFF.
pub(crate) struct Px565;
pub(crate) struct PxRgb;
pub(crate) struct PxBgr;
pub(crate) struct PxArgb;
pub(crate) struct PxAbgr;
pub(crate) struct PxRgba;
pub(crate) struct PxBgra;

impl Layout for Px565 {
    const BYTES: usize = 2;

    #[inline]
    fn get(px: &[u8]) -> Pixel {
        let v = u16::from_ne_bytes([px[0], px[1]]);
        let r = ((v & 0xF800) >> 8) as u8;
        let g = ((v & 0x07E0) >> 3) as u8;
        let b = ((v & 0x001F) << 3) as u8;
        Pixel { r: r | (r >> 5), g: g | (g >> 6), b: b | (b >> 5), a: 0 }
    }

    #[inline]
    fn put(px: &mut [u8], p: Pixel) {
        let v = ((p.r as u16 & 0xF8) << 8) | ((p.g as u16 & 0xFC) << 3) | (p.b as u16 >> 3);
        px[..2].copy_from_slice(&v.to_ne_bytes());
    }
}

macro_rules! byte_layout {
    ($name:ident, $bytes:expr, [$($field:ident),+]) => {
        impl Layout for $name {
            const BYTES: usize = $bytes;

            #[inline]
            fn get(px: &[u8]) -> Pixel {
                let mut p = Pixel::default();
                let mut i = 0;
                $(
                    p.$field = px[i];
                    i += 1;
                )+
                let _ = i;
                p
            }

            #[inline]
            fn put(px: &mut [u8], p: Pixel) {
                let mut i = 0;
                $(
                    px[i] = p.$field;
                    i += 1;
                )+
                let _ = i;
            }
        }
    };
}

byte_layout!(PxRgb, 3, [r, g, b]);
byte_layout!(PxBgr, 3, [b, g, r]);
byte_layout!(PxArgb, 4, [a, r, g, b]);
byte_layout!(PxAbgr, 4, [a, b, g, r]);
byte_layout!(PxRgba, 4, [r, g, b, a]);
byte_layout!(PxBgra, 4, [b, g, r, a]);

/// Runtime accessors for one direct layout.
#[derive(Clone, Copy)]
pub(crate) struct DirectOps {
    pub(crate) bytes: usize,
    pub(crate) get: fn(&[u8]) -> Pixel,
    pub(crate) put: fn(&mut [u8], Pixel),
}

fn ops<L: Layout>() -> DirectOps {
    DirectOps { bytes: L::BYTES, get: L::get, put: L::put }
}

pub(crate) fn direct_ops(format: PixMapFormat) -> Option<DirectOps> {
    use PixMapFormat::*;
    match format {
        Rgb565 => Some(ops::<Px565>()),
        Rgb24 => Some(ops::<PxRgb>()),
        Bgr24 => Some(ops::<PxBgr>()),
        Argb32 => Some(ops::<PxArgb>()),
        Abgr32 => Some(ops::<PxAbgr>()),
        Rgba32 => Some(ops::<PxRgba>()),
        Bgra32 => Some(ops::<PxBgra>()),
        _ => None,
    }
}

/// One row of work for a converter. `right` is the pixel count.
pub(crate) struct Scanline<'s> {
    dest: &'s mut [u8],
    src: &'s [u8],
    src_colors: &'s [Rgb],
    right: usize,
}

type Converter = fn(&mut Scanline<'_>);

#[inline]
fn dark(r: u8, g: u8, b: u8) -> bool {
    r < 0xC0 || g < 0xC0 || b < 0xC0
}

#[inline]
fn lookup(colors: &[Rgb], index: usize) -> Rgb {
    colors.get(index).copied().unwrap_or(Rgb::BLACK)
}

#[inline]
fn packed_index<const BITS: usize>(row: &[u8], x: usize) -> usize {
    let per_byte = 8 / BITS;
    let shift = 8 - BITS * (x % per_byte + 1);
    ((row[x / per_byte] >> shift) as usize) & ((1 << BITS) - 1)
}

/// Same layout on both sides.
fn no_convert<const BPP: usize>(p: &mut Scanline<'_>) {
    let n = (p.right * BPP + 7) / 8;
    p.dest[..n].copy_from_slice(&p.src[..n]);
}

fn index_to_direct<const BITS: usize, D: Layout>(p: &mut Scanline<'_>) {
    for x in 0..p.right {
        let rgb = lookup(p.src_colors, packed_index::<BITS>(p.src, x));
        let out = &mut p.dest[x * D::BYTES..];
        D::put(out, Pixel { r: rgb.red, g: rgb.green, b: rgb.blue, a: 0 });
    }
}

fn direct_to_direct<S: Layout, D: Layout>(p: &mut Scanline<'_>) {
    for x in 0..p.right {
        let px = S::get(&p.src[x * S::BYTES..]);
        D::put(&mut p.dest[x * D::BYTES..], px);
    }
}

/// Threshold to a black/white 1-bit row: dark pixels become 1.
fn pack_1bit(dest: &mut [u8], right: usize, mut is_dark: impl FnMut(usize) -> bool) {
    let mut mask = 0x80u8;
    let mut byte = 0u8;
    let mut out = 0;
    for x in 0..right {
        if is_dark(x) {
            byte |= mask;
        }
        mask >>= 1;
        if mask == 0 {
            dest[out] = byte;
            out += 1;
            mask = 0x80;
            byte = 0;
        }
    }
    if mask != 0x80 {
        dest[out] = byte;
    }
}

fn direct_to_1<S: Layout>(p: &mut Scanline<'_>) {
    let src = p.src;
    pack_1bit(p.dest, p.right, |x| {
        let px = S::get(&src[x * S::BYTES..]);
        dark(px.r, px.g, px.b)
    });
}

/// Pick the converter for a format pair, or `None` if the pair is not
/// supported. Indexed sources only copy to the same depth or expand to
/// direct color; indexed-to-indexed cross depths and indexed-to-1-bit are
/// rejected.
fn converter(src: PixMapFormat, dest: PixMapFormat) -> Option<Converter> {
    use PixMapFormat::*;

    macro_rules! from_index {
        ($bits:literal) => {
            match dest {
                Rgb565 => Some(index_to_direct::<$bits, Px565> as Converter),
                Rgb24 => Some(index_to_direct::<$bits, PxRgb> as Converter),
                Bgr24 => Some(index_to_direct::<$bits, PxBgr> as Converter),
                Argb32 => Some(index_to_direct::<$bits, PxArgb> as Converter),
                Abgr32 => Some(index_to_direct::<$bits, PxAbgr> as Converter),
                Rgba32 => Some(index_to_direct::<$bits, PxRgba> as Converter),
                Bgra32 => Some(index_to_direct::<$bits, PxBgra> as Converter),
                _ => None,
            }
        };
    }

    macro_rules! from_direct {
        ($s:ty) => {
            match dest {
                Indexed1 => Some(direct_to_1::<$s> as Converter),
                Rgb565 => Some(direct_to_direct::<$s, Px565> as Converter),
                Rgb24 => Some(direct_to_direct::<$s, PxRgb> as Converter),
                Bgr24 => Some(direct_to_direct::<$s, PxBgr> as Converter),
                Argb32 => Some(direct_to_direct::<$s, PxArgb> as Converter),
                Abgr32 => Some(direct_to_direct::<$s, PxAbgr> as Converter),
                Rgba32 => Some(direct_to_direct::<$s, PxRgba> as Converter),
                Bgra32 => Some(direct_to_direct::<$s, PxBgra> as Converter),
                _ => None,
            }
        };
    }

    if src == dest {
        return match src {
            Indexed1 => Some(no_convert::<1> as Converter),
            Indexed2 => Some(no_convert::<2> as Converter),
            Indexed4 => Some(no_convert::<4> as Converter),
            Indexed8 => Some(no_convert::<8> as Converter),
            Rgb565 => Some(no_convert::<16> as Converter),
            Rgb24 | Bgr24 => Some(no_convert::<24> as Converter),
            Argb32 | Abgr32 | Rgba32 | Bgra32 => Some(no_convert::<32> as Converter),
            Rgb555 | Bgr555 | Bgr565 => None,
        };
    }

    match src {
        Indexed1 => from_index!(1),
        Indexed2 => from_index!(2),
        Indexed4 => from_index!(4),
        Indexed8 => from_index!(8),
        Rgb565 => from_direct!(Px565),
        Rgb24 => from_direct!(PxRgb),
        Bgr24 => from_direct!(PxBgr),
        Argb32 => from_direct!(PxArgb),
        Abgr32 => from_direct!(PxAbgr),
        Rgba32 => from_direct!(PxRgba),
        Bgra32 => from_direct!(PxBgra),
        Rgb555 | Bgr555 | Bgr565 => None,
    }
}

/// Whether [`copy_rect`] can convert `src` pixels into `dest` pixels.
pub fn is_supported(src: PixMapFormat, dest: PixMapFormat) -> bool {
    converter(src, dest).is_some()
}

/// Blit rows `src_rect.top..src_rect.bottom` of `src` into `dest`,
/// converting pixel formats on the way.
///
/// Both rects must start at x = 0 and span their pixmap's full width.
/// `dest_rect` is either equal to `src_rect` or exactly twice it, in which
/// case every source pixel becomes a 2x2 block. Doubling needs a
/// destination of 8 bits per pixel or more.
///
/// A doubled blit converts into the destination rows `src_rect.top..
/// src_rect.bottom` first and expands them from there, so with
/// `src_rect.top > 0` those rows are overwritten even where they lie
/// outside `dest_rect`.
pub fn copy_rect(
    dest: &mut PixMap<'_>,
    src: &PixMap<'_>,
    dest_rect: Rect,
    src_rect: Rect,
) -> Result<()> {
    assert_eq!(dest_rect.left, 0);
    assert_eq!(src_rect.left, 0);
    assert_eq!(dest_rect.right, dest.size().x);
    assert_eq!(src_rect.right, src.size().x);
    assert!(src_rect.right == dest_rect.right || src_rect.right * 2 == dest_rect.right);
    assert!(src_rect.top == dest_rect.top || src_rect.top * 2 == dest_rect.top);
    assert!(src_rect.bottom == dest_rect.bottom || src_rect.bottom * 2 == dest_rect.bottom);

    let conv = converter(src.format(), dest.format()).ok_or(CoreError::UnsupportedConversion {
        src: src.format(),
        dest: dest.format(),
    })?;

    let doubling = dest_rect != src_rect;
    let dest_depth = dest.depth();
    if doubling && dest_depth < 8 {
        return Err(CoreError::UnsupportedFormat(dest.format()));
    }

    let top = src_rect.top.max(0) as usize;
    let bottom = src_rect.bottom.max(0) as usize;
    let right = src_rect.right.max(0) as usize;
    let src_rb = src.row_bytes();
    let dest_rb = dest.row_bytes();
    let src_colors: &[Rgb] = if src.format().is_indexed() { src.color_table() } else { &[] };

    let src_bits = src.bits();
    let dest_bits = dest.bits_mut();
    for yy in top..bottom {
        let mut line = Scanline {
            dest: &mut dest_bits[yy * dest_rb..(yy + 1) * dest_rb],
            src: &src_bits[yy * src_rb..(yy + 1) * src_rb],
            src_colors,
            right,
        };
        conv(&mut line);
    }

    if doubling {
        scale_up_2x(dest_bits, dest_rb, dest_depth as usize / 8, top, bottom, right);
    }
    Ok(())
}

/// Expand the converted rows `top..bottom` (stored at their 1x positions)
/// into 2x2 blocks. Runs bottom-up and right-to-left so nothing is
/// overwritten before it is read.
fn scale_up_2x(bits: &mut [u8], row_bytes: usize, bpp: usize, top: usize, bottom: usize, width: usize) {
    let mut px = [0u8; 4];
    for yy in (top..bottom).rev() {
        let src_row = yy * row_bytes;
        let dest_row1 = 2 * yy * row_bytes;
        let dest_row2 = dest_row1 + row_bytes;
        for xx in (0..width).rev() {
            let s = src_row + xx * bpp;
            px[..bpp].copy_from_slice(&bits[s..s + bpp]);
            for row in [dest_row1, dest_row2] {
                let d = row + 2 * xx * bpp;
                bits[d..d + bpp].copy_from_slice(&px[..bpp]);
                bits[d + bpp..d + 2 * bpp].copy_from_slice(&px[..bpp]);
            }
        }
    }
}
