//! Minimal XPM reader for the built-in case image: one character per pixel,
//! `c #RRGGBB` colors only.

use crate::error::{CoreError, Result};
use crate::geometry::Point;
use crate::pixmap::{PixMap, PixMapFormat, Rgb};

fn xpm_error(message: impl Into<String>) -> CoreError {
    CoreError::Xpm(message.into())
}

/// The quoted strings of a C-style XPM, or the bare lines of an unquoted one.
fn records(text: &str) -> Vec<&str> {
    if !text.contains('"') {
        return text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    }
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('"') else {
            break;
        };
        out.push(&after[..end]);
        rest = &after[end + 1..];
    }
    out
}

fn parse_hex_color(color: &str) -> Result<Rgb> {
    let hex = color
        .strip_prefix('#')
        .filter(|h| h.len() == 6)
        .ok_or_else(|| xpm_error(format!("unsupported color {color:?}")))?;
    let value = u32::from_str_radix(hex, 16).map_err(|_| xpm_error(format!("bad color {color:?}")))?;
    Ok(Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

/// Decode XPM text into a 24-bit RGB pixmap with tightly packed rows.
pub fn parse_xpm(text: &str) -> Result<PixMap<'static>> {
    let records = records(text);
    let (header, body) = records
        .split_first()
        .ok_or_else(|| xpm_error("no header"))?;

    let fields: Vec<usize> = header
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| xpm_error(format!("bad header {header:?}")))?;
    let &[width, height, ncolors, cpp, ..] = fields.as_slice() else {
        return Err(xpm_error(format!("bad header {header:?}")));
    };
    if cpp != 1 {
        return Err(xpm_error(format!("{cpp} characters per pixel")));
    }
    if body.len() < ncolors + height {
        return Err(xpm_error("truncated image"));
    }

    let mut palette: [Option<Rgb>; 128] = [None; 128];
    for line in &body[..ncolors] {
        let mut chars = line.chars();
        let code = chars
            .next()
            .filter(char::is_ascii)
            .ok_or_else(|| xpm_error(format!("bad color line {line:?}")))?;
        let mut words = chars.as_str().split_whitespace();
        let mut rgb = None;
        while let Some(key) = words.next() {
            if key == "c" {
                let color = words.next().unwrap_or_default();
                rgb = Some(parse_hex_color(color)?);
            }
        }
        palette[code as usize] =
            Some(rgb.ok_or_else(|| xpm_error(format!("no color for {code:?}")))?);
    }

    let mut image = PixMap::with_size(
        Point::new(width as i32, height as i32),
        PixMapFormat::Rgb24,
    );
    image.set_row_bytes(width * 3);
    for (yy, line) in body[ncolors..ncolors + height].iter().enumerate() {
        let row = image.row_mut(yy);
        let mut pixels = line.bytes();
        for px in row.chunks_exact_mut(3) {
            let code = pixels
                .next()
                .ok_or_else(|| xpm_error(format!("row {yy} is short")))?;
            let rgb = palette
                .get(code as usize)
                .copied()
                .flatten()
                .ok_or_else(|| xpm_error(format!("undefined pixel {:?}", code as char)))?;
            px.copy_from_slice(&[rgb.red, rgb.green, rgb.blue]);
        }
    }
    Ok(image)
}
