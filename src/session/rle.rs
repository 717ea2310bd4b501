//! PackBits run-length coding.
//!
//! Each op byte is read as `i8`: `0..=127` copies the next `op + 1` bytes,
//! `-127..=-1` repeats the next byte `1 - op` times and `-128` is skipped.

use crate::error::{CoreError, Result};

const MAX_RUN: usize = 128;

/// Upper bound on the encoded size of `len` input bytes.
pub fn worst_size(len: usize) -> usize {
    len + len.div_ceil(MAX_RUN)
}

fn run_at(src: &[u8], i: usize) -> usize {
    let b = src[i];
    src[i..].iter().take(MAX_RUN).take_while(|&&x| x == b).count()
}

pub fn encode(src: &[u8], out: &mut Vec<u8>) {
    out.reserve(worst_size(src.len()));
    let mut i = 0;
    while i < src.len() {
        let run = run_at(src, i);
        if run >= 3 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(src[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < src.len() && i - start < MAX_RUN && run_at(src, i) < 3 {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&src[start..i]);
    }
}

/// Decode exactly `unpacked_len` bytes.
pub fn decode(src: &[u8], unpacked_len: usize) -> Result<Vec<u8>> {
    // One op pair expands to at most 128 bytes.
    let mut out = Vec::with_capacity(unpacked_len.min(src.len().saturating_mul(128)));
    let mut i = 0;
    while i < src.len() && out.len() < unpacked_len {
        let op = src[i] as i8;
        i += 1;
        match op {
            0..=127 => {
                let n = op as usize + 1;
                let literal = src
                    .get(i..i + n)
                    .ok_or_else(|| CoreError::Other("truncated RLE literal".into()))?;
                out.extend_from_slice(literal);
                i += n;
            }
            -128 => {}
            _ => {
                let b = *src
                    .get(i)
                    .ok_or_else(|| CoreError::Other("truncated RLE run".into()))?;
                out.resize(out.len() + (1 - op as i32) as usize, b);
                i += 1;
            }
        }
    }

    if out.len() < unpacked_len {
        return Err(CoreError::Other(format!(
            "RLE data expands to {} bytes, expected {unpacked_len}",
            out.len()
        )));
    }
    out.truncate(unpacked_len);
    Ok(out)
}
