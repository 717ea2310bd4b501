//! Closed-outline masks for 1-bit images.

/// Fill `dest` with the outline of `src`: start all black, then smear
/// white in from the four borders, stopping at set source bits. Rows are
/// swept down then up (each row left-to-right then right-to-left) until a
/// full pass changes nothing, with at least two passes.
pub(super) fn make_mask(dest: &mut [u8], src: &[u8], row_bytes: usize, height: usize) {
    let len = row_bytes * height;
    dest[..len].fill(0xFF);
    if len == 0 {
        return;
    }

    // Scanline above the first row (or below the last, going up).
    let edge = 0u8;
    let mut prev = vec![edge; row_bytes];

    let mut pass = 0;
    loop {
        pass += 1;
        let mut any_change = false;
        prev.fill(edge);

        let downward = pass % 2 == 1;
        for i in 0..height {
            let y = if downward { i } else { height - 1 - i };
            let row = y * row_bytes..(y + 1) * row_bytes;
            any_change |= smear_row(&mut dest[row.clone()], &src[row.clone()], &prev);
            prev.copy_from_slice(&dest[row]);
        }

        if !any_change && pass >= 2 {
            break;
        }
    }
}

/// Sweep one row right then left. Returns whether any byte changed.
fn smear_row(dest: &mut [u8], src: &[u8], prev: &[u8]) -> bool {
    let mut changed = false;

    let mut prev_val = 0u8;
    for x in 0..dest.len() {
        let mut val = dest[x];
        if val != 0 {
            let s = src[x];
            val = (val & prev[x]) | s;
            loop {
                let next = (((val >> 1) | (prev_val << 7)) & val) | s;
                if next == val {
                    break;
                }
                val = next;
            }
            if dest[x] != val {
                changed = true;
                dest[x] = val;
            }
        }
        prev_val = val;
    }

    let mut prev_val = 0u8;
    for x in (0..dest.len()).rev() {
        let mut val = dest[x];
        if val != 0 {
            let s = src[x];
            val = (val & prev[x]) | s;
            loop {
                let next = (((val << 1) | (prev_val >> 7)) & val) | s;
                if next == val {
                    break;
                }
                val = next;
            }
            if dest[x] != val {
                changed = true;
                dest[x] = val;
            }
        }
        prev_val = val;
    }

    changed
}
