use std::cmp::Ordering;

use super::Region;

/// Boolean operation codes. Each value is also the 2-bit in/out state
/// (bit 0 = inside A, bit 1 = inside B) that bounds an output span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub(super) enum Op {
    Union = 0,
    Difference = 1,
    #[allow(dead_code)]
    RevDifference = 2,
    Intersection = 3,
}

impl Op {
    fn keeps_a(self) -> bool {
        matches!(self, Op::Union | Op::Difference)
    }

    fn keeps_b(self) -> bool {
        matches!(self, Op::Union | Op::RevDifference)
    }
}

const STACK_WORDS: usize = 100;

pub(super) fn region_op(op: Op, a: &Region, b: &Region) -> Region {
    match op {
        Op::Union => {
            if a.is_empty() && b.is_empty() {
                return Region::new();
            }
            if a.is_empty() {
                return b.clone();
            }
            if b.is_empty() {
                return a.clone();
            }
        }
        Op::Difference => {
            if a.is_empty() {
                return Region::new();
            }
            if b.is_empty() {
                return a.clone();
            }
        }
        Op::RevDifference => {
            if b.is_empty() {
                return Region::new();
            }
            if a.is_empty() {
                return b.clone();
            }
        }
        Op::Intersection => {
            if a.is_empty() || b.is_empty() {
                return Region::new();
            }
        }
    }

    let worst = a.len() * b.len();
    debug_assert!(worst > 0);
    if worst <= STACK_WORDS {
        let mut scratch = [0i32; STACK_WORDS];
        let used = merge(op, a.shape(), b.shape(), &mut scratch);
        Region::from_shape(&scratch[..used])
    } else {
        let mut scratch = vec![0i32; worst];
        let used = merge(op, a.shape(), b.shape(), &mut scratch);
        Region::from_shape(&scratch[..used])
    }
}

/// Merge two shapes scanline by scanline into `out`, returning the number
/// of words written. Identical consecutive output scanlines are collapsed.
fn merge(op: Op, sa: &[i32], sb: &[i32], out: &mut [i32]) -> usize {
    let code = op as i32;
    let (mut s1, mut s2) = (0usize, 0usize);
    let (mut x1, mut x2) = (0usize, 0usize);
    let (mut l1, mut l2) = (0usize, 0usize);
    let mut y = 0;
    let mut ss = 0usize;
    let mut prev: Option<(usize, usize)> = None;

    loop {
        let tl1 = sa[s1];
        let tl2 = sb[s2];
        if tl1 == 0 && tl2 == 0 {
            break;
        }

        // A finished shape sits below everything.
        let order = if tl1 == 0 {
            Ordering::Greater
        } else if tl2 == 0 {
            Ordering::Less
        } else {
            sa[s1 + 1].cmp(&sb[s2 + 1])
        };

        if order != Ordering::Greater {
            y = sa[s1 + 1];
            x1 = s1 + 2;
            s1 += tl1 as usize + 1;
            l1 = tl1 as usize - 1;
        }
        if order != Ordering::Less {
            y = sb[s2 + 1];
            x2 = s2 + 2;
            s2 += tl2 as usize + 1;
            l2 = tl2 as usize - 1;
        }

        let fixup = ss;
        out[ss] = 1;
        out[ss + 1] = y;
        ss += 2;

        if l1 == 0 && l2 == 0 {
            // nothing on either side
        } else if l1 == 0 {
            if op.keeps_b() {
                out[ss..ss + l2].copy_from_slice(&sb[x2..x2 + l2]);
                ss += l2;
            }
        } else if l2 == 0 {
            if op.keeps_a() {
                out[ss..ss + l1].copy_from_slice(&sa[x1..x1 + l1]);
                ss += l1;
            }
        } else {
            let (mut p1, mut p2) = (x1, x2);
            let (mut xl1, mut xl2) = (l1, l2);
            let mut state = 0;
            let mut old_state = 0;
            while xl1 > 0 && xl2 > 0 {
                let (va, vb) = (sa[p1], sb[p2]);
                let mut x = va;
                if va <= vb {
                    p1 += 1;
                    xl1 -= 1;
                    state ^= 1;
                }
                if va >= vb {
                    x = vb;
                    p2 += 1;
                    xl2 -= 1;
                    state ^= 2;
                }
                if state == code || old_state == code {
                    out[ss] = x;
                    ss += 1;
                }
                old_state = state;
            }
            if op.keeps_a() {
                out[ss..ss + xl1].copy_from_slice(&sa[p1..p1 + xl1]);
                ss += xl1;
            }
            if op.keeps_b() {
                out[ss..ss + xl2].copy_from_slice(&sb[p2..p2 + xl2]);
                ss += xl2;
            }
        }

        let len = ss - fixup - 2;
        out[fixup] = len as i32 + 1;

        let repeats = match prev {
            Some((start, plen)) => {
                len > 0 && len == plen && out[start + 2..start + 2 + len] == out[fixup + 2..fixup + 2 + len]
            }
            None => false,
        };
        if repeats {
            ss = fixup;
        } else {
            prev = Some((fixup, len));
        }
    }

    out[ss] = 0;
    ss + 1
}
