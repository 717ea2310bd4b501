//! Scanline-encoded pixel regions with boolean set operations.
//!
//! A region is stored as a flat run of words. Each scanline contributes
//! `count, y, x0, x1, ...` where `count` is one more than the number of
//! x-events; the scanline extends down to the `y` of the next one. A final
//! `0` ends the shape. For example the union of `(5,5,10,10)`,
//! `(20,5,25,10)` and `(5,10,25,15)` encodes as:
//!
//! ```text
//! 5 5 5 10 20 25   3 10 5 25   1 15   0
//! ```
//!
//! Cloning a region shares its shape; the first mutation of a shared shape
//! copies it. A single rectangle fits in seven words and is kept inline.

mod iter;
mod op;

pub use iter::RectIter;

use std::sync::Arc;

use crate::geometry::{Point, Rect};

use op::Op;

/// Word count of a single-rectangle shape.
const RECT_WORDS: usize = 7;

#[derive(Clone, Debug)]
enum Shape {
    Inline { words: [i32; RECT_WORDS], len: u8 },
    Heap(Vec<i32>),
}

impl Shape {
    const EMPTY: Shape = Shape::Inline { words: [0; RECT_WORDS], len: 0 };

    fn from_words(words: &[i32]) -> Self {
        if words.len() <= RECT_WORDS {
            let mut buf = [0; RECT_WORDS];
            buf[..words.len()].copy_from_slice(words);
            Shape::Inline { words: buf, len: words.len() as u8 }
        } else {
            Shape::Heap(words.to_vec())
        }
    }

    fn rect_words(r: &Rect) -> [i32; RECT_WORDS] {
        [3, r.top, r.left, r.right, 1, r.bottom, 0]
    }

    fn words(&self) -> &[i32] {
        match self {
            Shape::Inline { words, len } => &words[..*len as usize],
            Shape::Heap(v) => v,
        }
    }

    fn words_mut(&mut self) -> &mut [i32] {
        match self {
            Shape::Inline { words, len } => &mut words[..*len as usize],
            Shape::Heap(v) => v,
        }
    }

    fn is_inline(&self) -> bool {
        matches!(self, Shape::Inline { .. })
    }
}

#[derive(Clone, Debug)]
struct RegionImpl {
    bounds: Rect,
    shape: Shape,
}

impl RegionImpl {
    fn empty() -> Self {
        Self { bounds: Rect::default(), shape: Shape::EMPTY }
    }

    fn from_rect(r: &Rect) -> Self {
        Self {
            bounds: *r,
            shape: Shape::Inline { words: Shape::rect_words(r), len: RECT_WORDS as u8 },
        }
    }

    fn from_words(words: &[i32]) -> Self {
        if words.is_empty() {
            return Self::empty();
        }
        let shape = Shape::from_words(words);
        let mut bounds = Rect::default();
        for r in Scan::new(shape.words()) {
            bounds.union_with(&r);
        }
        Self { bounds, shape }
    }
}

/// Walks the `(left, top, right, bottom)` spans of a raw shape, including
/// zero-width ones.
struct Scan<'a> {
    words: &'a [i32],
    pos: usize,
    remaining: i32,
    top: i32,
    bottom: i32,
}

impl<'a> Scan<'a> {
    fn new(words: &'a [i32]) -> Self {
        Self { words, pos: 0, remaining: 0, top: 0, bottom: 0 }
    }
}

impl Iterator for Scan<'_> {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        loop {
            if self.remaining > 1 {
                let left = *self.words.get(self.pos)?;
                let right = *self.words.get(self.pos + 1)?;
                self.pos += 2;
                self.remaining -= 2;
                return Some(Rect::new(left, self.top, right, self.bottom));
            }
            let count = *self.words.get(self.pos)?;
            if count == 0 {
                return None;
            }
            self.remaining = count;
            self.top = *self.words.get(self.pos + 1)?;
            self.bottom = *self.words.get(self.pos + 2 + count as usize)?;
            self.pos += 2;
        }
    }
}

/// A set of pixels, shared copy-on-write between clones.
#[derive(Clone, Debug)]
pub struct Region {
    imp: Arc<RegionImpl>,
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl Region {
    pub fn new() -> Self {
        Self { imp: Arc::new(RegionImpl::empty()) }
    }

    /// A region covering `r`. An empty `r` still produces a one-span shape
    /// whose iterator yields `r` itself.
    pub fn from_rect(r: Rect) -> Self {
        Self { imp: Arc::new(RegionImpl::from_rect(&r)) }
    }

    /// Adopt a raw scanline shape, normally one produced by a boolean op.
    pub fn from_shape(words: &[i32]) -> Self {
        Self { imp: Arc::new(RegionImpl::from_words(words)) }
    }

    /// Replace the contents with `r`, reusing the inline buffer when this
    /// region is the only owner of it.
    pub fn set_rect(&mut self, r: Rect) {
        match Arc::get_mut(&mut self.imp) {
            Some(imp) if imp.shape.is_inline() => *imp = RegionImpl::from_rect(&r),
            _ => self.imp = Arc::new(RegionImpl::from_rect(&r)),
        }
    }

    pub fn be_empty(&mut self) {
        if self.imp.shape.words().is_empty() {
            return;
        }
        match Arc::get_mut(&mut self.imp) {
            Some(imp) if imp.shape.is_inline() => *imp = RegionImpl::empty(),
            _ => self.imp = Arc::new(RegionImpl::empty()),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.imp.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.imp.bounds.is_empty()
    }

    /// Raw scanline words, including the terminator.
    pub fn shape(&self) -> &[i32] {
        self.imp.shape.words()
    }

    pub fn len(&self) -> usize {
        self.shape().len()
    }

    pub(crate) fn shares_shape_with(&self, other: &Region) -> bool {
        Arc::ptr_eq(&self.imp, &other.imp)
    }

    /// Encoding equality. Two regions covering the same pixels can compare
    /// unequal if they were reached through different operation orders.
    pub fn is_equal(&self, other: &Region) -> bool {
        self.shares_shape_with(other) || self.shape() == other.shape()
    }

    pub fn contains(&self, p: Point) -> bool {
        if !self.imp.bounds.contains(p) {
            return false;
        }
        Scan::new(self.shape()).any(|r| r.contains(p))
    }

    pub fn offset(&mut self, dx: i32, dy: i32) {
        if self.shape().is_empty() || (dx == 0 && dy == 0) {
            return;
        }
        let imp = Arc::make_mut(&mut self.imp);
        let words = imp.shape.words_mut();
        let mut i = 0;
        while i < words.len() && words[i] != 0 {
            let count = words[i] as usize;
            words[i + 1] += dy;
            for x in &mut words[i + 2..i + 1 + count] {
                *x += dx;
            }
            i += count + 1;
        }
        imp.bounds.offset(dx, dy);
    }

    pub fn offset_by(&mut self, pt: Point) {
        self.offset(pt.x, pt.y);
    }

    /// Shrink (positive) or grow (negative) every edge.
    ///
    /// Works on rectangles: inset each span horizontally and re-union,
    /// then transpose and repeat for the vertical axis.
    pub fn inset(&mut self, dx: i32, dy: i32) {
        let mut amount = dx;
        for _ in 0..2 {
            let mut grown = Region::new();
            for mut r in self.rects() {
                r.left += amount;
                r.right -= amount;
                if !r.is_empty() {
                    grown.union_with(&Region::from_rect(r));
                }
            }
            let mut flipped = Region::new();
            for r in grown.rects() {
                flipped.union_with(&Region::from_rect(r.transposed()));
            }
            *self = flipped;
            amount = dy;
        }
    }

    pub fn union_with(&mut self, other: &Region) -> &mut Self {
        *self = op::region_op(Op::Union, self, other);
        self
    }

    pub fn intersect_with(&mut self, other: &Region) -> &mut Self {
        *self = op::region_op(Op::Intersection, self, other);
        self
    }

    pub fn subtract(&mut self, other: &Region) -> &mut Self {
        *self = op::region_op(Op::Difference, self, other);
        self
    }

    pub fn xor_with(&mut self, other: &Region) -> &mut Self {
        *self = xor(self, other);
        self
    }

    /// Spans in scanline order, zero-width ones included.
    pub fn rects(&self) -> RectIter {
        RectIter::new(self.clone())
    }

    /// Non-empty spans only.
    pub fn get_rects(&self) -> Vec<Rect> {
        Scan::new(self.shape()).filter(|r| !r.is_empty()).collect()
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl From<Rect> for Region {
    fn from(r: Rect) -> Self {
        Region::from_rect(r)
    }
}

pub fn union(a: &Region, b: &Region) -> Region {
    op::region_op(Op::Union, a, b)
}

pub fn intersection(a: &Region, b: &Region) -> Region {
    op::region_op(Op::Intersection, a, b)
}

pub fn difference(a: &Region, b: &Region) -> Region {
    op::region_op(Op::Difference, a, b)
}

/// Pixels in exactly one of `a` and `b`.
pub fn xor(a: &Region, b: &Region) -> Region {
    difference(&union(a, b), &intersection(a, b))
}

#[cfg(test)]
mod tests;
