use crate::geometry::Rect;

use super::{Region, Scan};

/// Iterates the spans of a region snapshot. Later changes to the source
/// region do not affect an iterator already created.
pub struct RectIter {
    region: Region,
    pos: usize,
    remaining: i32,
    top: i32,
    bottom: i32,
}

impl RectIter {
    pub(super) fn new(region: Region) -> Self {
        Self { region, pos: 0, remaining: 0, top: 0, bottom: 0 }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
        self.remaining = 0;
    }
}

impl Iterator for RectIter {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        let mut scan = Scan {
            words: self.region.shape(),
            pos: self.pos,
            remaining: self.remaining,
            top: self.top,
            bottom: self.bottom,
        };
        let next = scan.next();
        self.pos = scan.pos;
        self.remaining = scan.remaining;
        self.top = scan.top;
        self.bottom = scan.bottom;
        next
    }
}
