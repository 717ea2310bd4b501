use std::ops::{Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use super::{max, min, Coord, Point};

/// Half-open rectangle `[left, right) x [top, bottom)`.
///
/// "Empty" means no area; "null" means all four edges are zero. A rect at a
/// non-zero origin with no area is empty but not null.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bincode::Encode, bincode::Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<T = i32> {
    pub left: T,
    pub top: T,
    pub right: T,
    pub bottom: T,
}

impl<T: Coord> Rect<T> {
    pub const fn new(left: T, top: T, right: T, bottom: T) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn from_points(top_left: Point<T>, bottom_right: Point<T>) -> Self {
        Self::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }

    /// Rect from an origin and an extent.
    pub fn with_size(left: T, top: T, width: T, height: T) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn width(&self) -> T {
        self.right - self.left
    }

    pub fn height(&self) -> T {
        self.bottom - self.top
    }

    pub fn size(&self) -> Point<T> {
        Point::new(self.width(), self.height())
    }

    pub fn top_left(&self) -> Point<T> {
        Point::new(self.left, self.top)
    }

    pub fn top_right(&self) -> Point<T> {
        Point::new(self.right, self.top)
    }

    pub fn bottom_left(&self) -> Point<T> {
        Point::new(self.left, self.bottom)
    }

    pub fn bottom_right(&self) -> Point<T> {
        Point::new(self.right, self.bottom)
    }

    pub fn north(&self) -> Point<T> {
        Point::new((self.left + self.right) / T::TWO, self.top)
    }

    pub fn south(&self) -> Point<T> {
        Point::new((self.left + self.right) / T::TWO, self.bottom)
    }

    pub fn east(&self) -> Point<T> {
        Point::new(self.right, (self.top + self.bottom) / T::TWO)
    }

    pub fn west(&self) -> Point<T> {
        Point::new(self.left, (self.top + self.bottom) / T::TWO)
    }

    pub fn center(&self) -> Point<T> {
        Point::new(
            (self.left + self.right) / T::TWO,
            (self.top + self.bottom) / T::TWO,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn is_null(&self) -> bool {
        self.left == T::ZERO && self.top == T::ZERO && self.right == T::ZERO && self.bottom == T::ZERO
    }

    /// Half-open point test.
    pub fn contains(&self, pt: Point<T>) -> bool {
        pt.y >= self.top && pt.y < self.bottom && pt.x >= self.left && pt.x < self.right
    }

    /// Closed-bounds test: `other` lies inside or on the edges of `self`.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.top >= self.top
            && other.top <= self.bottom
            && other.left >= self.left
            && other.left <= self.right
            && other.bottom >= self.top
            && other.bottom <= self.bottom
            && other.right >= self.left
            && other.right <= self.right
    }

    /// Open-interval overlap; rects sharing only an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        other.top < self.bottom
            && other.bottom > self.top
            && other.left < self.right
            && other.right > self.left
    }

    pub fn set(&mut self, left: T, top: T, right: T, bottom: T) {
        *self = Self::new(left, top, right, bottom);
    }

    pub fn be_empty(&mut self) {
        *self = Self::default();
    }

    /// Move every edge inward by `(x, y)`; negative values grow the rect.
    pub fn inset(&mut self, x: T, y: T) {
        self.left += x;
        self.top += y;
        self.right -= x;
        self.bottom -= y;
    }

    pub fn offset(&mut self, x: T, y: T) {
        self.left += x;
        self.top += y;
        self.right += x;
        self.bottom += y;
    }

    pub fn scale_up(&mut self, x: T, y: T) {
        self.left *= x;
        self.top *= y;
        self.right *= x;
        self.bottom *= y;
    }

    pub fn scale_down(&mut self, x: T, y: T) {
        assert!(x != T::ZERO && y != T::ZERO, "scale_down by zero");
        self.left /= x;
        self.top /= y;
        self.right /= x;
        self.bottom /= y;
    }

    pub fn intersect_with(&mut self, other: &Self) {
        if self.is_empty() {
            return;
        }
        if other.is_empty() {
            self.be_empty();
            return;
        }
        self.left = max(self.left, other.left);
        self.top = max(self.top, other.top);
        self.right = min(self.right, other.right);
        self.bottom = min(self.bottom, other.bottom);
    }

    pub fn union_with(&mut self, other: &Self) {
        if self.is_empty() {
            *self = *other;
        } else if !other.is_empty() {
            self.extend_to_rect(other);
        }
    }

    pub fn extend_to(&mut self, pt: Point<T>) {
        self.left = min(self.left, pt.x);
        self.top = min(self.top, pt.y);
        self.right = max(self.right, pt.x);
        self.bottom = max(self.bottom, pt.y);
    }

    pub fn extend_to_rect(&mut self, other: &Self) {
        self.left = min(self.left, other.left);
        self.top = min(self.top, other.top);
        self.right = max(self.right, other.right);
        self.bottom = max(self.bottom, other.bottom);
    }

    pub fn normalize(&mut self) {
        if self.bottom < self.top {
            std::mem::swap(&mut self.top, &mut self.bottom);
        }
        if self.right < self.left {
            std::mem::swap(&mut self.left, &mut self.right);
        }
    }

    /// Swap the x and y axes.
    pub fn transposed(&self) -> Self {
        Self::new(self.top, self.left, self.bottom, self.right)
    }
}

impl<T: Coord> Add<Point<T>> for Rect<T> {
    type Output = Self;
    fn add(mut self, pt: Point<T>) -> Self {
        self.offset(pt.x, pt.y);
        self
    }
}

impl<T: Coord> Sub<Point<T>> for Rect<T> {
    type Output = Self;
    fn sub(mut self, pt: Point<T>) -> Self {
        self.offset(-pt.x, -pt.y);
        self
    }
}

impl<T: Coord> Mul<Point<T>> for Rect<T> {
    type Output = Self;
    fn mul(mut self, pt: Point<T>) -> Self {
        self.scale_up(pt.x, pt.y);
        self
    }
}

impl<T: Coord> Div<Point<T>> for Rect<T> {
    type Output = Self;
    fn div(mut self, pt: Point<T>) -> Self {
        self.scale_down(pt.x, pt.y);
        self
    }
}

impl<T: Coord> AddAssign<Point<T>> for Rect<T> {
    fn add_assign(&mut self, pt: Point<T>) {
        self.offset(pt.x, pt.y);
    }
}

impl<T: Coord> SubAssign<Point<T>> for Rect<T> {
    fn sub_assign(&mut self, pt: Point<T>) {
        self.offset(-pt.x, -pt.y);
    }
}

impl<T: Coord> MulAssign<Point<T>> for Rect<T> {
    fn mul_assign(&mut self, pt: Point<T>) {
        self.scale_up(pt.x, pt.y);
    }
}

impl<T: Coord> DivAssign<Point<T>> for Rect<T> {
    fn div_assign(&mut self, pt: Point<T>) {
        self.scale_down(pt.x, pt.y);
    }
}

/// Intersection.
impl<T: Coord> BitAnd for Rect<T> {
    type Output = Self;
    fn bitand(mut self, rhs: Self) -> Self {
        self.intersect_with(&rhs);
        self
    }
}

/// Bounding union.
impl<T: Coord> BitOr for Rect<T> {
    type Output = Self;
    fn bitor(mut self, rhs: Self) -> Self {
        self.union_with(&rhs);
        self
    }
}

impl<T: Coord> BitAndAssign for Rect<T> {
    fn bitand_assign(&mut self, rhs: Self) {
        self.intersect_with(&rhs);
    }
}

impl<T: Coord> BitOrAssign for Rect<T> {
    fn bitor_assign(&mut self, rhs: Self) {
        self.union_with(&rhs);
    }
}
