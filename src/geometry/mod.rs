//! Integer points and half-open rectangles.

mod point;
mod rect;

pub use point::Point;
pub use rect::Rect;

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Scalar type usable as a point or rectangle coordinate.
pub trait Coord:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    const ZERO: Self;
    const TWO: Self;
}

macro_rules! impl_coord {
    ($($t:ty),*) => {
        $(impl Coord for $t {
            const ZERO: Self = 0;
            const TWO: Self = 2;
        })*
    };
}

impl_coord!(i16, i32, i64);

#[inline]
fn min<T: Coord>(a: T, b: T) -> T {
    if a < b { a } else { b }
}

#[inline]
fn max<T: Coord>(a: T, b: T) -> T {
    if a > b { a } else { b }
}

#[cfg(test)]
mod tests;
