use super::*;

fn r(l: i32, t: i32, rr: i32, b: i32) -> Rect {
    Rect::new(l, t, rr, b)
}

#[test]
fn intersects_is_open_interval() {
    assert!(r(0, 0, 10, 10).intersects(&r(5, 5, 15, 15)));
    assert!(!r(0, 0, 10, 10).intersects(&r(10, 10, 20, 20)));
    assert!(!r(0, 0, 10, 10).intersects(&r(10, 0, 20, 10)));
}

#[test]
fn contains_point_is_half_open() {
    let rect = r(0, 0, 10, 10);
    assert!(rect.contains(Point::new(0, 0)));
    assert!(rect.contains(Point::new(9, 9)));
    assert!(!rect.contains(Point::new(10, 5)));
    assert!(!rect.contains(Point::new(5, 10)));
}

#[test]
fn contains_rect_uses_closed_bounds() {
    let rect = r(0, 0, 10, 10);
    assert!(rect.contains_rect(&rect));
    assert!(rect.contains_rect(&r(2, 2, 10, 10)));
    assert!(!rect.contains_rect(&r(2, 2, 11, 10)));
}

#[test]
fn empty_and_null_are_distinct() {
    let degenerate = r(5, 5, 5, 9);
    assert!(degenerate.is_empty());
    assert!(!degenerate.is_null());
    assert!(Rect::<i32>::default().is_null());
    assert!(Rect::<i32>::default().is_empty());
}

#[test]
fn normalize_orders_edges() {
    for mut rect in [r(10, 10, 0, 0), r(0, 10, 10, 0), r(10, 0, 0, 10), r(1, 2, 3, 4)] {
        let (w, h) = (rect.width().abs(), rect.height().abs());
        rect.normalize();
        assert!(rect.left <= rect.right);
        assert!(rect.top <= rect.bottom);
        assert_eq!((rect.width(), rect.height()), (w, h));
    }
}

#[test]
fn intersect_and_union_with_empties() {
    let mut a = r(0, 0, 10, 10);
    a.intersect_with(&r(5, 5, 5, 5));
    assert!(a.is_null());

    let mut b = r(0, 0, 0, 0);
    b.union_with(&r(3, 3, 6, 6));
    assert_eq!(b, r(3, 3, 6, 6));

    assert_eq!(r(0, 0, 10, 10) & r(5, 5, 15, 15), r(5, 5, 10, 10));
    assert_eq!(r(0, 0, 10, 10) | r(5, 5, 15, 15), r(0, 0, 15, 15));
}

#[test]
fn arithmetic_with_points() {
    let rect = r(1, 2, 3, 4);
    assert_eq!(rect + Point::new(10, 20), r(11, 22, 13, 24));
    assert_eq!(rect - Point::new(1, 2), r(0, 0, 2, 2));
    assert_eq!(rect * Point::new(2, 2), r(2, 4, 6, 8));
    assert_eq!(r(2, 4, 6, 8) / Point::new(2, 2), rect);
    assert_eq!(-Point::new(1, -2), Point::new(-1, 2));
}

#[test]
fn inset_negative_grows() {
    let mut rect = r(10, 10, 20, 20);
    rect.inset(-2, -3);
    assert_eq!(rect, r(8, 7, 22, 23));
}

#[test]
fn compass_points() {
    let rect = r(0, 0, 10, 20);
    assert_eq!(rect.center(), Point::new(5, 10));
    assert_eq!(rect.north(), Point::new(5, 0));
    assert_eq!(rect.east(), Point::new(10, 10));
}

#[test]
fn generic_over_i16() {
    let a: Rect<i16> = Rect::new(0, 0, 4, 4);
    assert!(a.contains(Point::new(3i16, 3)));
}

#[test]
#[should_panic]
fn scale_down_by_zero_panics() {
    let mut rect = r(0, 0, 4, 4);
    rect.scale_down(0, 1);
}
