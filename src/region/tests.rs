use super::*;

fn r(l: i32, t: i32, rr: i32, b: i32) -> Rect {
    Rect::new(l, t, rr, b)
}

fn rgn(l: i32, t: i32, rr: i32, b: i32) -> Region {
    Region::from_rect(r(l, t, rr, b))
}

fn spans(region: &Region) -> Vec<Rect> {
    region.rects().collect()
}

/// Small deterministic generator for the property checks.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self, bound: i32) -> i32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        ((self.0 >> 16) % bound as u32) as i32
    }

    fn region(&mut self) -> Region {
        let mut out = Region::new();
        for _ in 0..=self.next(4) {
            let (x, y) = (self.next(24), self.next(24));
            let (w, h) = (1 + self.next(10), 1 + self.next(10));
            out.union_with(&rgn(x, y, x + w, y + h));
        }
        out
    }
}

#[test]
fn rect_region_encodes_inline() {
    let region = rgn(1, 2, 3, 4);
    assert_eq!(region.shape(), &[3, 2, 1, 3, 1, 4, 0]);
    assert_eq!(spans(&region), vec![r(1, 2, 3, 4)]);
    assert_eq!(region.bounds(), r(1, 2, 3, 4));
}

#[test]
fn null_rect_region_still_yields_its_span() {
    let region = rgn(0, 0, 0, 0);
    assert!(region.is_empty());
    assert_eq!(spans(&region), vec![r(0, 0, 0, 0)]);
    assert!(region.get_rects().is_empty());
}

#[test]
fn reassign_rect() {
    let mut region = rgn(1, 2, 3, 4);
    region.set_rect(r(5, 6, 7, 8));
    assert_eq!(spans(&region), vec![r(5, 6, 7, 8)]);
}

#[test]
fn set_rect_on_shared_region_leaves_other_alone() {
    let mut a = rgn(1, 2, 3, 4);
    let b = a.clone();
    assert!(a.shares_shape_with(&b));
    a.set_rect(r(5, 6, 7, 8));
    assert_eq!(spans(&b), vec![r(1, 2, 3, 4)]);
    assert!(!a.shares_shape_with(&b));
}

#[test]
fn difference_vectors() {
    let base = rgn(0, 0, 10, 10);
    assert_eq!(
        spans(&difference(&base, &rgn(3, 3, 7, 7))),
        vec![r(0, 0, 10, 3), r(0, 3, 3, 7), r(7, 3, 10, 7), r(0, 7, 10, 10)]
    );
    assert!(spans(&difference(&base, &rgn(-5, -5, 15, 15))).is_empty());
    assert_eq!(spans(&difference(&base, &rgn(15, 15, 25, 25))), vec![r(0, 0, 10, 10)]);
    assert_eq!(
        spans(&difference(&base, &rgn(5, 5, 15, 15))),
        vec![r(0, 0, 10, 5), r(0, 5, 5, 10)]
    );
}

#[test]
fn intersection_vectors() {
    let base = rgn(0, 0, 10, 10);
    assert_eq!(spans(&intersection(&base, &rgn(3, 3, 7, 7))), vec![r(3, 3, 7, 7)]);
    assert_eq!(spans(&intersection(&base, &rgn(-5, -5, 15, 15))), vec![r(0, 0, 10, 10)]);
    assert!(spans(&intersection(&base, &rgn(15, 15, 25, 25))).is_empty());
    assert_eq!(spans(&intersection(&base, &rgn(5, 5, 15, 15))), vec![r(5, 5, 10, 10)]);
}

#[test]
fn union_vectors() {
    let base = rgn(0, 0, 10, 10);
    assert_eq!(spans(&union(&base, &rgn(3, 3, 7, 7))), vec![r(0, 0, 10, 10)]);
    assert_eq!(spans(&union(&base, &rgn(-5, -5, 15, 15))), vec![r(-5, -5, 15, 15)]);
    assert_eq!(
        spans(&union(&base, &rgn(15, 15, 25, 25))),
        vec![r(0, 0, 10, 10), r(15, 15, 25, 25)]
    );
    assert_eq!(
        spans(&union(&base, &rgn(5, 5, 15, 15))),
        vec![r(0, 0, 10, 5), r(0, 5, 15, 10), r(5, 10, 15, 15)]
    );
}

#[test]
fn offset_moves_both_axes() {
    let notched = difference(&rgn(10, 0, 40, 10), &rgn(20, 0, 30, 5));

    let mut a = notched.clone();
    a.offset(1, 2);
    assert_eq!(spans(&a), vec![r(11, 2, 21, 7), r(31, 2, 41, 7), r(11, 7, 41, 12)]);

    let mut b = notched.clone();
    b.offset(0, 2);
    assert_eq!(spans(&b), vec![r(10, 2, 20, 7), r(30, 2, 40, 7), r(10, 7, 40, 12)]);
    assert_eq!(b.bounds(), r(10, 2, 40, 12));

    // the source region is untouched by offsets applied to its clones
    assert_eq!(spans(&notched)[0], r(10, 0, 20, 5));
}

#[test]
fn inset_notched_region() {
    let mut region = difference(&rgn(10, 0, 40, 10), &rgn(20, 0, 30, 5));
    region.inset(1, 1);
    assert_eq!(spans(&region), vec![r(11, 1, 19, 6), r(31, 1, 39, 6), r(11, 6, 39, 9)]);
}

#[test]
fn negative_inset_grows_rect() {
    let mut region = rgn(10, 10, 20, 20);
    region.inset(-2, -3);
    assert_eq!(region.get_rects(), vec![r(8, 7, 22, 23)]);
}

#[test]
fn inset_can_erase_thin_regions() {
    let mut region = rgn(0, 0, 2, 50);
    region.inset(1, 0);
    assert!(region.is_empty());
}

#[test]
fn union_example_encoding() {
    let mut region = rgn(5, 5, 10, 10);
    region.union_with(&rgn(20, 5, 25, 10));
    region.union_with(&rgn(5, 10, 25, 15));
    assert_eq!(region.shape(), &[5, 5, 5, 10, 20, 25, 3, 10, 5, 25, 1, 15, 0]);
}

#[test]
fn large_regions_use_heap_scratch() {
    let mut comb = Region::new();
    for i in 0..40 {
        comb.union_with(&rgn(i * 4, i, i * 4 + 2, i + 3));
    }
    assert!(comb.len() > 100);
    assert!(comb.contains(Point::new(0, 0)));
    assert!(!comb.contains(Point::new(2, 0)));
    assert!(comb.contains(Point::new(156, 41)));
}

#[test]
fn xor_of_overlapping_squares() {
    let x = xor(&rgn(0, 0, 10, 10), &rgn(5, 5, 15, 15));
    assert!(x.contains(Point::new(1, 1)));
    assert!(x.contains(Point::new(12, 12)));
    assert!(!x.contains(Point::new(7, 7)));
    assert!(!x.contains(Point::new(12, 1)));
}

#[test]
fn mutating_ops_chain() {
    let mut region = rgn(0, 0, 10, 10);
    region
        .union_with(&rgn(10, 0, 20, 10))
        .subtract(&rgn(5, 0, 15, 10))
        .intersect_with(&rgn(0, 0, 20, 5));
    assert_eq!(region.get_rects(), vec![r(0, 0, 5, 5), r(15, 0, 20, 5)]);
    region.xor_with(&rgn(0, 0, 20, 5));
    assert_eq!(region.get_rects(), vec![r(5, 0, 15, 5)]);
}

#[test]
fn commutative_ops_and_self_cancellation() {
    let mut rng = Lcg(7);
    for _ in 0..50 {
        let a = rng.region();
        let b = rng.region();
        assert_eq!(union(&a, &b), union(&b, &a));
        assert_eq!(intersection(&a, &b), intersection(&b, &a));
        assert!(difference(&a, &a).is_empty());
        assert!(xor(&a, &a).is_empty());

        let u = union(&a, &b);
        assert!(u.bounds().contains_rect(&a.bounds()));
        assert!(u.bounds().contains_rect(&b.bounds()));
    }
}

#[test]
fn contains_agrees_with_spans() {
    let mut rng = Lcg(99);
    for _ in 0..20 {
        let region = xor(&rng.region(), &rng.region());
        let rects = spans(&region);
        for y in -2..40 {
            for x in -2..40 {
                let p = Point::new(x, y);
                let in_span = rects.iter().any(|s| s.contains(p));
                assert_eq!(region.contains(p), in_span, "at {x},{y}");
            }
        }
    }
}

#[test]
fn rect_iterator_is_a_snapshot() {
    let mut region = rgn(0, 0, 4, 4);
    let mut iter = region.rects();
    region.set_rect(r(8, 8, 9, 9));
    assert_eq!(iter.next(), Some(r(0, 0, 4, 4)));
    assert_eq!(iter.next(), None);
    iter.reset();
    assert_eq!(iter.next(), Some(r(0, 0, 4, 4)));
}

#[test]
fn be_empty_resets() {
    let mut region = union(&rgn(0, 0, 4, 4), &rgn(10, 10, 12, 12));
    region.be_empty();
    assert!(region.is_empty());
    assert_eq!(region, Region::new());
}
