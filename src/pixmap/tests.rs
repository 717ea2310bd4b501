use super::*;
use crate::error::CoreError;

fn rgb24(w: i32, h: i32, f: impl Fn(i32, i32) -> (u8, u8, u8)) -> PixMap<'static> {
    let mut pm = PixMap::with_size(Point::new(w, h), PixMapFormat::Rgb24);
    for y in 0..h {
        let row = pm.row_mut(y as usize);
        for x in 0..w {
            let (r, g, b) = f(x, y);
            let i = x as usize * 3;
            row[i..i + 3].copy_from_slice(&[r, g, b]);
        }
    }
    pm
}

fn pixel24(pm: &PixMap<'_>, x: usize, y: usize) -> (u8, u8, u8) {
    let row = pm.row(y);
    (row[x * 3], row[x * 3 + 1], row[x * 3 + 2])
}

fn bit(pm: &PixMap<'_>, x: usize, y: usize) -> bool {
    pm.row(y)[x / 8] & (0x80 >> (x % 8)) != 0
}

#[test]
fn depth_table_follows_format_order() {
    let depths: Vec<u32> = PixMapFormat::ALL.iter().map(|f| f.depth()).collect();
    assert_eq!(depths, vec![1, 2, 4, 8, 16, 16, 16, 16, 24, 24, 32, 32, 32, 32]);
}

#[test]
fn defaults() {
    let pm = PixMap::new();
    assert_eq!(pm.size(), Point::new(0, 0));
    assert_eq!(pm.format(), PixMapFormat::Indexed1);
    assert_eq!(pm.row_bytes(), 0);
    assert!(pm.is_owned());
    assert!(pm.bits().is_empty());
}

#[test]
fn row_bytes_round_to_32_bits() {
    let mut pm = PixMap::new();
    pm.set_size(Point::new(10, 2));
    assert_eq!(pm.row_bytes(), 4);
    pm.set_format(PixMapFormat::Rgb24);
    assert_eq!(pm.row_bytes(), 32);
    pm.set_format(PixMapFormat::Indexed4);
    assert_eq!(pm.row_bytes(), 8);
}

#[test]
fn same_depth_format_change_keeps_pixels() {
    let mut pm = rgb24(2, 1, |_, _| (1, 2, 3));
    pm.set_format(PixMapFormat::Bgr24);
    assert_eq!(pixel24(&pm, 0, 0), (1, 2, 3));
    pm.set_format(PixMapFormat::Argb32);
    assert_eq!(pm.row(0)[..4], [0, 0, 0, 0]);
}

#[test]
fn borrowed_buffer_is_written_in_place() {
    let mut backing = vec![0u8; 8 * 2];
    {
        let mut pm = PixMap::new();
        pm.set_format(PixMapFormat::Rgb565);
        pm.set_size(Point::new(4, 2));
        pm.set_bits(&mut backing);
        assert!(!pm.is_owned());
        pm.row_mut(1)[0] = 0xAB;
        // invalidation leaves a borrowed buffer attached
        pm.set_row_bytes(4);
        pm.set_row_bytes(8);
        assert!(!pm.is_owned());
    }
    assert_eq!(backing[8], 0xAB);
}

#[test]
fn clone_is_deep_and_owned() {
    let mut backing = vec![7u8; 4];
    let mut pm = PixMap::new();
    pm.set_format(PixMapFormat::Indexed8);
    pm.set_size(Point::new(4, 1));
    pm.set_bits(&mut backing);
    let mut copy = pm.clone();
    assert!(copy.is_owned());
    copy.bits_mut()[0] = 1;
    assert_eq!(pm.bits()[0], 7);
}

#[test]
fn rgb24_argb32_round_trip_is_exact() {
    let src = rgb24(5, 3, |x, y| ((x * 40) as u8, (y * 70) as u8, 200));
    let mut pm = src.clone();
    pm.convert_to_format(PixMapFormat::Argb32).unwrap();
    assert_eq!(pm.row(1)[4..8], [0, 40, 70, 200]);
    pm.convert_to_format(PixMapFormat::Rgb24).unwrap();
    for y in 0..3 {
        for x in 0..5 {
            assert_eq!(pixel24(&pm, x, y), pixel24(&src, x, y));
        }
    }
}

#[test]
fn every_direct_pair_preserves_colors() {
    let direct = [
        PixMapFormat::Rgb24,
        PixMapFormat::Bgr24,
        PixMapFormat::Argb32,
        PixMapFormat::Abgr32,
        PixMapFormat::Rgba32,
        PixMapFormat::Bgra32,
    ];
    let src = rgb24(3, 2, |x, y| (10 + x as u8, 100 + y as u8, 250));
    for via in direct {
        let mut pm = src.clone();
        pm.convert_to_format(via).unwrap();
        pm.convert_to_format(PixMapFormat::Rgb24).unwrap();
        assert_eq!(pixel24(&pm, 2, 1), (12, 101, 250), "via {via:?}");
    }
}

#[test]
fn rgb565_round_trip_replicates_top_bits() {
    let src = rgb24(4, 1, |x, _| match x {
        0 => (0xFF, 0xFF, 0xFF),
        1 => (0, 0, 0),
        2 => (0x84, 0x82, 0x84),
        _ => (0x12, 0x34, 0x56),
    });
    let mut pm = src.clone();
    pm.convert_to_format(PixMapFormat::Rgb565).unwrap();
    pm.convert_to_format(PixMapFormat::Rgb24).unwrap();
    assert_eq!(pixel24(&pm, 0, 0), (0xFF, 0xFF, 0xFF));
    assert_eq!(pixel24(&pm, 1, 0), (0, 0, 0));
    assert_eq!(pixel24(&pm, 2, 0), (0x84, 0x82, 0x84));
    let (r, g, b) = pixel24(&pm, 3, 0);
    assert!(r.abs_diff(0x12) < 8 && g.abs_diff(0x34) < 4 && b.abs_diff(0x56) < 8);
    assert_eq!(r, 0x10 | (0x10 >> 5));
}

#[test]
fn indexed_to_direct_uses_palette_msb_first() {
    let mut pm = PixMap::with_size(Point::new(4, 1), PixMapFormat::Indexed2);
    pm.set_color_table(&[Rgb::new(0, 0, 0), Rgb::new(80, 80, 80), Rgb::new(160, 0, 0), Rgb::new(0, 0, 240)]);
    pm.bits_mut()[0] = 0b00_01_10_11;
    pm.convert_to_format(PixMapFormat::Rgb24).unwrap();
    assert_eq!(pixel24(&pm, 0, 0), (0, 0, 0));
    assert_eq!(pixel24(&pm, 1, 0), (80, 80, 80));
    assert_eq!(pixel24(&pm, 2, 0), (160, 0, 0));
    assert_eq!(pixel24(&pm, 3, 0), (0, 0, 240));
}

#[test]
fn missing_palette_entries_read_as_black() {
    let mut pm = PixMap::with_size(Point::new(2, 1), PixMapFormat::Indexed8);
    pm.set_color_table(&[Rgb::WHITE]);
    pm.bits_mut()[..2].copy_from_slice(&[0, 9]);
    pm.convert_to_format(PixMapFormat::Rgb24).unwrap();
    assert_eq!(pixel24(&pm, 0, 0), (255, 255, 255));
    assert_eq!(pixel24(&pm, 1, 0), (0, 0, 0));
}

#[test]
fn direct_to_1_marks_any_dark_channel() {
    let src = rgb24(9, 1, |x, _| match x {
        0 => (0xC0, 0xC0, 0xC0),
        1 => (0xBF, 0xFF, 0xFF),
        2 => (0xFF, 0xBF, 0xFF),
        3 => (0xFF, 0xFF, 0xBF),
        8 => (0, 0, 0),
        _ => (0xFF, 0xFF, 0xFF),
    });
    let mut pm = src.clone();
    pm.convert_to_format(PixMapFormat::Indexed1).unwrap();
    assert_eq!(pm.row(0)[0], 0b0111_0000);
    assert_eq!(pm.row(0)[1], 0b1000_0000);
}

#[test]
fn full_byte_rows_do_not_spill_into_padding() {
    let src = rgb24(8, 1, |_, _| (0, 0, 0));
    let mut dest = PixMap::with_size(Point::new(8, 1), PixMapFormat::Indexed1);
    dest.bits_mut()[1] = 0x5A;
    let rect = src.bounds();
    copy_rect(&mut dest, &src, rect, rect).unwrap();
    assert_eq!(dest.row(0)[..2], [0xFF, 0x5A]);
}

#[test]
fn partial_doubling_uses_1x_rows_as_scratch() {
    let src = rgb24(2, 4, |_, y| (y as u8 * 40, 0x11, 0x22));
    let mut dest = PixMap::with_size(Point::new(4, 8), PixMapFormat::Rgb24);
    dest.bits_mut().fill(0xAA);
    copy_rect(&mut dest, &src, Rect::new(0, 4, 4, 6), Rect::new(0, 2, 2, 3)).unwrap();

    for y in [4, 5] {
        for x in 0..4 {
            assert_eq!(pixel24(&dest, x, y), (80, 0x11, 0x22));
        }
    }
    // Row 2 held the 1x conversion; everything else outside the target
    // keeps its old contents.
    assert_eq!(pixel24(&dest, 0, 2), (80, 0x11, 0x22));
    for y in [0, 1, 3, 6, 7] {
        assert!(dest.row(y)[..12].iter().all(|&b| b == 0xAA));
    }
}

#[test]
fn unsupported_pairs_fail_fast() {
    for (src, dest) in [
        (PixMapFormat::Indexed1, PixMapFormat::Indexed2),
        (PixMapFormat::Indexed4, PixMapFormat::Indexed2),
        (PixMapFormat::Indexed8, PixMapFormat::Indexed4),
        (PixMapFormat::Indexed8, PixMapFormat::Indexed1),
        (PixMapFormat::Indexed2, PixMapFormat::Indexed8),
        (PixMapFormat::Indexed4, PixMapFormat::Indexed8),
        (PixMapFormat::Indexed1, PixMapFormat::Indexed8),
        (PixMapFormat::Rgb24, PixMapFormat::Indexed8),
        (PixMapFormat::Rgb555, PixMapFormat::Rgb24),
    ] {
        assert!(!is_supported(src, dest));
        let mut pm = PixMap::with_size(Point::new(2, 2), src);
        let err = pm.convert_to_format(dest).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConversion { .. }));
    }
}

#[test]
fn matrix_covers_the_eleven_concrete_formats() {
    let concrete = PixMapFormat::ALL
        .iter()
        .copied()
        .filter(|f| !matches!(f, PixMapFormat::Rgb555 | PixMapFormat::Bgr555 | PixMapFormat::Bgr565));
    let mut supported = 0;
    for src in concrete.clone() {
        for dest in concrete.clone() {
            if is_supported(src, dest) {
                supported += 1;
            }
        }
    }
    // 4 indexed copies, 28 indexed -> direct, 7 direct copies,
    // 7 direct -> 1, 42 direct -> direct
    assert_eq!(supported, 4 + 28 + 7 + 7 + 42);
}

#[test]
fn copy_rect_doubles_pixels() {
    let src = rgb24(3, 2, |x, y| (x as u8 * 10, y as u8 * 10, 1));
    for format in [PixMapFormat::Rgb565, PixMapFormat::Rgb24, PixMapFormat::Argb32] {
        let mut dest = PixMap::with_size(Point::new(6, 4), format);
        let src_rect = src.bounds();
        let dest_rect = dest.bounds();
        copy_rect(&mut dest, &src, dest_rect, src_rect).unwrap();
        dest.convert_to_format(PixMapFormat::Rgb24).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                let (r, g, _) = pixel24(&dest, x, y);
                let (er, eg, _) = pixel24(&src, x / 2, y / 2);
                assert!(r.abs_diff(er) < 8 && g.abs_diff(eg) < 8, "{format:?} at {x},{y}");
            }
        }
    }
}

#[test]
fn copy_rect_doubles_a_band() {
    let mut dest = PixMap::with_size(Point::new(4, 8), PixMapFormat::Indexed8);
    let mut gray = PixMap::with_size(Point::new(2, 4), PixMapFormat::Indexed8);
    for y in 0..4 {
        gray.row_mut(y)[..2].copy_from_slice(&[y as u8, y as u8]);
    }
    copy_rect(&mut dest, &gray, Rect::new(0, 4, 4, 8), Rect::new(0, 2, 2, 4)).unwrap();
    assert_eq!(&dest.row(4)[..4], &[2, 2, 2, 2]);
    assert_eq!(&dest.row(7)[..4], &[3, 3, 3, 3]);
}

#[test]
fn doubling_into_sub_byte_depth_is_rejected() {
    let src = PixMap::with_size(Point::new(2, 2), PixMapFormat::Indexed1);
    let mut dest = PixMap::with_size(Point::new(4, 4), PixMapFormat::Indexed1);
    let (sr, dr) = (src.bounds(), dest.bounds());
    assert!(matches!(copy_rect(&mut dest, &src, dr, sr), Err(CoreError::UnsupportedFormat(_))));
}

#[test]
#[should_panic]
fn copy_rect_rejects_odd_scales() {
    let src = PixMap::with_size(Point::new(2, 2), PixMapFormat::Rgb24);
    let mut dest = PixMap::with_size(Point::new(6, 6), PixMapFormat::Rgb24);
    let (sr, dr) = (src.bounds(), dest.bounds());
    let _ = copy_rect(&mut dest, &src, dr, sr);
}

#[test]
fn change_tone_direct_and_indexed() {
    let mut pm = rgb24(2, 2, |_, _| (100, 0, 255));
    pm.change_tone(100);
    assert_eq!(pixel24(&pm, 0, 0), (255, 255, 255));

    let mut dark = rgb24(1, 1, |_, _| (100, 50, 255));
    dark.change_tone(-100);
    assert_eq!(pixel24(&dark, 0, 0), (0, 0, 0));

    let mut half = rgb24(1, 1, |_, _| (100, 0, 200));
    half.change_tone(40);
    // amount = 102: v + 102 - v * 102 / 255
    assert_eq!(pixel24(&half, 0, 0), (162, 102, 222));

    let mut indexed = PixMap::with_size(Point::new(1, 1), PixMapFormat::Indexed8);
    indexed.set_color_table(&[Rgb::new(0, 0, 0)]);
    indexed.change_tone(100);
    assert_eq!(indexed.color_table()[0], Rgb::WHITE);
}

#[test]
fn change_tone_respects_line_range() {
    let mut pm = rgb24(1, 3, |_, _| (0, 0, 0));
    pm.change_tone_lines(100, 1, 2);
    assert_eq!(pixel24(&pm, 0, 0), (0, 0, 0));
    assert_eq!(pixel24(&pm, 0, 1), (255, 255, 255));
    assert_eq!(pixel24(&pm, 0, 2), (0, 0, 0));
}

#[test]
fn convert_to_color_tints() {
    let mut pm = rgb24(1, 1, |_, _| (200, 100, 50));
    pm.convert_to_color(Tint::Red);
    // 200*.299 + 100*.587 + 50*.114 = 124.2
    assert_eq!(pixel24(&pm, 0, 0), (124, 0, 0));

    let mut gray = rgb24(1, 1, |_, _| (10, 20, 30));
    gray.convert_to_color(Tint::Gray);
    assert_eq!(pixel24(&gray, 0, 0), (18, 18, 18));

    let mut indexed = PixMap::with_size(Point::new(1, 1), PixMapFormat::Indexed4);
    indexed.set_color_table(&[Rgb::new(200, 100, 50)]);
    indexed.convert_to_color(Tint::Green);
    assert_eq!(indexed.color_table()[0], Rgb::new(0, 124, 0));
}

#[test]
fn flip_scanlines_mirrors_rows() {
    let mut pm = rgb24(1, 3, |_, y| (y as u8, 0, 0));
    pm.flip_scanlines();
    assert_eq!(pixel24(&pm, 0, 0).0, 2);
    assert_eq!(pixel24(&pm, 0, 1).0, 1);
    assert_eq!(pixel24(&pm, 0, 2).0, 0);
}

#[test]
fn mask_fills_closed_outlines() {
    // a dark ring with a light centre, on a light background
    let img = rgb24(12, 12, |x, y| {
        let ring = (2..10).contains(&x) && (2..10).contains(&y) && !((4..8).contains(&x) && (4..8).contains(&y));
        if ring { (0, 0, 0) } else { (255, 255, 255) }
    });
    let mut mask = PixMap::new();
    img.create_mask(&mut mask).unwrap();
    assert_eq!(mask.format(), PixMapFormat::Indexed1);
    assert!(!bit(&mask, 0, 0));
    assert!(!bit(&mask, 11, 11));
    assert!(!bit(&mask, 1, 5));
    assert!(bit(&mask, 2, 2));
    assert!(bit(&mask, 5, 5), "enclosed centre stays inside the mask");
    assert!(bit(&mask, 9, 9));
    assert!(!bit(&mask, 10, 9));
}

#[test]
fn mask_reaches_into_concave_pockets() {
    // an arch opening downward: only the upward pass can clear the pocket
    let img = rgb24(10, 10, |x, y| {
        let arch = (1..9).contains(&x) && (1..9).contains(&y) && !((3..7).contains(&x) && y >= 3);
        if arch { (0, 0, 0) } else { (255, 255, 255) }
    });
    let mut mask = PixMap::new();
    img.create_mask(&mut mask).unwrap();
    assert!(!bit(&mask, 4, 3));
    assert!(!bit(&mask, 5, 8));
    assert!(bit(&mask, 4, 2));
    assert!(bit(&mask, 1, 8));
    assert!(!bit(&mask, 0, 0));
}

#[test]
fn mask_of_empty_image() {
    let img = PixMap::with_size(Point::new(0, 0), PixMapFormat::Rgb24);
    let mut mask = PixMap::new();
    img.create_mask(&mut mask).unwrap();
    assert!(mask.bits().is_empty());
}

#[test]
fn create_region_collects_runs() {
    let mut pm = PixMap::with_size(Point::new(12, 3), PixMapFormat::Indexed1);
    pm.row_mut(0)[..2].copy_from_slice(&[0b0111_0000, 0b0000_0000]);
    pm.row_mut(1)[..2].copy_from_slice(&[0b0111_0000, 0b0011_0000]);
    let region = pm.create_region();
    assert_eq!(
        region.get_rects(),
        vec![Rect::new(1, 0, 4, 1), Rect::new(1, 1, 4, 2), Rect::new(10, 1, 12, 2)]
    );
    assert!(region.contains(Point::new(11, 1)));
    assert!(!region.contains(Point::new(11, 0)));
}
