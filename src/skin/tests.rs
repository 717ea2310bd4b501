use super::*;
use crate::pixmap::PixMapFormat;

const SKINFO: &str = "\
; Sample skin
Name = Test Skin
File1x = test1x.jpg
File2x = test2x.jpg
BackgroundColor = 0x7B, 0x8C, 90
HighlightColor = 100, 240, 220
Devices = PalmIIIc, PalmVx ,

# Elements are keyed, order comes from the key
Element2 = Touchscreen, 30, 40, 160, 220
Element1 = PowerButton, 10, 250, 20, 10
Element3 = lcd, 30, 40, 160, 160
Element4 = LED, 0x10, 0x10, 8, 8
Element3 = LCD, 31, 41, 160, 160
NotAKey
";

fn sample() -> SkinInfo {
    SkinInfo::parse(SKINFO).unwrap()
}

#[test]
fn parses_skinfo() {
    let info = sample();
    assert_eq!(info.name, "Test Skin");
    assert_eq!(info.file_2x, "test2x.jpg");
    assert_eq!(info.background, Rgb::new(0x7B, 0x8C, 90));
    assert_eq!(info.highlight, Rgb::new(100, 240, 220));
    assert_eq!(info.devices, ["PalmIIIc", "PalmVx"]);
    assert!(info.supports("palmvx"));
    assert!(!info.supports("PalmV"));

    let kinds: Vec<_> = info.elements.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            ElementKind::PowerButton,
            ElementKind::Touchscreen,
            ElementKind::Lcd,
            ElementKind::Led
        ]
    );
    // The later duplicate key wins.
    assert_eq!(
        info.element(ElementKind::Lcd),
        Some(Rect::with_size(31, 41, 160, 160))
    );
    assert_eq!(
        info.element(ElementKind::Led),
        Some(Rect::with_size(16, 16, 8, 8))
    );
}

#[test]
fn skinfo_errors_carry_line_numbers() {
    let bad_color = SKINFO.replace("100, 240, 220", "100, 256, 220");
    match SkinInfo::parse(&bad_color) {
        Err(CoreError::SkinParse { line, .. }) => assert_eq!(line, 6),
        other => panic!("unexpected {other:?}"),
    }

    let bad_element = SKINFO.replace("LED, 0x10", "Blinky, 0x10");
    match SkinInfo::parse(&bad_element) {
        Err(CoreError::SkinParse { line, message }) => {
            assert_eq!(line, 13);
            assert!(message.contains("Blinky"));
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(SkinInfo::parse(&SKINFO.replace("Name = Test Skin", "")).is_err());
    assert!(SkinInfo::parse(&SKINFO.replace("PalmIIIc, PalmVx ,", " , ")).is_err());
    assert!(SkinInfo::parse(&SKINFO.replace("Element2", "Skipped")).is_err());
    assert!(SkinInfo::parse(&SKINFO.replace("30, 40, 160, 220", "30, 40, 160")).is_err());
}

#[test]
fn element_names_ignore_case() {
    assert_eq!(ElementKind::from_name("app1button"), Some(ElementKind::App1Button));
    assert_eq!(ElementKind::from_name(" TriggerCenter "), Some(ElementKind::TriggerCenter));
    assert_eq!(ElementKind::from_name("Frame"), None);
    assert_eq!(ElementKind::Lcd.name(), "LCD");
    assert_eq!(ElementKind::Frame.name(), "Frame");
    assert!(ElementKind::DownButtonRight.is_button());
    assert!(!ElementKind::Touchscreen.is_button());
}

#[test]
fn generic_skin_layout() {
    let skin = Skin::new(SkinInfo::generic(), 1);
    assert_eq!(skin.touchscreen(), Rect::with_size(3, 3, 160, 220));
    assert_eq!(
        skin.bounds_of(ElementKind::Lcd),
        Some(Rect::with_size(3, 3, 160, 160))
    );
    assert_eq!(skin.test_point(Point::new(50, 50)), ElementKind::Touchscreen);
    assert_eq!(skin.test_point(Point::new(100, 226)), ElementKind::None);
    assert_eq!(skin.test_point(Point::new(100, 240)), ElementKind::Frame);
}

#[test]
fn hit_testing_with_slop() {
    let skin = Skin::new(sample(), 1);
    assert_eq!(skin.test_point(Point::new(15, 255)), ElementKind::PowerButton);
    assert_eq!(skin.test_point(Point::new(9, 255)), ElementKind::None);
    assert_eq!(skin.test_point(Point::new(5, 255)), ElementKind::None);
    assert_eq!(skin.test_point(Point::new(4, 255)), ElementKind::Frame);
    // Earlier elements take precedence where they overlap.
    assert_eq!(skin.test_point(Point::new(40, 50)), ElementKind::Touchscreen);
}

#[test]
fn double_scale_coordinates() {
    let skin = Skin::new(sample(), 2);
    assert_eq!(skin.element(0), Some((ElementKind::PowerButton, Rect::with_size(20, 500, 40, 20))));
    assert_eq!(skin.element(9), None);
    assert_eq!(skin.touchscreen(), Rect::with_size(60, 80, 320, 440));
    assert_eq!(skin.test_point(Point::new(30, 510)), ElementKind::PowerButton);

    assert_eq!(skin.window_to_touchscreen(Point::new(60, 80)), Point::new(0, 0));
    assert_eq!(skin.window_to_touchscreen(Point::new(101, 121)), Point::new(20, 20));
    // Outside points clamp to the touchscreen edge.
    assert_eq!(skin.window_to_touchscreen(Point::new(0, 1000)), Point::new(0, 219));
    assert_eq!(skin.touchscreen_to_window(Point::new(20, 20)), Point::new(100, 120));
}

#[test]
fn built_in_image_at_both_scales() {
    let small = default_image(1).unwrap();
    assert_eq!(small.size(), Point::new(166, 226));
    assert_eq!(small.format(), PixMapFormat::Rgb24);
    // Corner is background white, the LCD area is panel green.
    assert_eq!(&small.row(0)[..3], &[0xFF, 0xFF, 0xFF]);
    assert_eq!(&small.row(80)[80 * 3..80 * 3 + 3], &[0x7B, 0x8C, 0x5A]);

    let large = default_image(2).unwrap();
    assert_eq!(large.size(), Point::new(332, 452));
    assert_eq!(&large.row(161)[161 * 3..161 * 3 + 3], &[0x7B, 0x8C, 0x5A]);

    let skin = Skin::new(SkinInfo::generic(), 2);
    assert_eq!(skin.load_image(None).unwrap().size(), Point::new(332, 452));
}

#[test]
fn missing_skin_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let skin = Skin::new(sample(), 1);
    assert!(matches!(
        skin.load_image(Some(dir.path())),
        Err(CoreError::Io(_))
    ));
}

#[test]
fn outline_covers_the_case() {
    let image = default_image(1).unwrap();
    let region = outline(&image).unwrap();
    let bounds = region.bounds();
    assert!(bounds.width() <= 166 && bounds.height() <= 226);
    assert!(region.contains(Point::new(83, 100)));
    assert!(!region.contains(Point::new(0, 0)));
}

#[cfg(feature = "serde")]
#[test]
fn skin_info_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skins").join("test.json");
    let info = sample();
    info.save_to_file(&path).unwrap();
    assert_eq!(SkinInfo::load_from_file(&path).unwrap(), info);
}
