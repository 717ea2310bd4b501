//! Device skins: the case image, the hot spots laid over it and the
//! mapping between window and touchscreen coordinates.

mod decode;
mod xpm;

pub use decode::{decode_image, decode_jpeg};
pub use xpm::parse_xpm;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::geometry::{Point, Rect};
use crate::pixmap::{copy_rect, PixMap, Rgb};
use crate::region::Region;

const DEFAULT_SKIN: &str = include_str!("default_skin.xpm");

/// Pixels of slop around an element that count as "near miss".
const HIT_SLOP: i32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    PowerButton,
    UpButton,
    DownButton,
    App1Button,
    App2Button,
    App3Button,
    App4Button,
    CradleButton,
    Antenna,
    ContrastButton,
    TriggerLeft,
    TriggerCenter,
    TriggerRight,
    UpButtonLeft,
    UpButtonRight,
    DownButtonLeft,
    DownButtonRight,
    Touchscreen,
    Lcd,
    Led,
    /// The case itself.
    Frame,
    /// Just outside an element.
    None,
}

const ELEMENT_NAMES: [(ElementKind, &str); 20] = [
    (ElementKind::PowerButton, "PowerButton"),
    (ElementKind::UpButton, "UpButton"),
    (ElementKind::DownButton, "DownButton"),
    (ElementKind::App1Button, "App1Button"),
    (ElementKind::App2Button, "App2Button"),
    (ElementKind::App3Button, "App3Button"),
    (ElementKind::App4Button, "App4Button"),
    (ElementKind::CradleButton, "CradleButton"),
    (ElementKind::Antenna, "Antenna"),
    (ElementKind::ContrastButton, "ContrastButton"),
    (ElementKind::TriggerLeft, "TriggerLeft"),
    (ElementKind::TriggerCenter, "TriggerCenter"),
    (ElementKind::TriggerRight, "TriggerRight"),
    (ElementKind::UpButtonLeft, "UpButtonLeft"),
    (ElementKind::UpButtonRight, "UpButtonRight"),
    (ElementKind::DownButtonLeft, "DownButtonLeft"),
    (ElementKind::DownButtonRight, "DownButtonRight"),
    (ElementKind::Touchscreen, "Touchscreen"),
    (ElementKind::Lcd, "LCD"),
    (ElementKind::Led, "LED"),
];

impl ElementKind {
    pub fn name(self) -> &'static str {
        ELEMENT_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(
                if self == ElementKind::Frame { "Frame" } else { "None" },
                |(_, name)| *name,
            )
    }

    /// Case-insensitive lookup of a skin element name.
    pub fn from_name(name: &str) -> Option<Self> {
        ELEMENT_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(kind, _)| *kind)
    }

    /// Elements that behave as hardware buttons when clicked.
    pub fn is_button(self) -> bool {
        !matches!(
            self,
            ElementKind::Touchscreen
                | ElementKind::Lcd
                | ElementKind::Led
                | ElementKind::Frame
                | ElementKind::None
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinElement {
    pub kind: ElementKind,
    /// Unscaled bounds.
    pub bounds: Rect,
}

/// A skin description, as read from a skinfo file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinInfo {
    pub name: String,
    pub file_1x: String,
    pub file_2x: String,
    pub background: Rgb,
    pub highlight: Rgb,
    pub devices: Vec<String>,
    pub elements: Vec<SkinElement>,
}

const REQUIRED_KEYS: [&str; 6] = [
    "Name",
    "File1x",
    "File2x",
    "BackgroundColor",
    "HighlightColor",
    "Devices",
];

impl SkinInfo {
    /// The built-in skin: a bare LCD above a silkscreen area.
    pub fn generic() -> Self {
        let mut elements: Vec<SkinElement> = [
            ElementKind::PowerButton,
            ElementKind::UpButton,
            ElementKind::DownButton,
            ElementKind::App1Button,
            ElementKind::App2Button,
            ElementKind::App3Button,
            ElementKind::App4Button,
            ElementKind::CradleButton,
            ElementKind::Antenna,
            ElementKind::ContrastButton,
        ]
        .into_iter()
        .map(|kind| SkinElement {
            kind,
            bounds: Rect::default(),
        })
        .collect();
        elements.extend([
            SkinElement {
                kind: ElementKind::Touchscreen,
                bounds: Rect::with_size(3, 3, 160, 220),
            },
            SkinElement {
                kind: ElementKind::Lcd,
                bounds: Rect::with_size(3, 3, 160, 160),
            },
            SkinElement {
                kind: ElementKind::Led,
                bounds: Rect::default(),
            },
        ]);

        Self {
            name: "Generic".into(),
            file_1x: String::new(),
            file_2x: String::new(),
            background: Rgb::new(0x7B, 0x8C, 0x5A),
            highlight: Rgb::new(0x64, 0xF0, 0xDC),
            devices: Vec::new(),
            elements,
        }
    }

    /// Parse a skinfo file: `key = value` lines, `;` or `#` comments.
    ///
    /// Elements are taken from every key starting with `Element`, in key
    /// order, each as `Kind, left, top, width, height`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: BTreeMap<&str, (usize, &str)> = BTreeMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_start_matches([' ', '\t']);
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim_matches([' ', '\t', '\r']);
            entries.insert(key.trim_matches([' ', '\t']), (index + 1, value));
        }

        for key in REQUIRED_KEYS {
            if !entries.contains_key(key) {
                return Err(CoreError::SkinParse {
                    line: 0,
                    message: format!("missing {key}"),
                });
            }
        }
        let get = |key: &str| entries[key];

        let (line, devices) = get("Devices");
        let devices: Vec<String> = devices
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if devices.is_empty() {
            return Err(parse_error(line, "no devices listed"));
        }

        let mut elements = Vec::new();
        let (mut have_lcd, mut have_touchscreen) = (false, false);
        for (key, &(line, value)) in &entries {
            if !key.starts_with("Element") {
                continue;
            }
            let element = parse_element(line, value)?;
            have_lcd |= element.kind == ElementKind::Lcd;
            have_touchscreen |= element.kind == ElementKind::Touchscreen;
            elements.push(element);
        }
        if !have_lcd || !have_touchscreen {
            return Err(CoreError::SkinParse {
                line: 0,
                message: "a skin needs both an LCD and a Touchscreen element".into(),
            });
        }

        Ok(Self {
            name: get("Name").1.to_string(),
            file_1x: get("File1x").1.to_string(),
            file_2x: get("File2x").1.to_string(),
            background: parse_rgb(get("BackgroundColor"))?,
            highlight: parse_rgb(get("HighlightColor"))?,
            devices,
            elements,
        })
    }

    /// Unscaled bounds of the first element of `kind`.
    pub fn element(&self, kind: ElementKind) -> Option<Rect> {
        self.elements
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.bounds)
    }

    pub fn supports(&self, device: &str) -> bool {
        self.devices.iter().any(|d| d.eq_ignore_ascii_case(device))
    }

    #[cfg(feature = "serde")]
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> CoreError {
    CoreError::SkinParse {
        line,
        message: message.into(),
    }
}

/// Decimal, or hex with a `0x` prefix.
fn parse_number(line: usize, s: &str) -> Result<i32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| parse_error(line, format!("bad number {s:?}")))
}

fn parse_rgb((line, value): (usize, &str)) -> Result<Rgb> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 3 {
        return Err(parse_error(line, format!("expected r, g, b in {value:?}")));
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let n = parse_number(line, part)?;
        *slot = u8::try_from(n)
            .map_err(|_| parse_error(line, format!("color component {n} out of range")))?;
    }
    Ok(Rgb::new(rgb[0], rgb[1], rgb[2]))
}

fn parse_element(line: usize, value: &str) -> Result<SkinElement> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 5 {
        return Err(parse_error(
            line,
            format!("expected kind, left, top, width, height in {value:?}"),
        ));
    }
    let kind = ElementKind::from_name(parts[0])
        .ok_or_else(|| parse_error(line, format!("unknown element {:?}", parts[0].trim())))?;
    let left = parse_number(line, parts[1])?;
    let top = parse_number(line, parts[2])?;
    let width = parse_number(line, parts[3])?;
    let height = parse_number(line, parts[4])?;
    Ok(SkinElement {
        kind,
        bounds: Rect::with_size(left, top, width, height),
    })
}

/// A skin at a particular window scale.
#[derive(Clone, Debug)]
pub struct Skin {
    info: SkinInfo,
    scale: i32,
}

impl Skin {
    pub fn new(info: SkinInfo, scale: i32) -> Self {
        assert!(scale == 1 || scale == 2, "unsupported skin scale {scale}");
        Self { info, scale }
    }

    pub fn info(&self) -> &SkinInfo {
        &self.info
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn background_color(&self) -> Rgb {
        self.info.background
    }

    pub fn highlight_color(&self) -> Rgb {
        self.info.highlight
    }

    pub fn scale_up_point(&self, pt: Point) -> Point {
        pt * Point::new(self.scale, self.scale)
    }

    pub fn scale_down_point(&self, pt: Point) -> Point {
        pt / Point::new(self.scale, self.scale)
    }

    pub fn scale_up_rect(&self, r: Rect) -> Rect {
        r * Point::new(self.scale, self.scale)
    }

    pub fn scale_down_rect(&self, r: Rect) -> Rect {
        r / Point::new(self.scale, self.scale)
    }

    /// The `index`th element with its bounds scaled up.
    pub fn element(&self, index: usize) -> Option<(ElementKind, Rect)> {
        self.info
            .elements
            .get(index)
            .map(|e| (e.kind, self.scale_up_rect(e.bounds)))
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementKind, Rect)> + '_ {
        (0..self.info.elements.len()).filter_map(|i| self.element(i))
    }

    /// Scaled bounds of the first element of `kind`.
    pub fn bounds_of(&self, kind: ElementKind) -> Option<Rect> {
        self.info.element(kind).map(|r| self.scale_up_rect(r))
    }

    pub fn touchscreen(&self) -> Rect {
        self.bounds_of(ElementKind::Touchscreen).unwrap_or_else(|| {
            log::warn!("skin {:?} has no touchscreen", self.info.name);
            Rect::default()
        })
    }

    /// The element under `pt`, [`ElementKind::None`] for a near miss, or
    /// [`ElementKind::Frame`].
    pub fn test_point(&self, pt: Point) -> ElementKind {
        let hit = self.hit(pt, 0);
        if hit != ElementKind::Frame {
            return hit;
        }
        if self.hit(pt, HIT_SLOP) != ElementKind::Frame {
            return ElementKind::None;
        }
        ElementKind::Frame
    }

    fn hit(&self, pt: Point, outset: i32) -> ElementKind {
        self.elements()
            .find(|(_, mut bounds)| {
                bounds.inset(-outset, -outset);
                bounds.contains(pt)
            })
            .map_or(ElementKind::Frame, |(kind, _)| kind)
    }

    /// Window point to unscaled touchscreen coordinates, clamped to the
    /// touchscreen.
    pub fn window_to_touchscreen(&self, pt: Point) -> Point {
        let r = self.touchscreen();
        let mut result = pt - r.top_left();
        result.x = result.x.clamp(0, (r.width() - 1).max(0));
        result.y = result.y.clamp(0, (r.height() - 1).max(0));
        self.scale_down_point(result)
    }

    pub fn touchscreen_to_window(&self, pt: Point) -> Point {
        self.scale_up_point(pt) + self.touchscreen().top_left()
    }

    /// Load the case image for this scale: the file named by the skin from
    /// `dir`, or the built-in image when the skin names none.
    pub fn load_image(&self, dir: Option<&Path>) -> Result<PixMap<'static>> {
        let name = if self.scale == 2 {
            &self.info.file_2x
        } else {
            &self.info.file_1x
        };
        match dir {
            Some(dir) if !name.is_empty() => {
                let path = dir.join(name);
                log::debug!("loading skin image {}", path.display());
                decode_jpeg(&std::fs::read(path)?)
            }
            _ => default_image(self.scale),
        }
    }
}

/// The built-in case image at `scale`.
pub fn default_image(scale: i32) -> Result<PixMap<'static>> {
    let small = parse_xpm(DEFAULT_SKIN)?;
    if scale == 1 {
        return Ok(small);
    }
    let mut large = PixMap::with_size(small.size() * Point::new(2, 2), small.format());
    let (dest, src) = (large.bounds(), small.bounds());
    copy_rect(&mut large, &small, dest, src)?;
    Ok(large)
}

/// Outline of a case image: everything a flood from the border cannot reach
/// without crossing a dark pixel.
pub fn outline(image: &PixMap<'_>) -> Result<Region> {
    let mut mask = PixMap::new();
    image.create_mask(&mut mask)?;
    Ok(mask.create_region())
}

#[cfg(test)]
mod tests;
