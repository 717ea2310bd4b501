//! The emulator window: decides each frame which parts of the device image
//! need repainting and hands the drawing to a [`HostWindow`].

mod palette;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::env::WindowPrefs;
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::pixmap::{PixMap, Rgb, RgbList, Tint};
use crate::region::Region;
use crate::screen::{Hal, Screen, ScreenUpdateInfo, LED_GREEN, LED_RED};
use crate::skin::{default_image, outline, ElementKind, Skin, SkinInfo};

/// How long a paint waits for the emulation thread before skipping a frame.
const STOP_TIMEOUT: Duration = Duration::from_millis(50);

/// Window size used when no skin image is available.
const DEFAULT_WINDOW_SIZE: Point = Point { x: 220, y: 330 };

const LCD_FRAME_COLOR: Rgb = Rgb::WHITE;
const LED_ORANGE: Rgb = Rgb::new(255, 128, 0);
const LED_RED_COLOR: Rgb = Rgb::new(255, 0, 0);
const LED_GREEN_COLOR: Rgb = Rgb::new(0, 255, 0);

/// Platform drawing hooks.
///
/// Coordinates are window pixels, already scaled.
pub trait HostWindow {
    /// The skin changed; resize the window to `size`.
    fn window_reset(&mut self, size: Point);

    /// Whether the host draws through a limited palette and wants
    /// [`HostWindow::palette_set`] calls.
    fn uses_palette(&self) -> bool {
        false
    }

    fn palette_set(&mut self, _colors: &[Rgb]) {}

    fn palette_restore(&mut self) {}

    /// Draw the whole case image.
    fn paint_case(&mut self, skin: &PixMap<'_>);

    /// Stroke `r` inward with a `pen`-sized brush.
    fn rect_frame(&mut self, r: Rect, pen: Point, color: Rgb);

    /// The LED indicator was switched on or off.
    fn led_enable(&mut self, _on: bool) {}

    fn paint_led(&mut self, bounds: Rect, color: Rgb);

    /// Blit rows `info.first_line..info.last_line` of the LCD image. `src`
    /// is relative to the LCD, `dest` to the window; `scaled` asks for 2x.
    fn paint_lcd(&mut self, info: &ScreenUpdateInfo, src: Rect, dest: Rect, scaled: bool);

    fn update_begin(&mut self) {}

    fn update_end(&mut self) {}

    fn drawing_begin(&mut self) {}

    fn drawing_end(&mut self) {}

    fn vibration_start(&mut self) {}

    fn vibration_stop(&mut self) {}
}

/// What a pen event in the window turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenAction {
    /// Nothing to post.
    Ignore,
    /// A touchscreen event in unscaled touchscreen coordinates.
    Pen { point: Point, down: bool },
    Button { kind: ElementKind, down: bool },
    /// The case was grabbed; the host should start a window drag.
    Drag,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SkinMode {
    dim: bool,
    tint: Option<Tint>,
}

pub struct Window<H: HostWindow, D: Hal> {
    host: H,
    device: Arc<Mutex<D>>,
    screen: Arc<Screen>,
    prefs: WindowPrefs,

    skin: Skin,
    skin_dir: Option<PathBuf>,
    skin_base: PixMap<'static>,
    skin_region: Region,
    /// `skin_base` altered for the current mode, built on demand.
    skin_current: Option<PixMap<'static>>,
    /// Quantized skin colors keyed by mode bits, filled on demand.
    skin_colors: [RgbList; 16],
    prev_lcd_colors: RgbList,

    old_lcd_on: bool,
    old_backlight_on: bool,
    old_led_state: u16,

    need_window_reset: bool,
    need_window_invalidate: bool,
    active: bool,
    debug_mode: bool,
    gremlin_mode: bool,
    wiggled: bool,
    current_button: ElementKind,
}

impl<H: HostWindow, D: Hal> Window<H, D> {
    /// Build the window and paint it once.
    pub fn new(
        host: H,
        device: Arc<Mutex<D>>,
        screen: Arc<Screen>,
        skin: SkinInfo,
        prefs: WindowPrefs,
    ) -> Result<Self> {
        let mut window = Self {
            host,
            device,
            screen,
            skin: Skin::new(skin, prefs.scale),
            prefs,
            skin_dir: None,
            skin_base: PixMap::new(),
            skin_region: Region::new(),
            skin_current: None,
            skin_colors: Default::default(),
            prev_lcd_colors: RgbList::new(),
            old_lcd_on: false,
            old_backlight_on: false,
            old_led_state: 0,
            need_window_reset: false,
            need_window_invalidate: false,
            active: true,
            debug_mode: false,
            gremlin_mode: false,
            wiggled: false,
            current_button: ElementKind::None,
        };
        window.window_reset()?;
        Ok(window)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn skin(&self) -> &Skin {
        &self.skin
    }

    /// Outline of the case image.
    pub fn skin_region(&self) -> &Region {
        &self.skin_region
    }

    pub fn prefs(&self) -> WindowPrefs {
        self.prefs
    }

    /// Takes effect on the next [`Window::handle_idle`].
    pub fn set_prefs(&mut self, prefs: WindowPrefs) {
        if prefs != self.prefs {
            self.prefs = prefs;
            self.need_window_reset = true;
        }
    }

    /// Switch skins; images are looked up in `dir`. Takes effect on the next
    /// [`Window::handle_idle`].
    pub fn set_skin(&mut self, info: SkinInfo, dir: Option<PathBuf>) {
        self.skin = Skin::new(info, self.prefs.scale);
        self.skin_dir = dir;
        self.need_window_reset = true;
    }

    /// Repaint everything on the next [`Window::handle_idle`].
    pub fn invalidate(&mut self) {
        self.need_window_invalidate = true;
    }

    /// Reload the skin image and rebuild everything derived from it.
    pub fn window_reset(&mut self) -> Result<()> {
        let scale = self.prefs.scale;
        if self.skin.scale() != scale {
            self.skin = Skin::new(self.skin.info().clone(), scale);
        }

        self.skin_base = match self.skin.load_image(self.skin_dir.as_deref()) {
            Ok(image) => image,
            Err(err) => {
                log::warn!(
                    "skin {:?} image unavailable ({err}), using the built-in one",
                    self.skin.info().name
                );
                default_image(scale)?
            }
        };
        self.skin_region = outline(&self.skin_base)?;

        for colors in &mut self.skin_colors {
            colors.clear();
        }
        self.skin_current = None;
        // Forces palette hosts to rebuild their palette.
        self.prev_lcd_colors.clear();

        self.reset_host()
    }

    fn reset_host(&mut self) -> Result<()> {
        let mut size = self.current_skin().size();
        if size.x == 0 {
            size.x = DEFAULT_WINDOW_SIZE.x;
        }
        if size.y == 0 {
            size.y = DEFAULT_WINDOW_SIZE.y;
        }
        log::debug!("window reset to {}x{}", size.x, size.y);
        self.host.window_reset(size);
        self.handle_update()
    }

    /// Full repaint, as for an expose event.
    pub fn handle_update(&mut self) -> Result<()> {
        self.host.update_begin();
        let result = self.paint_screen(true, true);
        self.host.update_end();
        result
    }

    /// Periodic work: apply pending resets, repaint what changed and track
    /// the vibrator.
    pub fn handle_idle(&mut self) -> Result<()> {
        self.host.drawing_begin();
        let result = if self.need_window_reset {
            self.window_reset()
        } else if self.need_window_invalidate {
            self.paint_screen(false, true)
        } else {
            self.paint_screen(false, self.prefs.force_whole_lcd)
        };
        self.need_window_reset = false;
        self.need_window_invalidate = false;
        self.host.drawing_end();
        result?;

        let Some(device) = self.device.try_lock_for(STOP_TIMEOUT) else {
            return Ok(());
        };
        let vibrating = device.vibrate_on();
        drop(device);

        if vibrating && !self.wiggled {
            self.wiggled = true;
            self.host.vibration_start();
        } else if !vibrating && self.wiggled {
            self.wiggled = false;
            self.host.vibration_stop();
        }
        Ok(())
    }

    pub fn handle_activate(&mut self, active: bool) -> Result<()> {
        if self.active == active {
            return Ok(());
        }
        self.active = active;
        self.skin_current = None;
        self.reset_host()
    }

    pub fn handle_debug_mode(&mut self, debug_mode: bool) -> Result<()> {
        if self.debug_mode == debug_mode {
            return Ok(());
        }
        self.debug_mode = debug_mode;
        self.skin_current = None;
        self.reset_host()
    }

    pub fn handle_gremlin_mode(&mut self, gremlin_mode: bool) -> Result<()> {
        if self.gremlin_mode == gremlin_mode {
            return Ok(());
        }
        self.gremlin_mode = gremlin_mode;
        self.skin_current = None;
        self.reset_host()
    }

    /// Work out what a pen event at window point `at` means.
    ///
    /// Once a press lands on a button or the touchscreen, later events go to
    /// that element until the pen comes up.
    pub fn handle_pen_event(&mut self, at: Point, down: bool) -> PenAction {
        let what = if down && self.current_button == ElementKind::None {
            self.skin.test_point(at)
        } else {
            self.current_button
        };

        let (action, tracking) = match what {
            ElementKind::Touchscreen => (
                PenAction::Pen {
                    point: self.skin.window_to_touchscreen(at),
                    down,
                },
                down,
            ),
            // A drag swallows the release, so stop tracking right away.
            ElementKind::Frame if down => (PenAction::Drag, false),
            ElementKind::Frame | ElementKind::None => (PenAction::Ignore, false),
            kind => (PenAction::Button { kind, down }, down),
        };

        self.current_button = if tracking { what } else { ElementKind::None };
        action
    }

    /// Snapshot of the whole LCD, for screenshots. `None` if the emulation
    /// could not be paused.
    pub fn lcd_contents(&self) -> Option<ScreenUpdateInfo> {
        let mut device = self.device.try_lock_for(STOP_TIMEOUT)?;
        let mut info = ScreenUpdateInfo::default();
        self.screen.invalidate_all(&*device);
        self.screen.get_bits(&mut *device, &mut info);
        self.screen.invalidate_all(&*device);
        Some(info)
    }

    /// Repaint the window. `draw_case` forces the case image, `whole_lcd`
    /// the full LCD; otherwise only what changed since the last frame is
    /// drawn.
    pub fn paint_screen(&mut self, mut draw_case: bool, whole_lcd: bool) -> Result<()> {
        let mut info = ScreenUpdateInfo::default();
        let mut draw_frame = false;
        let mut draw_led = false;
        let mut draw_lcd = false;
        let led_state;

        {
            let Some(mut device) = self.device.try_lock_for(STOP_TIMEOUT) else {
                log::debug!("emulation busy, skipping frame");
                return Ok(());
            };

            let lcd_on = device.lcd_screen_on();
            let backlight_on = device.lcd_backlight_on();
            led_state = device.led_state();

            // The case shows through when the LCD or LED goes dark.
            if (!lcd_on && self.old_lcd_on) || (led_state == 0 && self.old_led_state != 0) {
                draw_case = true;
            }

            if draw_case || lcd_on != self.old_lcd_on || backlight_on != self.old_backlight_on {
                draw_lcd = lcd_on;
            }
            if draw_case || lcd_on != self.old_lcd_on {
                draw_frame = lcd_on && device.lcd_has_frame();
            }
            if draw_case || led_state != self.old_led_state {
                draw_led = led_state != 0;
                self.host.led_enable(draw_led);
            }

            self.old_lcd_on = lcd_on;
            self.old_backlight_on = backlight_on;
            self.old_led_state = led_state;

            if whole_lcd || draw_lcd {
                self.screen.invalidate_all(&*device);
            }
            if self.screen.get_bits(&mut *device, &mut info) {
                draw_lcd = lcd_on;
            }

            let size = info.image.size();
            if size.x == 0 || size.y == 0 {
                draw_lcd = false;
            }
        }

        let draw_anything = draw_case || draw_frame || draw_led || draw_lcd;
        if draw_anything {
            self.palette_set(&info)?;
        }
        if draw_case {
            self.paint_case();
        }
        if draw_frame {
            self.paint_lcd_frame();
        }
        if draw_led {
            self.paint_led(led_state);
        }
        if draw_lcd {
            self.paint_lcd(&info);
        }
        if draw_anything {
            self.host.palette_restore();
        }
        Ok(())
    }

    fn palette_set(&mut self, info: &ScreenUpdateInfo) -> Result<()> {
        if !self.host.uses_palette() {
            return Ok(());
        }
        let lcd_colors = info.image.color_table();
        if self.prev_lcd_colors_changed(lcd_colors) {
            let colors = self.system_colors(info)?;
            self.save_lcd_colors(lcd_colors);
            self.host.palette_set(&colors);
        }
        Ok(())
    }

    fn paint_case(&mut self) {
        let mode = self.skin_mode();
        let skin = current_skin(&mut self.skin_current, &self.skin_base, mode);
        self.host.paint_case(skin);
    }

    /// White border around the LCD, as on backlit hardware.
    pub fn paint_lcd_frame(&mut self) {
        let pen = self.skin.scale_up_point(Point::new(2, 2));
        let mut r = self.lcd_bounds();
        r.inset(-pen.x, -pen.y);
        self.host.rect_frame(r, pen, LCD_FRAME_COLOR);
    }

    pub fn paint_led(&mut self, led_state: u16) {
        let color = if led_state & (LED_RED | LED_GREEN) == LED_RED | LED_GREEN {
            LED_ORANGE
        } else if led_state & LED_RED != 0 {
            LED_RED_COLOR
        } else {
            LED_GREEN_COLOR
        };
        let bounds = self.led_bounds();
        self.host.paint_led(bounds, color);
    }

    /// Hand the changed LCD rows to the host.
    pub fn paint_lcd(&mut self, info: &ScreenUpdateInfo) {
        let lcd = self.lcd_bounds();

        let mut dest = self.skin.scale_down_rect(lcd);
        dest.bottom = dest.top + info.last_line;
        dest.top += info.first_line;
        let dest = self.skin.scale_up_rect(dest);

        let src = dest - lcd.top_left();
        let scaled = self.skin.scale() != 1;
        self.host.paint_lcd(info, src, dest, scaled);
    }

    /// Window bounds of the LCD.
    pub fn lcd_bounds(&self) -> Rect {
        self.skin
            .bounds_of(ElementKind::Lcd)
            .unwrap_or(Rect::new(10, 10, 170, 170))
    }

    /// Window bounds of the LED: the skin's LED element, or a square inside
    /// the power button.
    pub fn led_bounds(&self) -> Rect {
        if let Some(bounds) = self.skin.bounds_of(ElementKind::Led) {
            return bounds;
        }
        let Some(mut bounds) = self.skin.bounds_of(ElementKind::PowerButton) else {
            return Rect::new(10, 10, 20, 20);
        };
        let (width, height) = (bounds.width(), bounds.height());
        if width > height {
            bounds.left += (width - height) / 2;
            bounds.right = bounds.left + height;
        } else {
            bounds.top += (height - width) / 2;
            bounds.bottom = bounds.top + width;
        }
        bounds.inset(2, 2);
        bounds
    }

    /// The case image as currently shown: dimmed when inactive, tinted in
    /// debug or gremlin mode.
    pub fn current_skin(&mut self) -> &PixMap<'static> {
        let mode = self.skin_mode();
        current_skin(&mut self.skin_current, &self.skin_base, mode)
    }

    fn skin_mode(&self) -> SkinMode {
        let tint = if self.debug_mode && self.prefs.show_debug_mode {
            Some(Tint::Red)
        } else if self.gremlin_mode && self.prefs.show_gremlin_mode {
            Some(Tint::Green)
        } else {
            None
        };
        SkinMode {
            dim: !self.active && self.prefs.dim_when_inactive,
            tint,
        }
    }

    /// Whether `colors` differs from the LCD palette last saved with
    /// [`Window::save_lcd_colors`]. Direct-color images (no table) always
    /// count as changed.
    pub fn prev_lcd_colors_changed(&self, colors: &[Rgb]) -> bool {
        colors.is_empty() || colors != self.prev_lcd_colors.as_slice()
    }

    pub fn save_lcd_colors(&mut self, colors: &[Rgb]) {
        self.prev_lcd_colors = colors.to_vec();
    }
}

fn current_skin<'s>(
    slot: &'s mut Option<PixMap<'static>>,
    base: &PixMap<'static>,
    mode: SkinMode,
) -> &'s PixMap<'static> {
    slot.get_or_insert_with(|| {
        let mut skin = base.clone();
        if mode.dim {
            skin.change_tone(40);
        }
        if let Some(tint) = mode.tint {
            skin.convert_to_color(tint);
        }
        skin
    })
}
