//! Environment-driven preferences.
//!
//! Each getter reads its variable once and caches the answer for the
//! lifetime of the process.

/// Defines `pub fn $name() -> $ty` that reads `$var` once, maps the raw value
/// (or `None` when unset) through `$parse`, and caches the answer.
macro_rules! env_pref {
    ($name:ident: $ty:ty = $var:expr, $parse:expr) => {
        #[inline]
        pub fn $name() -> $ty {
            use std::sync::OnceLock;
            static V: OnceLock<$ty> = OnceLock::new();
            *V.get_or_init(|| {
                let parse: fn(Option<String>) -> $ty = $parse;
                parse(std::env::var($var).ok())
            })
        }
    };
}

env_pref!(env_scale: i32 = "POSER_SCALE", |v| v
    .and_then(|s| s.trim().parse().ok())
    .unwrap_or(1));
// Dimming stays on unless explicitly disabled.
env_pref!(env_dim_inactive: bool = "POSER_DIM_INACTIVE", |v| v.as_deref() != Some("0"));
env_pref!(env_show_debug_mode: bool = "POSER_SHOW_DEBUG_MODE", |v| v.as_deref() == Some("1"));
env_pref!(env_show_gremlin_mode: bool = "POSER_SHOW_GREMLIN_MODE", |v| v.as_deref() == Some("1"));
env_pref!(env_force_whole_lcd: bool = "POSER_FORCE_WHOLE_LCD", |v| v.is_some());
env_pref!(env_lcd_colors: Option<usize> = "POSER_LCD_COLORS", |v| v
    .and_then(|s| s.trim().parse().ok())
    .filter(|&n: &usize| n > 0));

/// Number of palette entries reserved for LCD content when building a
/// shared host palette.
pub const DEFAULT_LCD_COLORS: usize = 172;

/// User preferences that steer window painting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPrefs {
    pub scale: i32,
    pub dim_when_inactive: bool,
    pub show_debug_mode: bool,
    pub show_gremlin_mode: bool,
    pub force_whole_lcd: bool,
    pub lcd_colors: usize,
}

impl Default for WindowPrefs {
    fn default() -> Self {
        Self {
            scale: 1,
            dim_when_inactive: true,
            show_debug_mode: false,
            show_gremlin_mode: false,
            force_whole_lcd: false,
            lcd_colors: DEFAULT_LCD_COLORS,
        }
    }
}

impl WindowPrefs {
    pub fn from_env() -> Self {
        let scale = match env_scale() {
            2 => 2,
            1 => 1,
            other => {
                log::warn!("POSER_SCALE={other} unsupported, using 1");
                1
            }
        };
        Self {
            scale,
            dim_when_inactive: env_dim_inactive(),
            show_debug_mode: env_show_debug_mode(),
            show_gremlin_mode: env_show_gremlin_mode(),
            force_whole_lcd: env_force_whole_lcd(),
            lcd_colors: env_lcd_colors().unwrap_or(DEFAULT_LCD_COLORS).min(256),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_preferences() {
        let prefs = WindowPrefs::default();
        assert_eq!(prefs.scale, 1);
        assert!(prefs.dim_when_inactive);
        assert!(!prefs.show_debug_mode);
        assert_eq!(prefs.lcd_colors, DEFAULT_LCD_COLORS);
    }

    env_pref!(test_colors: Option<usize> = "POSER_TEST_PREF_COLORS", |v| v
        .and_then(|s| s.trim().parse().ok())
        .filter(|&n: &usize| n > 0));
    env_pref!(test_flag: bool = "POSER_TEST_PREF_UNSET", |v| v.as_deref() != Some("0"));

    #[test]
    fn getters_parse_once_and_cache() {
        std::env::set_var("POSER_TEST_PREF_COLORS", " 64 ");
        assert_eq!(test_colors(), Some(64));
        std::env::set_var("POSER_TEST_PREF_COLORS", "0");
        assert_eq!(test_colors(), Some(64));
        assert!(test_flag());
    }

    #[test]
    fn from_env_yields_supported_scale() {
        let prefs = WindowPrefs::from_env();
        assert!(prefs.scale == 1 || prefs.scale == 2);
        assert!(prefs.lcd_colors <= 256);
    }
}
