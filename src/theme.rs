//! Subject colors: the preset palette, hex validation and terminal output.

use crossterm::style::{Color, Stylize};

/// Offered to new subjects in order; the first one is the default.
pub const PRESET_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#f59e0b", "#eab308", "#84cc16",
    "#22c55e", "#10b981", "#14b8a6", "#06b6d4", "#0ea5e9",
    "#3b82f6", "#6366f1", "#8b5cf6", "#a855f7", "#d946ef",
    "#ec4899", "#f43f5e",
];

/// Used when a task points at a subject that no longer resolves.
pub const FALLBACK_COLOR: &str = "#999999";

pub fn default_color() -> &'static str { PRESET_COLORS[0] }

/// Parses `#rrggbb` or the short `#rgb` form.
pub fn hex_to_color(hex: &str) -> Option<Color> {
    let h = hex.strip_prefix('#')?;
    if !h.chars().all(|c| c.is_ascii_hexdigit()) { return None; }
    match h.len() {
        6 => {
            let r = u8::from_str_radix(&h[0..2], 16).ok()?;
            let g = u8::from_str_radix(&h[2..4], 16).ok()?;
            let b = u8::from_str_radix(&h[4..6], 16).ok()?;
            Some(Color::Rgb { r, g, b })
        }
        3 => {
            let nib = |i: usize| u8::from_str_radix(&h[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Color::Rgb { r: nib(0)?, g: nib(1)?, b: nib(2)? })
        }
        _ => None,
    }
}

pub fn is_hex_color(s: &str) -> bool { hex_to_color(s).is_some() }

/// Foreground-colors `text`. Unparseable colors pass the text through
/// untouched; crossterm itself drops the styling when `NO_COLOR` is set.
pub fn paint(hex: &str, text: &str) -> String {
    match hex_to_color(hex) {
        Some(color) => text.with(color).to_string(),
        None        => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(hex_to_color("#ef4444"), Some(Color::Rgb { r: 0xef, g: 0x44, b: 0x44 }));
        assert_eq!(hex_to_color("#999"), Some(Color::Rgb { r: 0x99, g: 0x99, b: 0x99 }));
        assert_eq!(hex_to_color("#FFF"), Some(Color::Rgb { r: 255, g: 255, b: 255 }));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["ef4444", "#12345", "#ggg", "", "#", "#ä12"] {
            assert!(!is_hex_color(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn palette_starts_with_red() {
        assert_eq!(PRESET_COLORS.len(), 17);
        assert_eq!(default_color(), "#ef4444");
        assert!(PRESET_COLORS.iter().all(|c| is_hex_color(c)));
        assert!(is_hex_color(FALLBACK_COLOR));
    }

    #[test]
    fn paint_goes_through_crossterm() {
        assert_eq!(paint("red", "Math"), "Math");
        let expected = "Math".with(Color::Rgb { r: 255, g: 0, b: 0 }).to_string();
        assert_eq!(paint("#ff0000", "Math"), expected);
        assert!(paint("#f00", "Math").contains("Math"));
    }
}
