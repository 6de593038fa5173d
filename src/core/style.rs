//! Appearance and window placement settings. Fixed after startup.

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xff)
    }

    /// Parses `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`; the `#` is optional.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 0x11);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Self::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Premultiplied ARGB32 in native-endian `u32` form.
    pub fn premultiplied(self) -> u32 {
        let a = u32::from(self.a);
        let r = mul_div255(u32::from(self.r), a);
        let g = mul_div255(u32::from(self.g), a);
        let b = mul_div255(u32::from(self.b), a);
        (a << 24) | (r << 16) | (g << 8) | b
    }
}

/// `a * b / 255`, rounded.
pub fn mul_div255(a: u32, b: u32) -> u32 {
    let t = a * b + 128;
    (t + (t >> 8)) >> 8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub fn uniform(value: u32) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub foreground: Color,
    pub background: Color,
    pub border_width: u32,
    pub border_color: Color,
    pub outline_width: u32,
    pub outline_color: Color,
    pub corner_radius: u32,
    pub padding: Padding,
    pub font_name: String,
    pub font_size: u32,
    pub result_spacing: i32,
    pub selection_foreground: Color,
    pub selection_background: Color,
    /// Color of the matched part of the selected result. `None` or a fully
    /// transparent color disables match highlighting.
    pub selection_highlight: Option<Color>,
    /// Horizontal padding around the selected result's background. Negative
    /// stretches it to the clip edges.
    pub selection_background_padding: i32,
    pub prompt_text: String,
    pub min_input_width: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            foreground: Color::rgb(0xff, 0xff, 0xff),
            background: Color::rgb(0x1b, 0x1d, 0x1e),
            border_width: 12,
            border_color: Color::rgb(0xf9, 0x26, 0x72),
            outline_width: 4,
            outline_color: Color::rgb(0x08, 0x08, 0x00),
            corner_radius: 0,
            padding: Padding::uniform(8),
            font_name: "Sans".to_string(),
            font_size: 24,
            result_spacing: 0,
            selection_foreground: Color::rgb(0xf9, 0x26, 0x72),
            selection_background: Color::TRANSPARENT,
            selection_highlight: None,
            selection_background_padding: 0,
            prompt_text: "run: ".to_string(),
            min_input_width: 0,
        }
    }
}

impl Style {
    pub fn highlight_color(&self) -> Option<Color> {
        self.selection_highlight.filter(|color| !color.is_transparent())
    }
}

/// Set of window edges the surface is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(u8);

impl Anchor {
    pub const TOP: Anchor = Anchor(1);
    pub const BOTTOM: Anchor = Anchor(2);
    pub const LEFT: Anchor = Anchor(4);
    pub const RIGHT: Anchor = Anchor(8);
    pub const CENTER: Anchor = Anchor(1 | 2 | 4 | 8);

    pub const fn union(self, other: Anchor) -> Anchor {
        Anchor(self.0 | other.0)
    }

    pub const fn contains(self, other: Anchor) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn from_name(name: &str) -> Option<Anchor> {
        let anchor = match name.to_ascii_lowercase().as_str() {
            "top-left" => Anchor::TOP.union(Anchor::LEFT),
            "top" => Anchor::TOP,
            "top-right" => Anchor::TOP.union(Anchor::RIGHT),
            "right" => Anchor::RIGHT,
            "bottom-right" => Anchor::BOTTOM.union(Anchor::RIGHT),
            "bottom" => Anchor::BOTTOM,
            "bottom-left" => Anchor::BOTTOM.union(Anchor::LEFT),
            "left" => Anchor::LEFT,
            "center" => Anchor::CENTER,
            _ => return None,
        };
        Some(anchor)
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::CENTER
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub anchor: Anchor,
    pub width: u32,
    pub height: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub orientation: Orientation,
    /// Results per page; 0 fills the window.
    pub max_results: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            anchor: Anchor::CENTER,
            width: 1280,
            height: 720,
            margin_top: 0,
            margin_bottom: 0,
            margin_left: 0,
            margin_right: 0,
            orientation: Orientation::Vertical,
            max_results: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Anchor, Color};

    #[test]
    fn parses_all_hex_forms() {
        assert_eq!(Color::from_hex("#fff"), Some(Color::rgb(0xff, 0xff, 0xff)));
        assert_eq!(Color::from_hex("#1234"), Some(Color::rgba(0x11, 0x22, 0x33, 0x44)));
        assert_eq!(Color::from_hex("1B1D1E"), Some(Color::rgb(0x1b, 0x1d, 0x1e)));
        assert_eq!(Color::from_hex("#F9267280"), Some(Color::rgba(0xf9, 0x26, 0x72, 0x80)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#ggg"), None);
        assert_eq!(Color::from_hex("#ééé"), None);
    }

    #[test]
    fn premultiplies_channels() {
        assert_eq!(Color::rgb(0xff, 0x80, 0x00).premultiplied(), 0xffff8000);
        assert_eq!(Color::rgba(0xff, 0xff, 0xff, 0x80).premultiplied(), 0x80808080);
        assert_eq!(Color::TRANSPARENT.premultiplied(), 0);
    }

    #[test]
    fn anchor_names() {
        assert_eq!(Anchor::from_name("CENTER"), Some(Anchor::CENTER));
        let top_left = Anchor::from_name("top-left").expect("anchor");
        assert!(top_left.contains(Anchor::TOP));
        assert!(top_left.contains(Anchor::LEFT));
        assert!(!top_left.contains(Anchor::RIGHT));
        assert_eq!(Anchor::from_name("middle"), None);
    }
}
