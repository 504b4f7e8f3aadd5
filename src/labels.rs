//! The nine text labels drawn over the background, on a 3×3 grid:
//!
//! ```text
//! 0 1 2
//! 3 4 5
//! 6 7 8
//! ```

use crate::constant::{DEFAULT_LABEL_FAMILY, DEFAULT_LABEL_SIZE, LABEL_COUNT};
use crate::settings::SettingsStore;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelPos {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl LabelPos {
    pub const ALL: [LabelPos; LABEL_COUNT] = [
        LabelPos::TopLeft,
        LabelPos::TopCenter,
        LabelPos::TopRight,
        LabelPos::MiddleLeft,
        LabelPos::MiddleCenter,
        LabelPos::MiddleRight,
        LabelPos::BottomLeft,
        LabelPos::BottomCenter,
        LabelPos::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn row(self) -> usize {
        self.index() / 3
    }

    pub fn col(self) -> usize {
        self.index() % 3
    }

    pub fn name(self) -> &'static str {
        match self {
            LabelPos::TopLeft => "TOP_LEFT",
            LabelPos::TopCenter => "TOP_CENTER",
            LabelPos::TopRight => "TOP_RIGHT",
            LabelPos::MiddleLeft => "MIDDLE_LEFT",
            LabelPos::MiddleCenter => "MIDDLE_CENTER",
            LabelPos::MiddleRight => "MIDDLE_RIGHT",
            LabelPos::BottomLeft => "BOTTOM_LEFT",
            LabelPos::BottomCenter => "BOTTOM_CENTER",
            LabelPos::BottomRight => "BOTTOM_RIGHT",
        }
    }

    /// Parse a stored position; empty or unknown names mean the center.
    pub fn parse_or_center(value: &str) -> Self {
        value.parse().unwrap_or(LabelPos::MiddleCenter)
    }
}

impl fmt::Display for LabelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LabelPos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|pos| pos.name() == upper)
            .ok_or_else(|| format!("Unknown label position: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub fn name(self) -> &'static str {
        match self {
            FontStyle::Regular => "REGULAR",
            FontStyle::Bold => "BOLD",
            FontStyle::Italic => "ITALIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelFont {
    pub family: String,
    pub style: FontStyle,
    pub size: f32,
}

impl LabelFont {
    pub fn new(family: &str, style: FontStyle, size: f32) -> Self {
        Self {
            family: family.to_string(),
            style,
            size,
        }
    }

    /// Parse `"Name-STYLE-size"`, e.g. `"Comic Sans MS-ITALIC-20"`.
    ///
    /// An empty value gives Arial 12. A missing size gives 10, an unknown
    /// style is regular.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::new(DEFAULT_LABEL_FAMILY, FontStyle::Regular, 12.0);
        }

        let mut parts = value.split('-').map(str::trim);
        let family = parts.next().unwrap_or(DEFAULT_LABEL_FAMILY);
        let style = match parts.next() {
            Some(s) if s.eq_ignore_ascii_case("bold") => FontStyle::Bold,
            Some(s) if s.eq_ignore_ascii_case("italic") => FontStyle::Italic,
            _ => FontStyle::Regular,
        };
        let size = parts
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|size| *size > 0.0)
            .unwrap_or(10.0);

        Self::new(family, style, size)
    }

    /// Name under which this family/style pair is registered with the UI.
    pub fn family_key(&self) -> String {
        format!("{}-{}", self.family, self.style.name())
    }
}

impl Default for LabelFont {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_FAMILY, FontStyle::Regular, DEFAULT_LABEL_SIZE)
    }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LabelColor {
    pub const WHITE: LabelColor = LabelColor::rgb(255, 255, 255);
    pub const BLACK: LabelColor = LabelColor::rgb(0, 0, 0);
    pub const AQUAMARINE: LabelColor = LabelColor::rgb(127, 255, 212);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse web notation (`#rgb`, `#rrggbb`, `#rrggbbaa`, with or without
    /// `#`, or a few common names). Empty or invalid values are aquamarine.
    pub fn parse(value: &str) -> Self {
        Self::parse_web(value.trim()).unwrap_or(Self::AQUAMARINE)
    }

    fn parse_web(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            "red" => return Some(Self::rgb(255, 0, 0)),
            "green" => return Some(Self::rgb(0, 128, 0)),
            "blue" => return Some(Self::rgb(0, 0, 255)),
            "yellow" => return Some(Self::rgb(255, 255, 0)),
            "aquamarine" => return Some(Self::AQUAMARINE),
            _ => {}
        }

        let hex = value.strip_prefix('#').unwrap_or(value);
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).ok();
        match hex.len() {
            3 => {
                let r = channel(0, 1)?;
                let g = channel(1, 1)?;
                let b = channel(2, 1)?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            8 => Some(Self {
                r: channel(0, 2)?,
                g: channel(2, 2)?,
                b: channel(4, 2)?,
                a: channel(6, 2)?,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSlot {
    pub text: String,
    pub font: LabelFont,
    pub color: LabelColor,
    /// Point size the font had when it was set; rescaling starts from here.
    pub original_size: f32,
}

impl Default for LabelSlot {
    fn default() -> Self {
        let font = LabelFont::default();
        Self {
            text: String::new(),
            original_size: font.size,
            font,
            color: LabelColor::WHITE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelGrid {
    slots: [LabelSlot; LABEL_COUNT],
}

impl LabelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: LabelPos) -> &LabelSlot {
        &self.slots[pos.index()]
    }

    pub fn set(&mut self, pos: LabelPos, text: &str, font: LabelFont, color: LabelColor) {
        let slot = &mut self.slots[pos.index()];
        slot.text = text.to_string();
        slot.original_size = font.size;
        slot.font = font;
        slot.color = color;
    }

    /// Set the message with settings index `n` (keys `BG_MSG{n}_POS`,
    /// `BG_MSG{n}_FONT`, `BG_MSG{n}_COLOR`) to `text`. Returns the slot used.
    pub fn set_message(&mut self, settings: &SettingsStore, n: usize, text: &str) -> LabelPos {
        let pos = LabelPos::parse_or_center(&settings.get_string(&format!("BG_MSG{}_POS", n), ""));
        let font = LabelFont::parse(&settings.get_string(&format!("BG_MSG{}_FONT", n), ""));
        let color = LabelColor::parse(&settings.get_string(&format!("BG_MSG{}_COLOR", n), ""));
        self.set(pos, text, font, color);
        pos
    }

    /// Scale every font from its original size; sizes are whole points.
    pub fn rescale(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        for slot in &mut self.slots {
            let size = (slot.original_size as f64 * factor).floor() as f32;
            slot.font.size = size.max(1.0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelPos, &LabelSlot)> {
        LabelPos::ALL.into_iter().zip(self.slots.iter())
    }

    /// Font families referenced by any slot, for font registration.
    pub fn fonts(&self) -> Vec<LabelFont> {
        let mut fonts: Vec<LabelFont> = Vec::new();
        for slot in &self.slots {
            if !fonts.iter().any(|f| f.family_key() == slot.font.family_key()) {
                fonts.push(slot.font.clone());
            }
        }
        fonts
    }
}
