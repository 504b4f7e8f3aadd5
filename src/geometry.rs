//! Window geometry primitives shared by the resize synchronizer and the
//! settings store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One axis of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Width,
    Height,
}

impl Dimension {
    /// The axis that gets corrected when this one changes.
    pub fn other(self) -> Self {
        match self {
            Dimension::Width => Dimension::Height,
            Dimension::Height => Dimension::Width,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Width => f.write_str("width"),
            Dimension::Height => f.write_str("height"),
        }
    }
}

/// Width over height of the reference image. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Degenerate ratios (zero, negative, NaN, infinite) fall back to 1.0.
    pub fn new(ratio: f64) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            Self(ratio)
        } else {
            Self(1.0)
        }
    }

    /// Ratio of an image of the given pixel size; a zero height yields 1.0.
    pub fn from_extent(width: f64, height: f64) -> Self {
        if height > 0.0 {
            Self::new(width / height)
        } else {
            Self(1.0)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Height that matches `width` at this ratio.
    pub fn height_for(self, width: f64) -> f64 {
        width / self.0
    }

    /// Width that matches `height` at this ratio.
    pub fn width_for(self, height: f64) -> f64 {
        height * self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Position and size of a window, in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A stored rectangle without a positive size means "no stored geometry".
    pub fn has_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Same geometry with `dimension` set to `value`.
    pub fn with_extent(&self, dimension: Dimension, value: f64) -> Self {
        let mut geometry = *self;
        match dimension {
            Dimension::Width => geometry.width = value,
            Dimension::Height => geometry.height = value,
        }
        geometry
    }

    /// Pull the window back inside `screen`: the origin may not be left of or
    /// above the screen, and the size may not exceed it.
    pub fn clamp_to(&self, screen: &WindowGeometry) -> Self {
        let mut clamped = *self;
        if clamped.x < screen.x {
            clamped.x = screen.x;
        }
        if clamped.y < screen.y {
            clamped.y = screen.y;
        }
        if clamped.width > screen.width {
            clamped.width = screen.width;
        }
        if clamped.height > screen.height {
            clamped.height = screen.height;
        }
        clamped
    }

    /// Same size, moved so that its center matches the center of `parent`.
    pub fn centered_on(&self, parent: &WindowGeometry) -> Self {
        Self {
            x: parent.x + (parent.width - self.width) / 2.0,
            y: parent.y + (parent.height - self.height) / 2.0,
            width: self.width,
            height: self.height,
        }
    }
}

/// Settings key prefix for a view: `MainView` becomes `MAIN_VIEW`.
///
/// An underscore is inserted before an upper-case letter that follows a
/// lower-case letter or a digit, so names that are already upper-case keep
/// their shape.
pub fn view_key(view_name: &str) -> String {
    let mut key = String::with_capacity(view_name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in view_name.trim().chars() {
        if ch.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            key.push('_');
        }
        key.extend(ch.to_uppercase());
        prev = Some(ch);
    }
    key
}
