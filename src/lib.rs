//! Aspect Shell library
//!
//! A window that keeps the aspect ratio of its background image while the
//! user resizes it, plus the preference store that remembers its geometry,
//! labels and background between runs.

pub mod app;
pub mod background;
pub mod config;
pub mod constant;
pub mod geometry;
pub mod labels;
pub mod resize;
pub mod settings;
pub mod style;
pub mod ui;
