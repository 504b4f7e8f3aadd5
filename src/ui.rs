pub mod font;
pub mod viewport;
