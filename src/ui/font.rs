/// Font setup for the label grid
///
/// Label fonts are named by family and style in the settings store. Each
/// requested pair is looked up among the system fonts with font-kit and
/// registered with egui as a named family, so a label can be drawn with
/// `FontFamily::Name(font.family_key())`.
use crate::labels::{FontStyle, LabelFont};
use eframe::egui::{FontData, FontDefinitions, FontFamily, FontId};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Style, Weight};
use font_kit::source::SystemSource;
use std::collections::HashSet;
use std::sync::Arc;

/// Fonts registered with egui and the label families they cover.
pub struct LabelFonts {
    pub definitions: FontDefinitions,
    registered: HashSet<String>,
}

impl LabelFonts {
    /// The egui font for `font`, falling back to the default proportional
    /// family when the system doesn't have it.
    pub fn font_id(&self, font: &LabelFont) -> FontId {
        let key = font.family_key();
        if self.registered.contains(&key) {
            FontId::new(font.size, FontFamily::Name(key.into()))
        } else {
            FontId::proportional(font.size)
        }
    }
}

/// Register every font of `fonts` that can be found on this system.
pub fn setup_fonts(fonts: &[LabelFont]) -> LabelFonts {
    // Start with defaults so we have fallbacks
    let mut definitions = FontDefinitions::default();
    let mut registered = HashSet::new();
    let source = SystemSource::new();

    for font in fonts {
        let key = font.family_key();
        if registered.contains(&key) {
            continue;
        }
        match load_font_data(&source, font) {
            Some(data) => {
                register_family(&mut definitions, &key, data);
                tracing::info!("Using system font '{}' for labels", key);
                registered.insert(key);
            }
            None => {
                tracing::warn!("Could not find system font '{}', using default", key);
            }
        }
    }

    LabelFonts {
        definitions,
        registered,
    }
}

fn properties_for(style: FontStyle) -> Properties {
    let mut properties = Properties::new();
    match style {
        FontStyle::Regular => {}
        FontStyle::Bold => {
            properties.weight(Weight::BOLD);
        }
        FontStyle::Italic => {
            properties.style(Style::Italic);
        }
    }
    properties
}

/// Load the bytes of the best system match for a family/style pair
fn load_font_data(source: &SystemSource, font: &LabelFont) -> Option<Vec<u8>> {
    let handle = source
        .select_best_match(
            &[FamilyName::Title(font.family.clone())],
            &properties_for(font.style),
        )
        .ok()?;
    match handle {
        Handle::Memory { bytes, .. } => Some(bytes.to_vec()),
        Handle::Path { path, .. } => std::fs::read(path).ok(),
    }
}

/// Register font bytes under `key`, with the default fonts as fallback
/// for glyphs the system font lacks
fn register_family(definitions: &mut FontDefinitions, key: &str, data: Vec<u8>) {
    definitions
        .font_data
        .insert(key.to_owned(), Arc::new(FontData::from_owned(data)));

    let mut chain = vec![key.to_owned()];
    if let Some(fallbacks) = definitions.families.get(&FontFamily::Proportional) {
        chain.extend(fallbacks.iter().cloned());
    }
    definitions
        .families
        .insert(FontFamily::Name(key.into()), chain);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_font_falls_back_to_proportional() {
        let fonts = LabelFonts {
            definitions: FontDefinitions::default(),
            registered: HashSet::new(),
        };
        let font = LabelFont::new("Nonexistent Family", FontStyle::Bold, 24.0);
        assert_eq!(fonts.font_id(&font), FontId::proportional(24.0));
    }

    #[test]
    fn test_registered_font_uses_named_family() {
        let mut definitions = FontDefinitions::default();
        register_family(&mut definitions, "Test-REGULAR", vec![0u8; 4]);
        let fonts = LabelFonts {
            definitions,
            registered: HashSet::from(["Test-REGULAR".to_string()]),
        };

        let font = LabelFont::new("Test", FontStyle::Regular, 18.0);
        assert_eq!(
            fonts.font_id(&font),
            FontId::new(18.0, FontFamily::Name("Test-REGULAR".into()))
        );
        let chain = &fonts.definitions.families[&FontFamily::Name("Test-REGULAR".into())];
        assert_eq!(chain[0], "Test-REGULAR");
        assert!(chain.len() > 1);
    }
}
