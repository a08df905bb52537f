use crate::block::BlockKind;
use crate::color::Palette;
use crate::error::ExperimentError;
use std::collections::HashMap;

struct StringTable {
    tag: &'static str,
    instructions: [&'static str; 4],
    continue_hint: &'static str,
    colors: &'static [(&'static str, &'static str)],
}

const ENGLISH: StringTable = StringTable {
    tag: "en",
    instructions: [
        "Push the colored button\nshowing the color written with text",
        "Push the colored button showing\nthe color of the letters, not the word",
        "Push the button showing the name of\nthe color of the rectangle",
        "Push the button showing the name of\nthe color of the rectangle, not the word",
    ],
    continue_hint: "Click the ? to continue",
    colors: &[
        ("RED", "RED"),
        ("GREEN", "GREEN"),
        ("BLUE", "BLUE"),
        ("YELLOW", "YELLOW"),
        ("PURPLE", "PURPLE"),
        ("ORANGE", "ORANGE"),
    ],
};

const HUNGARIAN: StringTable = StringTable {
    tag: "hu",
    instructions: [
        "Nyomd meg azt a színes gombot,\namelynek színét a szó megnevezi",
        "Nyomd meg azt a színes gombot,\namely a betűk színét mutatja, nem a szót",
        "Nyomd meg azt a gombot,\namely a téglalap színét nevezi meg",
        "Nyomd meg azt a gombot, amely a téglalap\nszínét nevezi meg, nem a ráírt szót",
    ],
    continue_hint: "Kattints a ?-re a folytatáshoz",
    colors: &[
        ("RED", "PIROS"),
        ("GREEN", "ZÖLD"),
        ("BLUE", "KÉK"),
        ("YELLOW", "SÁRGA"),
        ("PURPLE", "LILA"),
        ("ORANGE", "NARANCS"),
    ],
};

const TABLES: [&StringTable; 2] = [&ENGLISH, &HUNGARIAN];

/// Strings for one language, resolved once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct Locale {
    tag: String,
    instructions: HashMap<BlockKind, String>,
    continue_hint: String,
    colors: HashMap<String, String>,
}

impl Locale {
    pub fn supported() -> impl Iterator<Item = &'static str> {
        TABLES.iter().map(|t| t.tag)
    }

    /// Looks up the table for `tag` (`en`, `hu`, case-insensitive, region ignored).
    pub fn resolve(tag: &str) -> Result<Self, ExperimentError> {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let table = TABLES
            .iter()
            .find(|t| t.tag == primary)
            .ok_or_else(|| ExperimentError::UnsupportedLanguage(tag.to_string()))?;

        Ok(Self {
            tag: table.tag.to_string(),
            instructions: BlockKind::ALL
                .into_iter()
                .zip(table.instructions)
                .map(|(kind, text)| (kind, text.to_string()))
                .collect(),
            continue_hint: table.continue_hint.to_string(),
            colors: table
                .colors
                .iter()
                .map(|(key, word)| (key.to_string(), word.to_string()))
                .collect(),
        })
    }

    /// Adds or replaces the displayed word for a palette key.
    pub fn with_color_word(mut self, key: impl Into<String>, word: impl Into<String>) -> Self {
        self.colors.insert(key.into(), word.into());
        self
    }

    /// Fails on the first palette key without a word.
    pub fn check_palette(&self, palette: &Palette) -> Result<(), ExperimentError> {
        match palette.names().find(|name| !self.colors.contains_key(*name)) {
            Some(missing) => Err(ExperimentError::MissingColorWord {
                language: self.tag.clone(),
                color: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn instruction(&self, kind: BlockKind) -> &str {
        self.instructions
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn continue_hint(&self) -> &str {
        &self.continue_hint
    }

    /// Displayed word for a palette key; falls back to the key itself.
    pub fn color_word<'a>(&'a self, key: &'a str) -> &'a str {
        self.colors.get(key).map(String::as_str).unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Rgb, Swatch};

    #[test]
    fn resolves_language_with_region() {
        let locale = Locale::resolve("hu-HU").unwrap();
        assert_eq!(locale.tag(), "hu");
        assert_eq!(locale.color_word("GREEN"), "ZÖLD");
        assert!(locale.instruction(BlockKind::SwatchCongruent).contains("téglalap"));
    }

    #[test]
    fn unknown_language_is_an_error() {
        assert!(matches!(
            Locale::resolve("xx"),
            Err(ExperimentError::UnsupportedLanguage(tag)) if tag == "xx"
        ));
    }

    #[test]
    fn every_block_has_instructions() {
        for tag in Locale::supported() {
            let locale = Locale::resolve(tag).unwrap();
            for kind in BlockKind::ALL {
                assert!(!locale.instruction(kind).is_empty(), "{tag} {kind}");
            }
            locale.check_palette(&Palette::default()).unwrap();
        }
    }

    #[test]
    fn custom_palette_needs_words() {
        let palette = Palette::new(vec![
            Swatch::new("RED", Rgb(255, 0, 0)),
            Swatch::new("CYAN", Rgb(0, 255, 255)),
        ])
        .unwrap();
        let locale = Locale::resolve("en").unwrap();
        assert!(locale.check_palette(&palette).is_err());
        locale
            .with_color_word("CYAN", "CYAN")
            .check_palette(&palette)
            .unwrap();
    }
}
