use crate::error::ExperimentError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const LIGHT_GRAY: Rgb = Rgb(200, 200, 200);

    pub fn rgba(self) -> [u8; 4] {
        [self.0, self.1, self.2, 255]
    }
}

/// One named palette color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub name: String,
    pub rgb: Rgb,
}

impl Swatch {
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// Ordered set of uniquely named colors.
///
/// The order is the on-screen order of the response options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Swatch>", into = "Vec<Swatch>")]
pub struct Palette {
    swatches: Vec<Swatch>,
}

impl Palette {
    pub fn new(swatches: Vec<Swatch>) -> Result<Self, ExperimentError> {
        let mut seen = HashSet::with_capacity(swatches.len());
        for swatch in &swatches {
            if !seen.insert(swatch.name.as_str()) {
                return Err(ExperimentError::DuplicateColor(swatch.name.clone()));
            }
        }
        Ok(Self { swatches })
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Swatch> {
        self.swatches.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Swatch> {
        self.swatches.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.swatches.iter().map(|s| s.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.swatches.iter().position(|s| s.name == name)
    }

    pub fn rgb_of(&self, name: &str) -> Option<Rgb> {
        self.swatches.iter().find(|s| s.name == name).map(|s| s.rgb)
    }

    /// Reverse lookup; the first swatch wins if two names share a value.
    pub fn name_of(&self, rgb: Rgb) -> Option<&str> {
        self.swatches
            .iter()
            .find(|s| s.rgb == rgb)
            .map(|s| s.name.as_str())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            swatches: vec![
                Swatch::new("RED", Rgb(255, 0, 0)),
                Swatch::new("GREEN", Rgb(0, 255, 0)),
                Swatch::new("BLUE", Rgb(0, 0, 255)),
                Swatch::new("YELLOW", Rgb(255, 255, 0)),
                Swatch::new("PURPLE", Rgb(128, 0, 128)),
                Swatch::new("ORANGE", Rgb(255, 165, 0)),
            ],
        }
    }
}

impl TryFrom<Vec<Swatch>> for Palette {
    type Error = ExperimentError;

    fn try_from(swatches: Vec<Swatch>) -> Result<Self, Self::Error> {
        Palette::new(swatches)
    }
}

impl From<Palette> for Vec<Swatch> {
    fn from(palette: Palette) -> Self {
        palette.swatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_has_six_unique_colors() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 6);
        assert_eq!(palette.rgb_of("PURPLE"), Some(Rgb(128, 0, 128)));
        assert_eq!(palette.name_of(Rgb(255, 165, 0)), Some("ORANGE"));
        assert_eq!(palette.index_of("BLUE"), Some(2));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Palette::new(vec![
            Swatch::new("RED", Rgb(255, 0, 0)),
            Swatch::new("RED", Rgb(200, 0, 0)),
        ])
        .unwrap_err();
        assert!(matches!(err, ExperimentError::DuplicateColor(name) if name == "RED"));
    }

    #[test]
    fn palette_deserializes_from_list() {
        let json = r#"[{"name":"RED","rgb":[255,0,0]},{"name":"GREEN","rgb":[0,255,0]}]"#;
        let palette: Palette = serde_json::from_str(json).unwrap();
        assert_eq!(palette.names().collect::<Vec<_>>(), vec!["RED", "GREEN"]);

        let dup = r#"[{"name":"RED","rgb":[255,0,0]},{"name":"RED","rgb":[0,255,0]}]"#;
        assert!(serde_json::from_str::<Palette>(dup).is_err());
    }
}
