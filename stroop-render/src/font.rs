use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fonts tried, in order, when none is given on the command line.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font_file(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    parse_font(bytes, path)
}

fn parse_font(bytes: Vec<u8>, path: &Path) -> Result<FontVec> {
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// A font read once from disk: parsed for the frame painter, raw bytes kept for
/// the chart backend.
pub struct LoadedFont {
    pub font: FontVec,
    pub bytes: Vec<u8>,
    pub path: PathBuf,
}

/// Loads `path`, or the first readable font from [`FONT_SEARCH_PATHS`].
pub fn load_font(path: Option<&Path>) -> Result<LoadedFont> {
    let read = |path: &Path| -> Result<LoadedFont> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let font = parse_font(bytes.clone(), path)?;
        Ok(LoadedFont {
            font,
            bytes,
            path: path.to_path_buf(),
        })
    };
    if let Some(path) = path {
        return read(path);
    }
    for candidate in FONT_SEARCH_PATHS.iter().map(PathBuf::from) {
        match read(&candidate) {
            Ok(loaded) => return Ok(loaded),
            Err(e) => debug!(path = %candidate.display(), error = %e, "font candidate skipped"),
        }
    }
    Err(anyhow!(
        "no usable font found; pass one with --font (searched {})",
        FONT_SEARCH_PATHS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_font_names_the_path() {
        let Err(err) = load_font(Some(Path::new("/nonexistent/font.ttf"))) else {
            panic!("a missing file loaded as a font");
        };
        assert!(format!("{err:#}").contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn garbage_is_not_a_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(load_font_file(&path).is_err());
    }

    #[test]
    fn loaded_font_keeps_the_bytes_it_parsed() {
        let Ok(loaded) = load_font(None) else {
            return;
        };
        assert_eq!(std::fs::read(&loaded.path).unwrap(), loaded.bytes);
    }
}
