use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};
use stroop_core::{Bounds, Palette};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// One row of buttons below the stimulus.
    #[default]
    Row,
    /// Buttons on a circle around the stimulus.
    Radial,
}

/// A clickable response option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionButton {
    pub name: String,
    pub bounds: Bounds,
}

const MIN_GAP: f32 = 8.0;

/// Where the stimulus is drawn.
pub fn stimulus_anchor(kind: LayoutKind, surface: (f32, f32)) -> (f32, f32) {
    let (w, h) = surface;
    match kind {
        LayoutKind::Row => (w * 0.5, h * 0.5 - 50.0),
        LayoutKind::Radial => (w * 0.5, h * 0.5),
    }
}

/// Places one button per palette color, in palette order, without overlaps.
///
/// Buttons shrink when the surface is too small for the requested size.
pub fn arrange(
    kind: LayoutKind,
    palette: &Palette,
    surface: (f32, f32),
    button: (f32, f32),
) -> Vec<OptionButton> {
    let n = palette.len();
    if n == 0 {
        return Vec::new();
    }
    let (w, h) = surface;
    let centers: Vec<(f32, f32)> = match kind {
        LayoutKind::Row => {
            let step = w / (n as f32 + 1.0);
            (0..n)
                .map(|i| ((i as f32 + 1.0) * step, h * 0.5 + 150.0))
                .collect()
        }
        LayoutKind::Radial => {
            let radius = (w.min(h) * 0.5 - button.1).max(button.0);
            let center = (w * 0.5, h * 0.5);
            (0..n)
                .map(|i| {
                    let angle = -FRAC_PI_2 + TAU * i as f32 / n as f32;
                    (
                        center.0 + radius * angle.cos(),
                        center.1 + radius * angle.sin(),
                    )
                })
                .collect()
        }
    };

    let (bw, bh) = fit_button(&centers, button);
    palette
        .names()
        .zip(centers)
        .map(|(name, center)| OptionButton {
            name: name.to_string(),
            bounds: Bounds::centered(center, bw, bh),
        })
        .collect()
}

/// Scales the button down until neighbouring centers keep `MIN_GAP` between boxes.
fn fit_button(centers: &[(f32, f32)], button: (f32, f32)) -> (f32, f32) {
    let mut scale = 1.0f32;
    for (i, a) in centers.iter().enumerate() {
        for b in &centers[i + 1..] {
            let dx = (a.0 - b.0).abs();
            let dy = (a.1 - b.1).abs();
            // Boxes are disjoint if either axis separates them.
            let sx = (dx - MIN_GAP) / button.0;
            let sy = (dy - MIN_GAP) / button.1;
            let needed = sx.max(sy);
            if needed < scale {
                scale = needed.max(0.1);
            }
        }
    }
    (button.0 * scale, button.1 * scale)
}

pub fn hit_test(options: &[OptionButton], x: f32, y: f32) -> Option<&OptionButton> {
    options.iter().find(|o| o.bounds.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overlaps(options: &[OptionButton]) -> bool {
        options.iter().enumerate().all(|(i, a)| {
            options[i + 1..]
                .iter()
                .all(|b| !a.bounds.intersects(&b.bounds))
        })
    }

    #[test]
    fn row_layout_matches_reference_spacing() {
        let options = arrange(
            LayoutKind::Row,
            &Palette::default(),
            (1280.0, 1024.0),
            (150.0, 60.0),
        );
        assert_eq!(options.len(), 6);
        let step = 1280.0 / 7.0;
        assert!((options[0].bounds.center().0 - step).abs() < 1e-3);
        assert_eq!(options[0].bounds.width, 150.0);
        assert_eq!(options[5].name, "ORANGE");
        assert!(no_overlaps(&options));
    }

    #[test]
    fn narrow_surface_shrinks_buttons() {
        let options = arrange(
            LayoutKind::Row,
            &Palette::default(),
            (500.0, 400.0),
            (150.0, 60.0),
        );
        assert!(options[0].bounds.width < 150.0);
        assert!(no_overlaps(&options));
    }

    #[test]
    fn radial_layout_keeps_buttons_clear_of_each_other() {
        let options = arrange(
            LayoutKind::Radial,
            &Palette::default(),
            (1280.0, 1024.0),
            (150.0, 60.0),
        );
        assert!(no_overlaps(&options));
        let center = stimulus_anchor(LayoutKind::Radial, (1280.0, 1024.0));
        for option in &options {
            assert!(!option.bounds.contains(center.0, center.1));
        }
    }

    #[test]
    fn hit_test_finds_only_buttons() {
        let options = arrange(
            LayoutKind::Row,
            &Palette::default(),
            (1280.0, 1024.0),
            (150.0, 60.0),
        );
        let (x, y) = options[2].bounds.center();
        assert_eq!(hit_test(&options, x, y).map(|o| o.name.as_str()), Some("BLUE"));
        assert!(hit_test(&options, 5.0, 5.0).is_none());
    }
}
