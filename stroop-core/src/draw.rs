use crate::color::Rgb;

/// Axis-aligned rectangle in surface pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: (f32, f32), width: f32, height: f32) -> Self {
        Self::new(center.0 - width * 0.5, center.1 - height * 0.5, width, height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Half-open on the far edges, so touching buttons never both match.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Primitive draw request understood by every display.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Single line of text centered on `center`.
    Text {
        text: String,
        size: f32,
        color: Rgb,
        center: (f32, f32),
    },
    FillRect {
        bounds: Bounds,
        color: Rgb,
    },
    StrokeRect {
        bounds: Bounds,
        color: Rgb,
        width: f32,
    },
}

/// A full screen: background plus draw requests in painting order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub background: Rgb,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(background: Rgb) -> Self {
        Self {
            background,
            commands: Vec::new(),
        }
    }

    pub fn blank() -> Self {
        Self::new(Rgb::WHITE)
    }

    pub fn text(&mut self, text: impl Into<String>, size: f32, color: Rgb, center: (f32, f32)) {
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            size,
            color,
            center,
        });
    }

    /// Multi-line text, each line centered horizontally, starting at `top_center`.
    pub fn paragraph(
        &mut self,
        text: &str,
        size: f32,
        color: Rgb,
        top_center: (f32, f32),
        line_spacing: f32,
    ) -> f32 {
        let mut y = top_center.1;
        for line in text.lines() {
            self.text(line.trim(), size, color, (top_center.0, y));
            y += size + line_spacing;
        }
        y
    }

    pub fn fill_rect(&mut self, bounds: Bounds, color: Rgb) {
        self.commands.push(DrawCommand::FillRect { bounds, color });
    }

    pub fn stroke_rect(&mut self, bounds: Bounds, color: Rgb, width: f32) {
        self.commands
            .push(DrawCommand::StrokeRect { bounds, color, width });
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let b = Bounds::new(10.0, 10.0, 20.0, 10.0);
        assert!(b.contains(10.0, 10.0));
        assert!(b.contains(29.9, 19.9));
        assert!(!b.contains(30.0, 15.0));
        assert!(!b.contains(15.0, 20.0));
    }

    #[test]
    fn centered_bounds() {
        let b = Bounds::centered((100.0, 50.0), 40.0, 20.0);
        assert_eq!(b.center(), (100.0, 50.0));
        assert_eq!((b.x, b.y), (80.0, 40.0));
    }

    #[test]
    fn paragraph_splits_lines() {
        let mut frame = Frame::blank();
        frame.paragraph("Push the button\n showing the color", 40.0, Rgb::BLACK, (320.0, 100.0), 10.0);
        assert_eq!(
            frame.texts().collect::<Vec<_>>(),
            vec!["Push the button", "showing the color"]
        );
    }
}
