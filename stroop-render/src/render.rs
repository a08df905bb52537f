use ab_glyph::{Font, Glyph, PxScale, ScaleFont, point};
use anyhow::{Result, anyhow, bail};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use string_cache::DefaultAtom as Atom;
use stroop_core::{Bounds, DrawCommand, Frame, Rgb};
use stroop_timing::{CalibrationStats, HighPrecisionTimer, Timer};
use tiny_skia::{
    Color, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Stroke, Transform,
};
use tracing::warn;

pub fn skia_color(rgb: Rgb) -> Color {
    let [r, g, b, a] = rgb.rgba();
    Color::from_rgba8(r, g, b, a)
}

pub fn skia_rect(bounds: Bounds) -> Option<Rect> {
    Rect::from_xywh(bounds.x, bounds.y, bounds.width, bounds.height)
}

/// Rasterizes `text` on a transparent pixmap cropped to its ink.
///
/// `None` for text without any visible glyph.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // 1) Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // 2) Union pixel bounds from outlined glyphs
    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    // 3) Rasterize with premultiplied alpha blending
    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();
    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x.floor()).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y.floor()).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a_lin = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let premul = |c: u8| ((c as f32 * a_lin) as u8).min(sa);
            let bg = dst[i];

            // Porter-Duff over: out = src + bg * (1 - src.a)
            let inv = 1.0 - (sa as f32 / 255.0);
            let over = |s: u8, d: u8| s.saturating_add((d as f32 * inv) as u8);
            let a = over(sa, bg.alpha());
            let px = PremultipliedColorU8::from_rgba(
                over(premul(cu[0]), bg.red()).min(a),
                over(premul(cu[1]), bg.green()).min(a),
                over(premul(cu[2]), bg.blue()).min(a),
                a,
            );
            if let Some(px) = px {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    color: Rgb,
}

/// Rendered text pixmaps, keyed by content, size and color.
struct TextCache<F> {
    font: Option<F>,
    map: HashMap<TextKey, Arc<Pixmap>>,
    warned: bool,
}

impl<F: Font> TextCache<F> {
    fn new(font: Option<F>) -> Self {
        Self {
            font,
            map: HashMap::new(),
            warned: false,
        }
    }

    fn get_or_render(&mut self, text: &str, size: f32, color: Rgb) -> Option<Arc<Pixmap>> {
        let Some(font) = &self.font else {
            if !self.warned {
                warn!("no font loaded, text is not drawn");
                self.warned = true;
            }
            return None;
        };
        let key = TextKey {
            text: Atom::from(text),
            size_bits: size.to_bits(),
            color,
        };
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size, font, skia_color(color))?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    pub paint: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub commands: usize,
}

/// Paints [`Frame`]s onto an offscreen canvas and copies it to an RGBA frame buffer.
pub struct SkiaRenderer<F> {
    width: u32,
    height: u32,
    canvas: Pixmap,
    text_cache: TextCache<F>,
    component_timers: HashMap<&'static str, RefCell<HighPrecisionTimer>>,
}

impl<F: Font> SkiaRenderer<F> {
    pub fn new(width: u32, height: u32, font: Option<F>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width,
            height,
            canvas,
            text_cache: TextCache::new(font),
            component_timers: ["paint", "copy"]
                .iter()
                .map(|&k| (k, RefCell::new(HighPrecisionTimer::new())))
                .collect(),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width, new_height)
            .ok_or_else(|| anyhow!("invalid canvas size {new_width}x{new_height}"))?;
        self.width = new_width;
        self.height = new_height;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn cached_texts(&self) -> usize {
        self.text_cache.map.len()
    }

    /// Draws `frame` onto the canvas, replacing what was there.
    pub fn paint(&mut self, frame: &Frame) {
        self.canvas.fill(skia_color(frame.background));
        for command in &frame.commands {
            match command {
                DrawCommand::FillRect { bounds, color } => {
                    if let Some(rect) = skia_rect(*bounds) {
                        let mut paint = Paint::default();
                        paint.set_color(skia_color(*color));
                        paint.anti_alias = false;
                        self.canvas
                            .fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
                DrawCommand::StrokeRect {
                    bounds,
                    color,
                    width,
                } => {
                    if let Some(rect) = skia_rect(*bounds) {
                        let path = PathBuilder::from_rect(rect);
                        let mut paint = Paint::default();
                        paint.set_color(skia_color(*color));
                        let stroke = Stroke {
                            width: *width,
                            ..Stroke::default()
                        };
                        self.canvas
                            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                    }
                }
                DrawCommand::Text {
                    text,
                    size,
                    color,
                    center,
                } => {
                    if let Some(pm) = self.text_cache.get_or_render(text, *size, *color) {
                        let x = (center.0 - pm.width() as f32 * 0.5).round() as i32;
                        let y = (center.1 - pm.height() as f32 * 0.5).round() as i32;
                        self.canvas.draw_pixmap(
                            x,
                            y,
                            Pixmap::as_ref(&pm),
                            &PixmapPaint::default(),
                            Transform::identity(),
                            None,
                        );
                    }
                }
            }
        }
    }

    /// Paints `frame` and copies the canvas into `frame_buffer` (RGBA8, same size).
    pub fn render_frame<T: Timer>(
        &mut self,
        frame: &Frame,
        frame_buffer: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats> {
        if frame_buffer.len() != self.canvas.data().len() {
            bail!(
                "frame buffer holds {} bytes, canvas {}x{} needs {}",
                frame_buffer.len(),
                self.width,
                self.height,
                self.canvas.data().len()
            );
        }

        let t_paint = {
            let t = timer.now();
            self.paint(frame);
            timer.elapsed(t)
        };
        // Backgrounds are opaque, so premultiplied equals straight RGBA.
        let t_copy = {
            let t = timer.now();
            frame_buffer.copy_from_slice(self.canvas.data());
            timer.elapsed(t)
        };

        let total = t_paint + t_copy;
        self.component_timers["paint"]
            .borrow_mut()
            .record_frame(t_paint);
        self.component_timers["copy"]
            .borrow_mut()
            .record_frame(t_copy);
        timer.record_frame(total);

        Ok(FrameStats {
            paint: t_paint,
            copy: t_copy,
            total,
            commands: frame.commands.len(),
        })
    }

    /// Timing summary per render stage.
    pub fn component_stats(&self) -> Vec<(&'static str, CalibrationStats)> {
        let mut stats: Vec<_> = self
            .component_timers
            .iter()
            .map(|(name, timer)| (*name, timer.borrow().calibration_stats()))
            .collect();
        stats.sort_by_key(|(name, _)| *name);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_glyph::FontVec;
    use stroop_timing::ManualTimer;

    fn pixel(pm: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pm.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn paints_rectangles_over_background() {
        let mut r = SkiaRenderer::<FontVec>::new(200, 100, None).unwrap();
        let mut frame = Frame::blank();
        frame.fill_rect(Bounds::new(10.0, 10.0, 50.0, 50.0), Rgb(255, 0, 0));
        frame.stroke_rect(Bounds::new(100.0, 20.0, 60.0, 40.0), Rgb::BLACK, 4.0);
        r.paint(&frame);

        assert_eq!(pixel(r.canvas(), 30, 30), [255, 0, 0, 255]);
        assert_eq!(pixel(r.canvas(), 5, 5), [255, 255, 255, 255]);
        assert_eq!(pixel(r.canvas(), 100, 40), [0, 0, 0, 255]);
        // inside the border stays background
        assert_eq!(pixel(r.canvas(), 130, 40), [255, 255, 255, 255]);
    }

    #[test]
    fn repainting_replaces_the_previous_frame() {
        let mut r = SkiaRenderer::<FontVec>::new(50, 50, None).unwrap();
        let mut frame = Frame::blank();
        frame.fill_rect(Bounds::new(0.0, 0.0, 50.0, 50.0), Rgb(0, 0, 255));
        r.paint(&frame);
        r.paint(&Frame::blank());
        assert_eq!(pixel(r.canvas(), 25, 25), [255, 255, 255, 255]);
    }

    #[test]
    fn render_frame_copies_and_times() {
        let mut r = SkiaRenderer::<FontVec>::new(20, 10, None).unwrap();
        let mut timer = ManualTimer::new();
        let mut fb = vec![0u8; 20 * 10 * 4];
        let stats = r.render_frame(&Frame::new(Rgb(1, 2, 3)), &mut fb, &mut timer).unwrap();
        assert_eq!(&fb[..4], &[1, 2, 3, 255]);
        assert_eq!(stats.commands, 0);
        assert_eq!(timer.calibration_stats().samples, 1);

        let mut short = vec![0u8; 16];
        assert!(r.render_frame(&Frame::blank(), &mut short, &mut timer).is_err());
    }

    #[test]
    fn text_without_font_is_skipped() {
        let mut r = SkiaRenderer::<FontVec>::new(100, 100, None).unwrap();
        let mut frame = Frame::blank();
        frame.text("RED", 40.0, Rgb(255, 0, 0), (50.0, 50.0));
        r.paint(&frame);
        assert_eq!(r.cached_texts(), 0);
    }

    #[test]
    fn resize_rejects_empty_canvas() {
        let mut r = SkiaRenderer::<FontVec>::new(10, 10, None).unwrap();
        assert!(r.resize(0, 10).is_err());
        assert_eq!(r.size(), (10, 10));
        r.resize(30, 20).unwrap();
        assert_eq!(r.canvas().width(), 30);
    }

    #[test]
    fn system_font_text_is_cached_once() {
        // Runs only where a system font is installed.
        let Ok(crate::font::LoadedFont { font, .. }) = crate::font::load_font(None) else {
            return;
        };
        let mut r = SkiaRenderer::new(300, 120, Some(font)).unwrap();
        let mut frame = Frame::blank();
        frame.text("GREEN", 40.0, Rgb(0, 160, 0), (150.0, 60.0));
        frame.text("GREEN", 40.0, Rgb(0, 160, 0), (150.0, 60.0));
        r.paint(&frame);
        assert_eq!(r.cached_texts(), 1);
        let inked = (0..300)
            .any(|x| pixel(r.canvas(), x, 60) != [255, 255, 255, 255]);
        assert!(inked);
    }
}
