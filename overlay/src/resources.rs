//! Drawable and text capabilities consumed by the icon atlas. The traits are
//! the seam to the host platform's art and text stack; the built-in
//! implementations draw everything procedurally so the overlay works (and is
//! testable) without any assets.

use tiny_skia::{
    Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

use stopmap_shared::{Rgba, Theme, TransitMode};

/// Supplies the stop shape drawables and per-mode badge glyphs. A `None`
/// degrades the affected region to blank rather than failing the build.
pub trait StopArt: Send + Sync {
    fn stop_shape(&self, focused: bool, size: u32) -> Option<Pixmap>;
    fn stop_dot(&self, size: u32) -> Option<Pixmap>;
    fn mode_glyph(&self, mode: TransitMode, size: u32) -> Option<Pixmap>;
}

/// Text measurement and rasterization, consumed as an opaque service.
pub trait TextRasterizer: Send + Sync {
    /// Pixel size of the label bitmap `rasterize` would produce.
    fn measure(&self, text: &str, size: f32) -> (u32, u32);
    fn rasterize(&self, text: &str, size: f32) -> Option<Pixmap>;
}

pub(crate) fn to_color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

pub(crate) fn solid_paint(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(rgba));
    paint.anti_alias = true;
    paint
}

fn fill(pixmap: &mut Pixmap, path: &Path, rgba: Rgba) {
    pixmap.fill_path(
        path,
        &solid_paint(rgba),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

fn stroke(pixmap: &mut Pixmap, path: &Path, rgba: Rgba, width: f32) {
    pixmap.stroke_path(
        path,
        &solid_paint(rgba),
        &Stroke {
            width,
            ..Stroke::default()
        },
        Transform::identity(),
        None,
    );
}

/// Built-in stop art: white-ringed circles and minimal mode silhouettes.
#[derive(Debug, Clone)]
pub struct ProceduralArt {
    theme: Theme,
}

impl ProceduralArt {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl StopArt for ProceduralArt {
    fn stop_shape(&self, focused: bool, size: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(size, size)?;
        let s = size as f32;
        let ring = s / 10.0;
        let circle = PathBuilder::from_circle(s / 2.0, s / 2.0, s / 2.0 - ring)?;
        let body = if focused {
            self.theme.shape_focus_fill
        } else {
            self.theme.shape_fill
        };
        fill(&mut pixmap, &circle, body);
        stroke(&mut pixmap, &circle, self.theme.shape_stroke, ring);
        Some(pixmap)
    }

    fn stop_dot(&self, size: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(size, size)?;
        let s = size as f32;
        let circle = PathBuilder::from_circle(s / 2.0, s / 2.0, s / 2.0 - 1.0)?;
        fill(&mut pixmap, &circle, self.theme.shape_fill);
        stroke(&mut pixmap, &circle, self.theme.shape_stroke, 1.0);
        Some(pixmap)
    }

    fn mode_glyph(&self, mode: TransitMode, size: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(size, size)?;
        let s = size as f32;
        let ink = self.theme.shape_fill;
        match mode {
            TransitMode::Bus => {
                let body = PathBuilder::from_rect(Rect::from_xywh(
                    s * 0.15,
                    s * 0.20,
                    s * 0.70,
                    s * 0.50,
                )?);
                fill(&mut pixmap, &body, ink);
                for cx in [s * 0.32, s * 0.68] {
                    let wheel = PathBuilder::from_circle(cx, s * 0.76, s * 0.08)?;
                    fill(&mut pixmap, &wheel, ink);
                }
            }
            TransitMode::Rail => {
                let body = PathBuilder::from_rect(Rect::from_xywh(
                    s * 0.22,
                    s * 0.12,
                    s * 0.56,
                    s * 0.56,
                )?);
                fill(&mut pixmap, &body, ink);
                let mut legs = PathBuilder::new();
                legs.move_to(s * 0.30, s * 0.88);
                legs.line_to(s * 0.42, s * 0.68);
                legs.move_to(s * 0.70, s * 0.88);
                legs.line_to(s * 0.58, s * 0.68);
                stroke(&mut pixmap, &legs.finish()?, ink, s * 0.05);
            }
            TransitMode::Tram => {
                let body = PathBuilder::from_rect(Rect::from_xywh(
                    s * 0.25,
                    s * 0.25,
                    s * 0.50,
                    s * 0.50,
                )?);
                fill(&mut pixmap, &body, ink);
                let mut pantograph = PathBuilder::new();
                pantograph.move_to(s * 0.35, s * 0.22);
                pantograph.line_to(s * 0.50, s * 0.08);
                pantograph.line_to(s * 0.65, s * 0.22);
                stroke(&mut pixmap, &pantograph.finish()?, ink, s * 0.04);
            }
            TransitMode::Subway => {
                let tunnel = PathBuilder::from_circle(s / 2.0, s * 0.45, s * 0.32)?;
                fill(&mut pixmap, &tunnel, ink);
                let platform = PathBuilder::from_rect(Rect::from_xywh(
                    s * 0.15,
                    s * 0.78,
                    s * 0.70,
                    s * 0.08,
                )?);
                fill(&mut pixmap, &platform, ink);
            }
            TransitMode::Ferry => {
                let mut hull = PathBuilder::new();
                hull.move_to(s * 0.12, s * 0.58);
                hull.line_to(s * 0.88, s * 0.58);
                hull.line_to(s * 0.72, s * 0.80);
                hull.line_to(s * 0.28, s * 0.80);
                hull.close();
                fill(&mut pixmap, &hull.finish()?, ink);
                let cabin = PathBuilder::from_rect(Rect::from_xywh(
                    s * 0.35,
                    s * 0.36,
                    s * 0.30,
                    s * 0.18,
                )?);
                fill(&mut pixmap, &cabin, ink);
            }
        }
        Some(pixmap)
    }
}

const LABEL_PADDING: f32 = 6.0;
/// Rough advance width per glyph, as a fraction of the text size.
const GLYPH_ASPECT: f32 = 0.6;

/// Degraded built-in text capability: draws the label box with placeholder
/// glyph blocks and approximates metrics from the character count. Hosts
/// with a real text stack inject their own [`TextRasterizer`].
#[derive(Debug, Clone)]
pub struct BoxedTextRasterizer {
    theme: Theme,
}

impl BoxedTextRasterizer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl TextRasterizer for BoxedTextRasterizer {
    fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let glyphs = text.chars().count().max(1) as f32;
        let width = glyphs * size * GLYPH_ASPECT + 2.0 * LABEL_PADDING;
        let height = size * 1.4 + 2.0 * LABEL_PADDING;
        (width.ceil() as u32, height.ceil() as u32)
    }

    fn rasterize(&self, text: &str, size: f32) -> Option<Pixmap> {
        let (width, height) = self.measure(text, size);
        let mut pixmap = Pixmap::new(width, height)?;
        let rect = Rect::from_xywh(0.5, 0.5, width as f32 - 1.0, height as f32 - 1.0)?;
        let frame = PathBuilder::from_rect(rect);
        fill(&mut pixmap, &frame, self.theme.label_fill);
        stroke(&mut pixmap, &frame, self.theme.label_border, 1.0);

        let glyph_w = size * GLYPH_ASPECT;
        let glyph_h = size * 0.75;
        let top = (height as f32 - glyph_h) / 2.0;
        for (i, _) in text.chars().enumerate() {
            let x = LABEL_PADDING + i as f32 * glyph_w + glyph_w * 0.15;
            let Some(block) = Rect::from_xywh(x, top, glyph_w * 0.7, glyph_h) else {
                continue;
            };
            fill(
                &mut pixmap,
                &PathBuilder::from_rect(block),
                self.theme.label_border,
            );
        }
        Some(pixmap)
    }
}
