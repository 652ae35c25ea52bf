//! Procedural synthesis of every marker bitmap: the low-zoom dot, the nine
//! directional arrow icons in their normal/large/focused variants, the
//! transit-mode badges, and on-demand text labels. Built once at overlay
//! construction and shared read-only from then on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap,
    PixmapPaint, Point, Shader, SpreadMode, Stroke, Transform,
};

use stopmap_shared::{Direction, Theme, TransitMode};

use crate::config::{MODE_BADGE_INSET, OverlayConfig};
use crate::geometry::{self, IconMetrics};
use crate::resources::{StopArt, TextRasterizer, solid_paint, to_color};

/// A rasterized marker bitmap plus the anchor percent-offsets it must be
/// placed with. Immutable once computed.
#[derive(Clone)]
pub struct IconDescriptor {
    pub bitmap: Arc<Pixmap>,
    pub anchor: (f32, f32),
}

impl fmt::Debug for IconDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconDescriptor")
            .field("width", &self.bitmap.width())
            .field("height", &self.bitmap.height())
            .field("anchor", &self.anchor)
            .finish()
    }
}

impl IconDescriptor {
    /// Whether two descriptors share the same underlying bitmap.
    pub fn same_bitmap(&self, other: &IconDescriptor) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}

/// Which of the three pre-built per-direction sets to pull from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Normal,
    Large,
    Focused,
}

pub struct IconAtlas {
    percent_offset: f32,
    label_text_size: f32,
    dot: Arc<Pixmap>,
    normal: [Arc<Pixmap>; 9],
    large: [Arc<Pixmap>; 9],
    focused: [Arc<Pixmap>; 9],
    badges: HashMap<TransitMode, Arc<Pixmap>>,
    text: Box<dyn TextRasterizer>,
}

impl IconAtlas {
    /// Synthesizes the full atlas. Deterministic: the same configuration,
    /// theme and art produce byte-identical bitmaps.
    pub fn build(
        config: &OverlayConfig,
        theme: &Theme,
        art: &dyn StopArt,
        text: Box<dyn TextRasterizer>,
    ) -> Self {
        let metrics = IconMetrics::from_config(config);

        let normal: [Pixmap; 9] = std::array::from_fn(|slot| {
            synthesize_stop_icon(Direction::ALL[slot], false, &metrics, theme, art)
        });
        let focused_base: [Pixmap; 9] = std::array::from_fn(|slot| {
            synthesize_stop_icon(Direction::ALL[slot], true, &metrics, theme, art)
        });

        // The close-zoom set is the normal set scaled up; the focused set is
        // scaled by the same factor so a focused stop reads larger than its
        // neighbors at every zoom.
        let scale = config.focus_scale;
        let large = std::array::from_fn(|slot| Arc::new(scaled(&normal[slot], scale)));
        let focused = std::array::from_fn(|slot| Arc::new(scaled(&focused_base[slot], scale)));
        let normal = normal.map(Arc::new);

        let dot_size = config.dot_size_px();
        let dot = Arc::new(
            art.stop_dot(dot_size)
                .unwrap_or_else(|| canvas(dot_size, dot_size)),
        );

        let badge_size = config.badge_size_px();
        let badges = TransitMode::ALL
            .into_iter()
            .map(|mode| {
                let inner = (badge_size as f32 - 2.0 * MODE_BADGE_INSET).max(1.0) as u32;
                let glyph = art.mode_glyph(mode, inner);
                (mode, Arc::new(compose_badge(glyph, badge_size)))
            })
            .collect();

        Self {
            percent_offset: config.percent_offset(),
            label_text_size: config.label_text_size,
            dot,
            normal,
            large,
            focused,
            badges,
            text,
        }
    }

    /// The plain low-zoom dot; anchored at its center.
    pub fn dot(&self) -> IconDescriptor {
        IconDescriptor {
            bitmap: self.dot.clone(),
            anchor: (0.5, 0.5),
        }
    }

    /// Directional stop icon in the requested variant, with the anchor that
    /// keeps the circle (not the bitmap) on the stop's location.
    pub fn stop_icon(&self, direction: Direction, variant: IconVariant) -> IconDescriptor {
        let set = match variant {
            IconVariant::Normal => &self.normal,
            IconVariant::Large => &self.large,
            IconVariant::Focused => &self.focused,
        };
        IconDescriptor {
            bitmap: set[direction.index()].clone(),
            anchor: geometry::anchor(direction, self.percent_offset),
        }
    }

    /// Square transit-mode badge; blank when the art stack had no glyph.
    pub fn badge(&self, mode: TransitMode) -> IconDescriptor {
        IconDescriptor {
            bitmap: self.badges[&mode].clone(),
            anchor: (0.5, 0.5),
        }
    }

    /// Platform-code label, rendered on demand. Anchored bottom-center onto
    /// a double-height canvas so the visible box floats above the stop.
    pub fn platform_label(&self, code: &str) -> IconDescriptor {
        self.label(code)
    }

    /// Station-name label, rendered on demand.
    pub fn station_label(&self, name: &str) -> IconDescriptor {
        self.label(name)
    }

    fn label(&self, label_text: &str) -> IconDescriptor {
        let (width, height) = self.text.measure(label_text, self.label_text_size);
        let mut pixmap = canvas(width, height * 2);
        if let Some(rendered) = self.text.rasterize(label_text, self.label_text_size) {
            pixmap.draw_pixmap(
                0,
                0,
                rendered.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        IconDescriptor {
            bitmap: Arc::new(pixmap),
            anchor: (0.5, 1.0),
        }
    }
}

impl fmt::Debug for IconAtlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconAtlas")
            .field("percent_offset", &self.percent_offset)
            .field("dot", &(self.dot.width(), self.dot.height()))
            .finish_non_exhaustive()
    }
}

fn canvas(width: u32, height: u32) -> Pixmap {
    Pixmap::new(width.max(1), height.max(1)).expect("pixmap dimensions are non-zero")
}

/// Draws one stop icon: the circle shape placed per the direction's layout,
/// then the rotated, gradient-filled, stroked arrow chevron.
fn synthesize_stop_icon(
    direction: Direction,
    focused: bool,
    metrics: &IconMetrics,
    theme: &Theme,
    art: &dyn StopArt,
) -> Pixmap {
    let layout = geometry::icon_layout(direction, metrics);
    let mut pixmap = canvas(layout.width, layout.height);

    if let Some(shape) = art.stop_shape(focused, metrics.px as u32) {
        pixmap.draw_pixmap(
            layout.shape_x as i32,
            layout.shape_y as i32,
            shape.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    let (Some(points), Some(angle), Some(pivot), Some((start, end))) = (
        geometry::arrow_points(direction, metrics),
        geometry::rotation_degrees(direction),
        geometry::rotation_pivot(direction, metrics),
        geometry::gradient_axis(direction, metrics),
    ) else {
        // Undirected icon: the circle alone.
        return pixmap;
    };

    let mut builder = PathBuilder::new();
    builder.move_to(points[0].0, points[0].1);
    for &(x, y) in &points[1..] {
        builder.line_to(x, y);
    }
    builder.close();
    let Some(path) = builder.finish() else {
        return pixmap;
    };
    let Some(path) = path.transform(Transform::from_rotate_at(angle, pivot.0, pivot.1)) else {
        return pixmap;
    };

    let mut fill = Paint::default();
    fill.anti_alias = true;
    fill.shader = LinearGradient::new(
        Point::from_xy(start.0, start.1),
        Point::from_xy(end.0, end.1),
        vec![
            GradientStop::new(0.0, to_color(theme.primary)),
            GradientStop::new(1.0, to_color(theme.accent)),
        ],
        SpreadMode::Reflect,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(to_color(theme.primary)));
    pixmap.fill_path(&path, &fill, FillRule::EvenOdd, Transform::identity(), None);

    pixmap.stroke_path(
        &path,
        &solid_paint(theme.arrow_stroke),
        &Stroke {
            width: 1.0,
            ..Stroke::default()
        },
        Transform::identity(),
        None,
    );

    pixmap
}

fn scaled(source: &Pixmap, factor: f32) -> Pixmap {
    let width = (source.width() as f32 * factor) as u32;
    let height = (source.height() as f32 * factor) as u32;
    let mut pixmap = canvas(width, height);
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        },
        Transform::from_scale(factor, factor),
        None,
    );
    pixmap
}

/// Centers the glyph inside the badge square, downscaling only when it
/// overflows the inset bounds.
fn compose_badge(glyph: Option<Pixmap>, size: u32) -> Pixmap {
    let mut pixmap = canvas(size, size);
    let Some(glyph) = glyph else {
        return pixmap;
    };

    let inner = size as f32 - 2.0 * MODE_BADGE_INSET;
    let (gw, gh) = (glyph.width() as f32, glyph.height() as f32);
    let scale = (inner / gw).min(inner / gh).min(1.0);
    let tx = (size as f32 - gw * scale) / 2.0;
    let ty = (size as f32 - gh * scale) / 2.0;
    pixmap.draw_pixmap(
        0,
        0,
        glyph.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        },
        Transform::from_scale(scale, scale).post_translate(tx, ty),
        None,
    );
    pixmap
}
