//! Per-direction geometry for the arrow markers: canvas layout, rotation,
//! gradient axis, rotation pivot and map anchor offsets. Pure lookups; the
//! rasterization itself lives in [`crate::atlas`].

use stopmap_shared::Direction;

use crate::config::OverlayConfig;

/// Pixel metrics every per-direction table is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconMetrics {
    /// Edge of the stop circle bitmap.
    pub px: f32,
    /// Arrow base width.
    pub arrow_w: f32,
    /// Arrow height from base to tip.
    pub arrow_h: f32,
    /// Canvas margin added on the arrow side of the icon.
    pub buffer: f32,
}

impl IconMetrics {
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self {
            px: config.icon_size_px as f32,
            arrow_w: config.arrow_width(),
            arrow_h: config.arrow_height(),
            buffer: config.buffer(),
        }
    }
}

/// Canvas size for one directional icon plus the placement of the circle
/// shape inside it. The circle is always `px`×`px`; the buffer margin sits
/// on whichever side the arrow extends past it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconLayout {
    pub width: u32,
    pub height: u32,
    pub shape_x: f32,
    pub shape_y: f32,
}

pub fn icon_layout(direction: Direction, m: &IconMetrics) -> IconLayout {
    let (px, buffer) = (m.px, m.buffer);
    let square = (px + buffer) as u32;
    let (width, height, shape_x, shape_y) = match direction {
        Direction::Unspecified => (px as u32, px as u32, 0.0, 0.0),
        Direction::North => (px as u32, square, 0.0, buffer),
        Direction::NorthWest => (square, square, buffer, buffer),
        Direction::West => (square, px as u32, buffer, 0.0),
        Direction::SouthWest => (square, square, buffer, 0.0),
        Direction::South => (px as u32, square, 0.0, 0.0),
        Direction::SouthEast => (square, square, 0.0, 0.0),
        Direction::East => (square, px as u32, 0.0, 0.0),
        Direction::NorthEast => (square, square, 0.0, buffer),
    };
    IconLayout {
        width,
        height,
        shape_x,
        shape_y,
    }
}

/// Rotation applied to the pre-drawn arrow polygon. `None` for the
/// undirected icon, which has no arrow. The polygon is drawn pointing north
/// for the N/S families and pointing west for the E/W pair, hence the 0°
/// entries for W and the 180° for E.
pub fn rotation_degrees(direction: Direction) -> Option<f32> {
    match direction {
        Direction::North => Some(0.0),
        Direction::NorthWest => Some(315.0),
        Direction::West => Some(0.0),
        Direction::SouthWest => Some(225.0),
        Direction::South => Some(180.0),
        Direction::SouthEast => Some(135.0),
        Direction::East => Some(180.0),
        Direction::NorthEast => Some(45.0),
        Direction::Unspecified => None,
    }
}

/// Endpoints of the primary→accent gradient, oriented so the darkest shade
/// sits at the arrow tip.
pub fn gradient_axis(direction: Direction, m: &IconMetrics) -> Option<((f32, f32), (f32, f32))> {
    let layout = icon_layout(direction, m);
    let (w, h) = (layout.width as f32, layout.height as f32);
    let (buffer, arrow_h) = (m.buffer, m.arrow_h);
    match direction {
        Direction::North => Some(((w / 2.0, 0.0), (w / 2.0, arrow_h))),
        Direction::NorthWest => Some(((0.0, 0.0), (buffer, buffer))),
        Direction::West => Some(((0.0, h / 2.0), (arrow_h, h / 2.0))),
        Direction::SouthWest => Some(((0.0, h), (buffer, h - buffer))),
        Direction::South => Some(((w / 2.0, h), (w / 2.0, h - arrow_h))),
        Direction::SouthEast => Some(((w, h), (w - buffer, h - buffer))),
        Direction::East => Some(((w, h / 2.0), (w - arrow_h, h / 2.0))),
        Direction::NorthEast => Some(((w, 0.0), (w - buffer, buffer))),
        Direction::Unspecified => None,
    }
}

/// Pivot the arrow polygon is rotated around. The diagonal pivots were tuned
/// by eye so the rotated arrow visually hugs the circle.
pub fn rotation_pivot(direction: Direction, m: &IconMetrics) -> Option<(f32, f32)> {
    let layout = icon_layout(direction, m);
    let (w, h) = (layout.width as f32, layout.height as f32);
    let (px, buffer) = (m.px, m.buffer);
    match direction {
        Direction::North => Some((w / 2.0, h / 2.0)),
        Direction::NorthWest => Some((px / 2.0 + buffer / 2.0, h / 2.0 - buffer / 2.0)),
        Direction::West => Some((h / 2.0, h / 2.0)),
        Direction::SouthWest => Some((w / 2.0 - buffer / 4.0, px / 2.0 + buffer / 4.0)),
        Direction::South => Some((w / 2.0, h / 2.0)),
        Direction::SouthEast => Some(((px + buffer / 2.0) / 2.0, h / 2.0)),
        Direction::East => Some((w / 2.0, h / 2.0)),
        Direction::NorthEast => Some((px / 2.0, h - px / 2.0)),
        Direction::Unspecified => None,
    }
}

/// The chevron polygon before rotation: tip, lower-left, base notch,
/// lower-right. The notch keeps the silhouette an arrow instead of a plain
/// triangle; filled with the even-odd rule.
pub fn arrow_points(direction: Direction, m: &IconMetrics) -> Option<[(f32, f32); 4]> {
    let (px, arrow_w, arrow_h) = (m.px, m.arrow_w, m.arrow_h);
    let cutout = px / 12.0;
    match direction {
        Direction::North
        | Direction::South
        | Direction::NorthEast
        | Direction::SouthEast
        | Direction::NorthWest
        | Direction::SouthWest => Some([
            (px / 2.0, 0.0),
            (px / 2.0 - arrow_w / 2.0, arrow_h),
            (px / 2.0, arrow_h - cutout),
            (px / 2.0 + arrow_w / 2.0, arrow_h),
        ]),
        Direction::East | Direction::West => Some([
            (0.0, px / 2.0),
            (arrow_h, px / 2.0 - arrow_w / 2.0),
            (arrow_h - cutout, px / 2.0),
            (arrow_h, px / 2.0 + arrow_w / 2.0),
        ]),
        Direction::Unspecified => None,
    }
}

/// Anchor percent-offsets so the map engine centers the selection indicator
/// on the stop circle, not on the (asymmetric) bitmap. Each coordinate is
/// one of {0.5−k, 0.5, 0.5+k} with `k` = [`OverlayConfig::percent_offset`].
pub fn anchor(direction: Direction, percent_offset: f32) -> (f32, f32) {
    let k = percent_offset;
    match direction {
        Direction::North => (0.5, 0.5 + k),
        Direction::NorthWest => (0.5 + k, 0.5 + k),
        Direction::West => (0.5 + k, 0.5),
        Direction::SouthWest => (0.5 + k, 0.5 - k),
        Direction::South => (0.5, 0.5 - k),
        Direction::SouthEast => (0.5 - k, 0.5 - k),
        Direction::East => (0.5 - k, 0.5),
        Direction::NorthEast => (0.5 - k, 0.5 + k),
        Direction::Unspecified => (0.5, 0.5),
    }
}
