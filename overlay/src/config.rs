//! Tunables for the stop overlay. Defaults mirror a phone-density map view;
//! embedders override individual fields as needed.

/// Edge of the base stop circle bitmap, in pixels.
pub const DEFAULT_ICON_SIZE_PX: u32 = 44;

/// Scale applied to the focused icon set (and to the close-zoom "large" set).
pub const FOCUS_ICON_SCALE: f32 = 1.5;

/// Above this zoom the large icon set and the transit-mode badges show.
pub const ICON_LARGE_ZOOM_LEVEL: f32 = 17.0;

/// Above this zoom the normal icon set and platform labels show.
pub const ICON_ZOOM_LEVEL: f32 = 16.0;

/// Above this zoom station name labels show.
pub const STATION_LABEL_ZOOM_LEVEL: f32 = 14.0;

/// Soft cap on tracked stop groups. Crossing it clears the whole cache
/// (fuzzy eviction), preserving only the focused stop.
pub const FUZZY_MAX_MARKER_COUNT: usize = 200;

/// Text size for platform and station labels, in pixels.
pub const LABEL_TEXT_SIZE: f32 = 16.0;

/// Inset of the mode glyph inside its badge square, in pixels.
pub const MODE_BADGE_INSET: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    pub icon_size_px: u32,
    pub focus_scale: f32,
    pub icon_large_zoom: f32,
    pub icon_zoom: f32,
    pub station_label_zoom: f32,
    pub max_marker_count: usize,
    pub label_text_size: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            icon_size_px: DEFAULT_ICON_SIZE_PX,
            focus_scale: FOCUS_ICON_SCALE,
            icon_large_zoom: ICON_LARGE_ZOOM_LEVEL,
            icon_zoom: ICON_ZOOM_LEVEL,
            station_label_zoom: STATION_LABEL_ZOOM_LEVEL,
            max_marker_count: FUZZY_MAX_MARKER_COUNT,
            label_text_size: LABEL_TEXT_SIZE,
        }
    }
}

impl OverlayConfig {
    /// Arrow base width: half the stop icon edge.
    pub fn arrow_width(&self) -> f32 {
        self.icon_size_px as f32 / 2.0
    }

    /// Arrow height: a third of the stop icon edge.
    pub fn arrow_height(&self) -> f32 {
        self.icon_size_px as f32 / 3.0
    }

    /// Extra canvas margin on the arrow side of a directional icon. The
    /// arrow overlaps the circle slightly, so the buffer is a bit smaller
    /// than the arrow itself.
    pub fn buffer(&self) -> f32 {
        self.arrow_height() - self.icon_size_px as f32 / 10.0
    }

    /// Anchor-offset step so the selection indicator lands on the circle
    /// center rather than the bitmap center.
    pub fn percent_offset(&self) -> f32 {
        let px = self.icon_size_px as f32;
        (self.buffer() / (px + self.buffer())) * 0.5
    }

    /// Edge of the low-zoom dot bitmap.
    pub fn dot_size_px(&self) -> u32 {
        (self.icon_size_px as f32 / 2.5) as u32
    }

    /// Edge of the square transit-mode badge bitmap.
    pub fn badge_size_px(&self) -> u32 {
        (self.icon_size_px as f32 * self.focus_scale) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-5,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn derived_arrow_metrics() {
        let config = OverlayConfig {
            icon_size_px: 60,
            ..OverlayConfig::default()
        };
        assert_close(config.arrow_width(), 30.0);
        assert_close(config.arrow_height(), 20.0);
        assert_close(config.buffer(), 14.0);
        assert_close(config.percent_offset(), (14.0 / 74.0) * 0.5);
    }

    #[test]
    fn percent_offset_keeps_anchor_inside_unit_square() {
        let config = OverlayConfig::default();
        let k = config.percent_offset();
        assert!(k > 0.0 && k < 0.5);
    }

    #[test]
    fn badge_and_dot_sizes_scale_with_icon() {
        let config = OverlayConfig::default();
        assert_eq!(config.dot_size_px(), 17);
        assert_eq!(config.badge_size_px(), 66);
    }
}
