use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
}

/// Colors used when synthesizing marker bitmaps. The arrow gradient runs
/// primary → accent with the primary (darker) shade at the arrow tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: Rgba,
    pub accent: Rgba,
    pub arrow_stroke: Rgba,
    pub shape_fill: Rgba,
    pub shape_focus_fill: Rgba,
    pub shape_stroke: Rgba,
    pub label_fill: Rgba,
    pub label_border: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Rgba::opaque(0x2e, 0x7d, 0x32),
            accent: Rgba::opaque(0x66, 0xbb, 0x6a),
            arrow_stroke: Rgba::WHITE,
            shape_fill: Rgba::opaque(0x45, 0x55, 0x64),
            shape_focus_fill: Rgba::opaque(0x1b, 0x5e, 0x20),
            shape_stroke: Rgba::WHITE,
            label_fill: Rgba::new(0xff, 0xff, 0xff, 0xe6),
            label_border: Rgba::opaque(0x37, 0x47, 0x4f),
        }
    }
}

/// Markers at the same z tier get a per-stop offset inside this range so
/// overlapping stops resolve in a stable order instead of z-fighting.
pub const Z_BIAS_RANGE: f32 = 0.1;

/// Deterministic z tie-break via CRC32 hash of the stop id, normalized into
/// `[0, Z_BIAS_RANGE)`.
pub fn stop_z_bias(stop_id: &str) -> f32 {
    let hash = crc32fast::hash(stop_id.as_bytes());
    (hash as f32 / (u32::MAX as f32 + 1.0)) * Z_BIAS_RANGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_z_bias_is_deterministic() {
        assert_eq!(stop_z_bias("1_100"), stop_z_bias("1_100"));
    }

    #[test]
    fn stop_z_bias_varies_for_different_ids() {
        assert_ne!(stop_z_bias("1_100"), stop_z_bias("1_101"));
    }

    #[test]
    fn stop_z_bias_stays_in_range() {
        for id in ["", "a", "1_100", "40_platform-C", "long-stop-id-0123456789"] {
            let bias = stop_z_bias(id);
            assert!((0.0..Z_BIAS_RANGE).contains(&bias), "bias {bias} for {id:?}");
        }
    }
}
