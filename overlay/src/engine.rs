//! The seam to the external map-rendering engine. The engine owns marker
//! placement, projection and hit-testing; the overlay only issues
//! add/update/remove calls and keeps the reverse handle→stop index.

use stopmap_shared::Point;

use crate::atlas::IconDescriptor;

/// Opaque reference to a visual marker owned by the map engine. Never
/// interpreted by the overlay, only stored and reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// A position in screen pixels, used only by the bounce-animation hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Everything needed to create one marker.
#[derive(Debug, Clone)]
pub struct MarkerOptions {
    pub position: Point,
    pub icon: IconDescriptor,
    pub z_order: f32,
    /// Flat markers rotate with the map; billboarded ones face the camera.
    pub flat: bool,
}

pub trait MapEngine {
    fn add_marker(&mut self, options: MarkerOptions) -> MarkerHandle;
    fn set_icon(&mut self, handle: MarkerHandle, icon: IconDescriptor);
    fn set_anchor(&mut self, handle: MarkerHandle, x: f32, y: f32);
    fn set_visible(&mut self, handle: MarkerHandle, visible: bool);
    fn set_position(&mut self, handle: MarkerHandle, position: Point);
    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Current camera zoom level.
    fn zoom(&self) -> f32;

    /// Geographic → screen projection; only the bounce hook uses these.
    fn project(&self, position: Point) -> ScreenPoint;
    fn unproject(&self, point: ScreenPoint) -> Point;
}
