pub mod animation;
pub mod atlas;
pub mod cache;
pub mod config;
pub mod engine;
pub mod focus;
pub mod geometry;
pub mod overlay;
pub mod resources;

pub use animation::BounceAnimation;
pub use atlas::{IconAtlas, IconDescriptor, IconVariant};
pub use config::OverlayConfig;
pub use engine::{MapEngine, MarkerHandle, MarkerOptions, ScreenPoint};
pub use overlay::{FocusListener, StopOverlay};
pub use resources::{BoxedTextRasterizer, ProceduralArt, StopArt, TextRasterizer};
