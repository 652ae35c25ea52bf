pub mod colors;
pub mod route;
pub mod stop;

pub use colors::{Rgba, Theme, stop_z_bias};
pub use route::*;
pub use stop::*;
