pub mod surface;

pub use surface::{Layout, SkiaSurface, SurfaceStyle};
