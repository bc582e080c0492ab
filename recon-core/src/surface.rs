use std::path::Path;

use crate::geometry::SurfaceFrame;

/// RGBA color for surface marks.
pub type Color = [u8; 4];

/// Drawing sink plus layout query for the response surface.
///
/// The session issues imperative draw calls against this boundary and owns no
/// pixels itself. Every redraw is a full clear-then-redraw, so implementations
/// must keep `clear` idempotent at arbitrary sample rates.
pub trait ResponseSurface {
    /// Current on-screen frame of the surface, resolved from live layout.
    fn frame(&self) -> SurfaceFrame;

    /// Reset the preview layer to its blank state (background plus chrome).
    fn clear(&mut self);

    /// Filled circle at a surface-local point.
    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color);

    /// Stroked arc spanning `mid ± half` radians on the circle of `radius`
    /// around the surface-local point `(cx, cy)`.
    fn stroke_arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        mid: f64,
        half: f64,
        stroke_width: f64,
        color: Color,
    );

    /// Present the stimulus asset for the current candidate.
    fn show_stimulus(&mut self, asset: &Path);
}
