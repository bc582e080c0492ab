use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use log::warn;
use tiny_skia::{
    Color as SkColor, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, Transform,
};

use recon_core::{Color, ResponseSurface, SurfaceFrame, SurfaceShape};

const CHROME: Color = [0, 0, 0, 255];
const PLACEHOLDER: Color = [128, 128, 128, 255];
const ARC_SEGMENTS: u32 = 64;

/// Where the response surface and the stimulus preview sit in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Stimulus in the left half, surface in the right half (grid variants).
    SideBySide,
    /// Surface centered with the stimulus inside it (wheel variant).
    Centered,
    /// Surface in the left half, answer image in the right half
    /// (wheel variant with a visible target, perceptual reconstruction).
    Split,
}

/// Static presentation parameters for a [`SkiaSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceStyle {
    pub shape: SurfaceShape,
    pub surface_width: u32,
    pub surface_height: u32,
    pub border_width: u32,
    pub stimulus_width: u32,
    pub stimulus_height: u32,
    pub layout: Layout,
}

/// Software-rendered response surface over a `tiny_skia` pixmap.
///
/// Holds the whole window canvas; the response area's frame is recomputed
/// from the current canvas size on every query, so window resizes are picked
/// up by the next pointer sample.
pub struct SkiaSurface {
    canvas: Pixmap,
    style: SurfaceStyle,
    answer_asset: Option<PathBuf>,
    cache: HashMap<PathBuf, Arc<Pixmap>>,
}

impl SkiaSurface {
    pub fn new(window_width: u32, window_height: u32, style: SurfaceStyle) -> Result<Self> {
        let canvas = Pixmap::new(window_width, window_height)
            .ok_or_else(|| anyhow!("zero-sized window canvas"))?;
        let mut surface = Self { canvas, style, answer_asset: None, cache: HashMap::new() };
        surface.clear();
        Ok(surface)
    }

    /// Pins the answer image into the layout's answer slot; it is repainted
    /// on every clear, so it survives the per-sample redraw cycle.
    pub fn set_answer_asset(&mut self, asset: PathBuf) {
        self.answer_asset = Some(asset);
        self.clear();
    }

    /// Premultiplied RGBA bytes of the full canvas, for presentation.
    pub fn data(&self) -> &[u8] {
        self.canvas.data()
    }

    pub fn resize(&mut self, window_width: u32, window_height: u32) {
        if let Some(canvas) = Pixmap::new(window_width, window_height) {
            self.canvas = canvas;
            self.clear();
        }
    }

    fn layout_frame(&self) -> SurfaceFrame {
        let (w, h) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        let (sw, sh) =
            (f64::from(self.style.surface_width), f64::from(self.style.surface_height));
        let anchor_x = match self.style.layout {
            Layout::SideBySide => w * 0.75,
            Layout::Centered => w * 0.5,
            Layout::Split => w * 0.25,
        };
        SurfaceFrame {
            shape: self.style.shape,
            left: anchor_x - sw / 2.0,
            top: (h - sh) / 2.0,
            width: sw,
            height: sh,
            inset: f64::from(self.style.border_width),
        }
    }

    /// Top-left corner of the stimulus preview, in canvas coordinates.
    fn stimulus_slot(&self) -> (f64, f64) {
        let (w, h) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        let (iw, ih) =
            (f64::from(self.style.stimulus_width), f64::from(self.style.stimulus_height));
        match self.style.layout {
            Layout::SideBySide => (w * 0.25 - iw / 2.0, (h - ih) / 2.0),
            Layout::Centered | Layout::Split => {
                let (cx, cy) = self.layout_frame().center();
                (cx - iw / 2.0, cy - ih / 2.0)
            }
        }
    }

    /// Top-left corner of the answer image, when the layout reserves one.
    fn answer_slot(&self) -> Option<(f64, f64)> {
        if self.style.layout != Layout::Split {
            return None;
        }
        let (w, h) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        let (iw, ih) =
            (f64::from(self.style.stimulus_width), f64::from(self.style.stimulus_height));
        Some((w * 0.75 - iw / 2.0, (h - ih) / 2.0))
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;
        paint
    }

    fn draw_chrome(&mut self) {
        let frame = self.layout_frame();
        let border = f64::from(self.style.border_width);
        if border <= 0.0 {
            return;
        }
        let stroke = Stroke { width: border as f32, ..Stroke::default() };
        let paint = Self::paint(CHROME);
        let path = match frame.shape {
            SurfaceShape::Rectangle => {
                Rect::from_xywh(
                    frame.left as f32,
                    frame.top as f32,
                    frame.width as f32,
                    frame.height as f32,
                )
                .map(PathBuilder::from_rect)
            }
            SurfaceShape::Circle => {
                let (cx, cy) = frame.center();
                let radius = (frame.width - border) / 2.0;
                PathBuilder::from_circle(cx as f32, cy as f32, radius as f32)
            }
        };
        if let Some(path) = path {
            self.canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn pixmap_for(&mut self, asset: &Path) -> Result<Arc<Pixmap>> {
        if let Some(pixmap) = self.cache.get(asset) {
            return Ok(Arc::clone(pixmap));
        }
        let img = image::open(asset)
            .with_context(|| format!("loading stimulus {}", asset.display()))?
            .into_rgba8();
        let (w, h) = img.dimensions();
        let mut pixmap = Pixmap::new(w, h).ok_or_else(|| anyhow!("empty stimulus image"))?;
        for (dst, px) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
            let [r, g, b, a] = px.0;
            let premul = |c: u8| (u16::from(c) * u16::from(a) / 255) as u8;
            *dst = PremultipliedColorU8::from_rgba(premul(r), premul(g), premul(b), a)
                .unwrap_or(PremultipliedColorU8::TRANSPARENT);
        }
        let pixmap = Arc::new(pixmap);
        self.cache.insert(asset.to_path_buf(), Arc::clone(&pixmap));
        Ok(pixmap)
    }

    /// Scales the asset into a stimulus-sized box at `(x, y)`, falling back
    /// to a grey placeholder when it cannot be loaded.
    fn blit_stimulus(&mut self, asset: &Path, x: f64, y: f64) {
        match self.pixmap_for(asset) {
            Ok(pixmap) => {
                let sx = self.style.stimulus_width as f32 / pixmap.width() as f32;
                let sy = self.style.stimulus_height as f32 / pixmap.height() as f32;
                let transform = Transform::from_scale(sx, sy).post_translate(x as f32, y as f32);
                let paint =
                    PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
                self.canvas.draw_pixmap(0, 0, pixmap.as_ref().as_ref(), &paint, transform, None);
            }
            Err(err) => {
                warn!("stimulus unavailable, drawing placeholder: {err:#}");
                self.draw_placeholder(x, y);
            }
        }
    }

    fn draw_placeholder(&mut self, x: f64, y: f64) {
        if let Some(rect) = Rect::from_xywh(
            x as f32,
            y as f32,
            self.style.stimulus_width as f32,
            self.style.stimulus_height as f32,
        ) {
            self.canvas.fill_rect(rect, &Self::paint(PLACEHOLDER), Transform::identity(), None);
        }
    }
}

impl ResponseSurface for SkiaSurface {
    fn frame(&self) -> SurfaceFrame {
        self.layout_frame()
    }

    fn clear(&mut self) {
        self.canvas.fill(SkColor::from_rgba8(255, 255, 255, 255));
        self.draw_chrome();
        if let (Some(asset), Some((x, y))) = (self.answer_asset.clone(), self.answer_slot()) {
            self.blit_stimulus(&asset, x, y);
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        let frame = self.layout_frame();
        let Some(path) = PathBuilder::from_circle(
            (frame.left + cx) as f32,
            (frame.top + cy) as f32,
            radius.max(0.1) as f32,
        ) else {
            return;
        };
        self.canvas.fill_path(
            &path,
            &Self::paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke_arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        mid: f64,
        half: f64,
        stroke_width: f64,
        color: Color,
    ) {
        let frame = self.layout_frame();
        let (cx, cy) = (frame.left + cx, frame.top + cy);
        let mut pb = PathBuilder::new();
        for i in 0..=ARC_SEGMENTS {
            let t = f64::from(i) / f64::from(ARC_SEGMENTS);
            let angle = mid - half + 2.0 * half * t;
            let x = (cx + angle.cos() * radius) as f32;
            let y = (cy + angle.sin() * radius) as f32;
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke { width: stroke_width as f32, ..Stroke::default() };
        self.canvas.stroke_path(&path, &Self::paint(color), &stroke, Transform::identity(), None);
    }

    fn show_stimulus(&mut self, asset: &Path) {
        let (x, y) = self.stimulus_slot();
        self.blit_stimulus(asset, x, y);
    }
}
