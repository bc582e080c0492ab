use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{LocalPoint, SurfaceFrame, SurfaceShape};
use crate::value::ParamValue;

/// A raw pointer sample in screen coordinates. Transient; only the most
/// recent sample and its derived candidate are ever retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the live indicator should be drawn for a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkPlacement {
    /// No indicator while searching (grid variant).
    Hidden,
    /// Surface-local indicator position (wheel variant: a dot on the ring).
    At(LocalPoint),
}

/// Result of mapping one pointer sample into parameter space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub value: ParamValue,
    /// Surface-local pointer position.
    pub local: LocalPoint,
    pub mark: MarkPlacement,
}

/// Uncertainty extent around a committed response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    /// Euclidean radius in surface pixels (grid variants).
    Radius(f64),
    /// Angular half-width in radians (wheel variant).
    HalfAngle(f64),
}

/// Pure pointer-to-parameter mapping.
///
/// Total over all inputs: geometrically invalid samples resolve to the
/// out-of-space sentinel, never to an error. The frame is resolved by the
/// caller from live layout on every sample.
pub trait CoordinateMapper {
    fn map(&self, sample: PointerSample, frame: &SurfaceFrame) -> Candidate;

    /// Extent of the uncertainty region between `anchor` (the commit point,
    /// surface-local) and the current sample.
    fn range_extent(&self, sample: PointerSample, anchor: LocalPoint, frame: &SurfaceFrame)
    -> Extent;

    /// Per-session random rotation, if this mapper applies one.
    fn rotation_offset(&self) -> Option<f64> {
        None
    }
}

/// Discretizes pointer positions into an H×V cell grid, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridMapper {
    pub horizontal_steps: u32,
    pub vertical_steps: u32,
}

impl GridMapper {
    pub fn new(horizontal_steps: u32, vertical_steps: u32) -> Self {
        Self { horizontal_steps, vertical_steps }
    }

    /// Scan bins along one axis: bin `i` wins when
    /// `origin + cell*i <= coord < origin + cell*(i+1)`.
    fn resolve_axis(coord: f64, origin: f64, steps: u32, cell: f64) -> Option<u32> {
        (0..steps).find(|&i| {
            let lo = origin + cell * f64::from(i);
            coord >= lo && coord < lo + cell
        })
    }
}

impl CoordinateMapper for GridMapper {
    fn map(&self, sample: PointerSample, frame: &SurfaceFrame) -> Candidate {
        let cell_w = frame.width / f64::from(self.horizontal_steps);
        let cell_h = frame.height / f64::from(self.vertical_steps);
        let x_bin = Self::resolve_axis(sample.x, frame.left, self.horizontal_steps, cell_w);
        let y_bin = Self::resolve_axis(sample.y, frame.top, self.vertical_steps, cell_h);

        let mut value = match (x_bin, y_bin) {
            (Some(x), Some(y)) => ParamValue::InSpace(x + y * self.horizontal_steps),
            _ => ParamValue::OutOfSpace,
        };

        // The bin lookup stays rectangular even when the visible surface is a
        // circle; the radius test is applied on top of it, not instead of it.
        if frame.shape == SurfaceShape::Circle {
            let (cx, cy) = frame.center();
            let dist = ((sample.x - cx).powi(2) + (sample.y - cy).powi(2)).sqrt();
            if dist > frame.width / 2.0 {
                value = ParamValue::OutOfSpace;
            }
        }

        Candidate {
            value,
            local: frame.to_local(sample.x, sample.y),
            mark: MarkPlacement::Hidden,
        }
    }

    fn range_extent(
        &self,
        sample: PointerSample,
        anchor: LocalPoint,
        frame: &SurfaceFrame,
    ) -> Extent {
        Extent::Radius(frame.to_local(sample.x, sample.y).distance_to(anchor))
    }
}

/// Pointer positions closer to the wheel center than this map to the
/// out-of-space sentinel; the angle is undefined there.
pub const CENTER_DEAD_ZONE_PX: f64 = 1.0;

/// Discretizes the pointer's angle about the wheel center into degree bins,
/// after subtracting a fixed per-session rotation offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularMapper {
    /// Degrees per bin.
    pub step_size: u32,
    /// Radians, fixed for the session, subtracted before binning.
    pub rotation_offset: f64,
    /// Indicator dot radius; the dot rides the ring inset by this amount.
    pub pointer_radius: f64,
}

impl AngularMapper {
    pub fn new(step_size: u32, rotation_offset: f64, pointer_radius: f64) -> Self {
        Self { step_size, rotation_offset, pointer_radius }
    }

    /// Draw the session's rotation offset uniformly from `[0, π)`.
    pub fn with_random_rotation<R: Rng>(step_size: u32, pointer_radius: f64, rng: &mut R) -> Self {
        Self::new(step_size, rng.random_range(0.0..PI), pointer_radius)
    }

    fn ring_mark(&self, frame: &SurfaceFrame, angle: f64) -> LocalPoint {
        let center = frame.local_ring_center();
        let ring_r = frame.width / 2.0 - self.pointer_radius;
        LocalPoint::new(center.x + angle.cos() * ring_r, center.y + angle.sin() * ring_r)
    }
}

impl CoordinateMapper for AngularMapper {
    fn map(&self, sample: PointerSample, frame: &SurfaceFrame) -> Candidate {
        let (cx, cy) = frame.ring_center();
        let dx = sample.x - cx;
        let dy = sample.y - cy;
        let local = frame.to_local(sample.x, sample.y);

        if (dx * dx + dy * dy).sqrt() < CENTER_DEAD_ZONE_PX {
            // Dead center: no defined angle. Treated like the starting
            // sentinel, with the indicator parked on the hub.
            return Candidate {
                value: ParamValue::OutOfSpace,
                local,
                mark: MarkPlacement::At(frame.local_ring_center()),
            };
        }

        let raw = dy.atan2(dx);
        let wrapped = (raw - self.rotation_offset).rem_euclid(2.0 * PI);
        let bin = (wrapped.to_degrees() / f64::from(self.step_size)).floor() as u32;

        Candidate {
            value: ParamValue::InSpace(bin),
            local,
            mark: MarkPlacement::At(self.ring_mark(frame, raw)),
        }
    }

    fn range_extent(
        &self,
        sample: PointerSample,
        anchor: LocalPoint,
        frame: &SurfaceFrame,
    ) -> Extent {
        let center = frame.local_ring_center();
        let start = (anchor.y - center.y).atan2(anchor.x - center.x);
        let local = frame.to_local(sample.x, sample.y);
        let end = (local.y - center.y).atan2(local.x - center.x);
        Extent::HalfAngle(wrapped_half_angle(start, end))
    }

    fn rotation_offset(&self) -> Option<f64> {
        Some(self.rotation_offset)
    }
}

/// Shortest angular distance between two angles, in `[0, π]`.
pub fn wrapped_half_angle(start: f64, end: f64) -> f64 {
    ((end - start + PI).rem_euclid(2.0 * PI) - PI).abs()
}
