use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use recon_core::{AngularMapper, GridMapper, OUT_OF_SPACE_ID, StimulusLookup, SurfaceShape};

/// Construction-time configuration failures. The session does not start and
/// no partial preview is rendered when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("surface dimensions must be positive")]
    ZeroSurface,
    #[error("grid step sizes must be at least 1")]
    ZeroGridStep,
    #[error("angular step size must be between 1 and 360 degrees (got {0})")]
    BadAngularStep(u32),
    #[error("stimulus asset path is empty")]
    EmptyAssetPath,
}

/// Shape and pixel dimensions of the response surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpec {
    pub shape: SurfaceShape,
    pub width: u32,
    pub height: u32,
    /// Canvas border (grid) or indicator-ring stroke (wheel) width.
    pub border_width: u32,
}

impl SurfaceSpec {
    pub fn rectangle(width: u32, height: u32, border_width: u32) -> Self {
        Self { shape: SurfaceShape::Rectangle, width, height, border_width }
    }

    pub fn circle(diameter: u32, border_width: u32) -> Self {
        Self { shape: SurfaceShape::Circle, width: diameter, height: diameter, border_width }
    }
}

/// Discretization target for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceSpec {
    Grid { horizontal_step_size: u32, vertical_step_size: u32 },
    Angular { step_size: u32, random_rotation: bool },
}

impl SpaceSpec {
    pub fn grid_mapper(&self) -> Option<GridMapper> {
        match *self {
            SpaceSpec::Grid { horizontal_step_size, vertical_step_size } => {
                Some(GridMapper::new(horizontal_step_size, vertical_step_size))
            }
            SpaceSpec::Angular { .. } => None,
        }
    }

    /// Builds the wheel mapper, drawing the session's rotation offset when
    /// randomization is enabled.
    pub fn angular_mapper<R: Rng>(
        &self,
        indicator: &IndicatorSpec,
        rng: &mut R,
    ) -> Option<AngularMapper> {
        match *self {
            SpaceSpec::Angular { step_size, random_rotation } => {
                let pointer_radius = f64::from(indicator.pointer_radius);
                Some(if random_rotation {
                    AngularMapper::with_random_rotation(step_size, pointer_radius, rng)
                } else {
                    AngularMapper::new(step_size, 0.0, pointer_radius)
                })
            }
            SpaceSpec::Grid { .. } => None,
        }
    }
}

/// Live indicator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub show: bool,
    pub pointer_radius: u32,
    pub ring_width: u32,
}

impl Default for IndicatorSpec {
    fn default() -> Self {
        Self { show: true, pointer_radius: 4, ring_width: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub surface: SurfaceSpec,
    pub space: SpaceSpec,
    /// Parameter value shown before the first pointer sample arrives.
    pub starting_value: u32,
    pub indicator: IndicatorSpec,
    /// Enables the second confirm phase capturing an uncertainty region.
    pub uncertainty_range: bool,
    /// Parameter value of a target image kept visible beside the surface,
    /// for perceptual (rather than memory) reconstruction.
    #[serde(default)]
    pub answer_value: Option<u32>,
    pub assets: StimulusLookup,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceSpec::rectangle(300, 300, 1),
            space: SpaceSpec::Grid { horizontal_step_size: 10, vertical_step_size: 10 },
            starting_value: OUT_OF_SPACE_ID,
            indicator: IndicatorSpec { show: false, ..IndicatorSpec::default() },
            uncertainty_range: false,
            answer_value: None,
            assets: StimulusLookup::new("stimuli", "jpg"),
        }
    }
}

impl SessionConfig {
    /// Wheel preset mirroring the grid-oriented [`Default`] configuration.
    pub fn wheel_default() -> Self {
        Self {
            surface: SurfaceSpec::circle(400, 2),
            space: SpaceSpec::Angular { step_size: 1, random_rotation: false },
            indicator: IndicatorSpec::default(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(ConfigError::ZeroSurface);
        }
        match self.space {
            SpaceSpec::Grid { horizontal_step_size, vertical_step_size } => {
                if horizontal_step_size == 0 || vertical_step_size == 0 {
                    return Err(ConfigError::ZeroGridStep);
                }
            }
            SpaceSpec::Angular { step_size, .. } => {
                if step_size == 0 || step_size > 360 {
                    return Err(ConfigError::BadAngularStep(step_size));
                }
            }
        }
        if self.assets.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyAssetPath);
        }
        Ok(())
    }
}
