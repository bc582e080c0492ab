use serde::{Deserialize, Serialize};

use crate::geometry::LocalPoint;
use crate::mapper::Extent;

/// Finalized per-session response data, handed to the trial-lifecycle owner
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Committed parameter value as its zero-padded identifier.
    pub response: String,
    /// Milliseconds from session start to the first confirm.
    pub search_rt_ms: f64,
    /// Surface-local pointer position at the first confirm.
    pub commit_point: LocalPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty_extent: Option<Extent>,
    /// Milliseconds from the first confirm to the second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty_rt_ms: Option<f64>,
    /// The session's random wheel rotation, kept for later de-rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_offset: Option<f64>,
}

/// Accumulates record fields as the session advances.
///
/// Starts empty and is consumed at finalization, so a half-built record can
/// never reach the collaborator.
#[derive(Debug, Clone, Default)]
pub struct ResponseRecordBuilder {
    response: Option<String>,
    search_rt_ms: Option<f64>,
    commit_point: Option<LocalPoint>,
    uncertainty_extent: Option<Extent>,
    uncertainty_rt_ms: Option<f64>,
    rotation_offset: Option<f64>,
}

impl ResponseRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the searched value and its reaction time.
    pub fn commit(&mut self, response: String, search_rt_ms: f64, commit_point: LocalPoint) {
        self.response = Some(response);
        self.search_rt_ms = Some(search_rt_ms);
        self.commit_point = Some(commit_point);
    }

    /// Freeze the uncertainty extent and its reaction time.
    pub fn range(&mut self, extent: Extent, rt_ms: f64) {
        self.uncertainty_extent = Some(extent);
        self.uncertainty_rt_ms = Some(rt_ms);
    }

    pub fn set_rotation_offset(&mut self, offset: f64) {
        self.rotation_offset = Some(offset);
    }

    /// Convert into the immutable record. `None` until a commit has landed.
    pub fn finalize(self) -> Option<ResponseRecord> {
        Some(ResponseRecord {
            response: self.response?,
            search_rt_ms: self.search_rt_ms?,
            commit_point: self.commit_point?,
            uncertainty_extent: self.uncertainty_extent,
            uncertainty_rt_ms: self.uncertainty_rt_ms,
            rotation_offset: self.rotation_offset,
        })
    }
}
