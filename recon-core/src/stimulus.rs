use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// Resolves parameter values to stimulus asset files.
///
/// Assets are named by the six-digit identifier, so the out-of-space sentinel
/// resolves to the neutral `999999` placeholder like any other value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusLookup {
    /// Directory holding the stimulus images.
    pub path: PathBuf,
    /// File extension without the dot, e.g. `jpg` or `png`.
    pub format: String,
}

impl StimulusLookup {
    pub fn new(path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self { path: path.into(), format: format.into() }
    }

    pub fn asset_for(&self, value: ParamValue) -> PathBuf {
        self.path.join(format!("{}.{}", value.identifier(), self.format))
    }
}
