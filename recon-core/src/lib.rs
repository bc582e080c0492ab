pub mod geometry;
pub mod mapper;
pub mod record;
pub mod stimulus;
pub mod surface;
pub mod value;

pub use geometry::{LocalPoint, SurfaceFrame, SurfaceShape};
pub use mapper::{
    AngularMapper, Candidate, CoordinateMapper, Extent, GridMapper, MarkPlacement, PointerSample,
};
pub use record::{ResponseRecord, ResponseRecordBuilder};
pub use stimulus::StimulusLookup;
pub use surface::{Color, ResponseSurface};
pub use value::{OUT_OF_SPACE_ID, ParamValue};
