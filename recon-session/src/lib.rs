pub mod config;
pub mod session;

pub use config::{ConfigError, IndicatorSpec, SessionConfig, SpaceSpec, SurfaceSpec};
pub use session::{InteractionSession, SessionEvent, SessionState};
