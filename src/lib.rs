pub mod android_jni;
pub mod config;
pub mod direction;
pub mod elevation;
pub mod error;
pub mod export;
pub mod geomath;
pub mod gpx;
pub mod segments;
pub mod session;
pub mod track;

pub use config::AnalysisConfig;
pub use error::{EngineError, Result};
pub use session::Session;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
