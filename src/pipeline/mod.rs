/// Pipeline Module
///
/// Configuration, validation and the bar-by-bar engine tying allocation, anchoring,
/// accumulation and history together.
pub mod engine;
pub mod errors;
pub mod structs;

pub use engine::ProfileEngine;
pub use errors::ConfigError;
pub use structs::{BarOutput, ProfilerConfig};
