pub mod config;
pub mod error;
pub mod random;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
