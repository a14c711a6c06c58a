mod config;
mod engine;

pub use config::{EngineConfig, MODEL_DIR_ENV, WEIGHTS_FILE_NAME};
pub use engine::{init, run, Error, Result, ScoringEngine};
