pub mod error;
pub mod labels;
pub mod model;
pub mod payload;
pub mod prediction;

pub use error::{RequestError, ScoreError};
pub use labels::{CifarClass, UnknownClass};
pub use model::{parameter_count, Model, ModelMetadata, ParamSpec};
pub use payload::{ImageBatch, ScoreRequest};
pub use prediction::Prediction;
