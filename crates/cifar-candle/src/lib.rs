mod backend;
mod net;
mod weights;

pub use backend::CandleBackend;
pub use net::{class_probabilities, top_classes, CifarNet};
pub use weights::{Error, StateDict, WeightFormat};
