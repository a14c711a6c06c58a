use crate::CifarClass;
use serde::{Deserialize, Serialize};

/// Result of one `run` call: `{"label": "cat", "probability": "0.87"}`.
///
/// The probability is carried as a string to keep the response shape the
/// hosting layer already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: String,
}

impl Prediction {
    pub fn new(class: CifarClass, probability: f32) -> Self {
        Self {
            label: class.as_str().to_string(),
            probability: probability.to_string(),
        }
    }

    pub fn class(&self) -> Option<CifarClass> {
        self.label.parse().ok()
    }

    pub fn probability_value(&self) -> Option<f32> {
        self.probability.parse().ok()
    }
}
