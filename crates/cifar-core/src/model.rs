use std::collections::HashMap;

pub trait Model: Send + Sync {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Runs the model in inference mode.
    fn forward(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tags: Vec<String>,
    pub custom: HashMap<String, String>,
}

/// Name and shape of one tensor a model expects to find in its saved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub shape: &'static [usize],
}

impl ParamSpec {
    pub const fn new(name: &'static str, shape: &'static [usize]) -> Self {
        Self { name, shape }
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

pub fn parameter_count(specs: &[ParamSpec]) -> usize {
    specs.iter().map(ParamSpec::numel).sum()
}
