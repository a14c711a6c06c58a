use cifar_core::ScoreError;
use std::path::PathBuf;

/// Directory the deployment mounts the model artifacts into.
pub const MODEL_DIR_ENV: &str = "AZUREML_MODEL_DIR";

pub const WEIGHTS_FILE_NAME: &str = "cifar_net.pt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_dir: PathBuf,
    pub weights_file: String,
}

impl EngineConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            weights_file: WEIGHTS_FILE_NAME.to_string(),
        }
    }

    pub fn from_env<E: std::error::Error>() -> Result<Self, ScoreError<E>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`], reading variables through `lookup`.
    /// An empty value counts as unset.
    pub fn from_lookup<E, F>(lookup: F) -> Result<Self, ScoreError<E>>
    where
        E: std::error::Error,
        F: Fn(&str) -> Option<String>,
    {
        let model_dir = lookup(MODEL_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| ScoreError::MissingEnv(MODEL_DIR_ENV.to_string()))?;
        Ok(Self::new(model_dir))
    }

    pub fn with_weights_file(mut self, file_name: impl Into<String>) -> Self {
        self.weights_file = file_name.into();
        self
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join(&self.weights_file)
    }
}
