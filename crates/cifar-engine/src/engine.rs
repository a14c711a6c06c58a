use crate::EngineConfig;
use candle_core::Tensor;
use cifar_candle::{class_probabilities, top_classes, CandleBackend, CifarNet, StateDict};
use cifar_core::{CifarClass, ImageBatch, Model, ModelMetadata, Prediction, ScoreError, ScoreRequest};

pub type Error = ScoreError<candle_core::Error>;
pub type Result<T> = std::result::Result<T, Error>;

/// A loaded network, ready to answer requests.
///
/// Parameters are immutable after construction, so `run` only needs `&self`
/// and one engine can be shared between threads.
pub struct ScoringEngine {
    backend: CandleBackend,
    model: CifarNet,
    config: EngineConfig,
}

impl ScoringEngine {
    /// Loads the weights named by `AZUREML_MODEL_DIR`.
    pub fn init() -> Result<Self> {
        Self::with_config(EngineConfig::from_env::<candle_core::Error>()?)
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let backend = CandleBackend::cpu();
        let path = config.weights_path();
        log::info!("loading weights from {}", path.display());

        let state = StateDict::load(&path, backend.device())?;
        state.verify(&CifarNet::PARAMETERS)?;
        let vb = state.into_var_builder(backend.device());
        let model = CifarNet::new("cifar_net", vb).map_err(ScoreError::Backend)?;

        let metadata = model.metadata();
        log::info!(
            "{} ready on {} backend: {}",
            metadata.name,
            backend.name(),
            metadata.description
        );

        Ok(Self {
            backend,
            model,
            config,
        })
    }

    /// Scores one JSON request body.
    pub fn run(&self, input_data: &str) -> Result<Prediction> {
        let batch = ScoreRequest::parse(input_data)?.into_batch()?;
        self.classify(batch)
    }

    /// Classifies a parsed batch, reporting only the first image.
    ///
    /// Probabilities and arg-max are computed for every row, but the result
    /// is built from row 0 alone; later images in the batch are scored and
    /// then dropped.
    pub fn classify(&self, batch: ImageBatch) -> Result<Prediction> {
        let scores = self.scores(batch)?;
        log::debug!("scores: {}", scores);

        let indices = top_classes(&scores).map_err(ScoreError::Backend)?;
        log::debug!("predicted indices: {:?}", indices);

        let index = *indices.first().ok_or_else(|| {
            ScoreError::Backend(candle_core::Error::Msg("empty batch".to_string()))
        })? as usize;

        let probability = class_probabilities(&scores)
            .and_then(|probs| probs.get(0)?.get(index)?.to_scalar::<f32>())
            .map_err(ScoreError::Backend)?;

        let class = CifarClass::from_index(index).ok_or_else(|| {
            ScoreError::Backend(candle_core::Error::Msg(format!(
                "class index {} out of range",
                index
            )))
        })?;

        Ok(Prediction::new(class, probability))
    }

    /// Raw `(N, 10)` class scores for a batch.
    pub fn scores(&self, batch: ImageBatch) -> Result<Tensor> {
        let input = self
            .backend
            .input_tensor(batch)
            .map_err(ScoreError::Backend)?;
        self.model.forward(input).map_err(ScoreError::Backend)
    }

    pub fn metadata(&self) -> ModelMetadata {
        self.model.metadata()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &CandleBackend {
        &self.backend
    }
}

/// Loads the model once at process start.
pub fn init() -> Result<ScoringEngine> {
    ScoringEngine::init()
}

/// Answers one request against an engine returned by [`init`].
pub fn run(engine: &ScoringEngine, input_data: &str) -> Result<Prediction> {
    engine.run(input_data)
}
