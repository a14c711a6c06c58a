use candle_core::{Module, ModuleT, Tensor, D};
use candle_nn::{Conv2d, Conv2dConfig, Dropout, Linear, VarBuilder};
use cifar_core::{parameter_count, Model, ModelMetadata, ParamSpec};

/// Three conv stages, two hidden linear layers, ten class scores.
///
/// Expects `(N, 3, 32, 32)` input; two rounds of 2x2 pooling leave a
/// `128 x 6 x 6` feature map per image.
pub struct CifarNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    dropout: Dropout,
    name: String,
}

impl CifarNet {
    pub const IN_CHANNELS: usize = 3;
    pub const FLATTENED: usize = 128 * 6 * 6;
    pub const NUM_CLASSES: usize = 10;
    pub const DROPOUT: f32 = 0.2;

    /// Every tensor a saved state dict must hold, named as `torch.save`
    /// writes them for this topology.
    pub const PARAMETERS: [ParamSpec; 12] = [
        ParamSpec::new("conv1.weight", &[32, 3, 3, 3]),
        ParamSpec::new("conv1.bias", &[32]),
        ParamSpec::new("conv2.weight", &[64, 32, 3, 3]),
        ParamSpec::new("conv2.bias", &[64]),
        ParamSpec::new("conv3.weight", &[128, 64, 3, 3]),
        ParamSpec::new("conv3.bias", &[128]),
        ParamSpec::new("fc1.weight", &[120, 4608]),
        ParamSpec::new("fc1.bias", &[120]),
        ParamSpec::new("fc2.weight", &[84, 120]),
        ParamSpec::new("fc2.bias", &[84]),
        ParamSpec::new("fc3.weight", &[10, 84]),
        ParamSpec::new("fc3.bias", &[10]),
    ];

    pub fn new(name: &str, vb: VarBuilder) -> Result<Self, candle_core::Error> {
        let cfg = Conv2dConfig::default();
        Ok(Self {
            conv1: candle_nn::conv2d(Self::IN_CHANNELS, 32, 3, cfg, vb.pp("conv1"))?,
            conv2: candle_nn::conv2d(32, 64, 3, cfg, vb.pp("conv2"))?,
            conv3: candle_nn::conv2d(64, 128, 3, cfg, vb.pp("conv3"))?,
            fc1: candle_nn::linear(Self::FLATTENED, 120, vb.pp("fc1"))?,
            fc2: candle_nn::linear(120, 84, vb.pp("fc2"))?,
            fc3: candle_nn::linear(84, Self::NUM_CLASSES, vb.pp("fc3"))?,
            dropout: Dropout::new(Self::DROPOUT),
            name: name.to_string(),
        })
    }

    pub fn parameter_count() -> usize {
        parameter_count(&Self::PARAMETERS)
    }
}

impl ModuleT for CifarNet {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor, candle_core::Error> {
        let x = self.conv1.forward(xs)?.relu()?;
        let x = self.conv2.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv3.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = x.flatten_from(1)?;
        let x = self.fc1.forward(&x)?.relu()?;
        let x = self.dropout.forward_t(&x, train)?;
        let x = self.fc2.forward(&x)?.relu()?;
        self.fc3.forward(&x)
    }
}

impl Model for CifarNet {
    type Input = Tensor;
    type Output = Tensor;
    type Error = candle_core::Error;

    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.forward_t(&input, false)
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            name: self.name.clone(),
            version: "1.0.0".to_string(),
            description: format!(
                "CIFAR-10 convnet (3x32x32 -> {} features -> 120 -> 84 -> {}), {} parameters",
                Self::FLATTENED,
                Self::NUM_CLASSES,
                Self::parameter_count()
            ),
            tags: vec!["vision".to_string(), "classification".to_string()],
            custom: Default::default(),
        }
    }
}

/// Softmax over the class dimension of an `(N, classes)` score matrix.
pub fn class_probabilities(scores: &Tensor) -> Result<Tensor, candle_core::Error> {
    candle_nn::ops::softmax(scores, D::Minus1)
}

/// Index of the highest score in each row.
pub fn top_classes(scores: &Tensor) -> Result<Vec<u32>, candle_core::Error> {
    scores.argmax(D::Minus1)?.to_vec1::<u32>()
}
