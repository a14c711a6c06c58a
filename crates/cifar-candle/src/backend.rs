use candle_core::{Device, Tensor};
use cifar_core::ImageBatch;

/// CPU-only candle backend. Accelerators are never selected, so scores do
/// not depend on the hardware the service lands on.
#[derive(Clone)]
pub struct CandleBackend {
    device: Device,
}

impl CandleBackend {
    pub fn cpu() -> Self {
        Self {
            device: Device::Cpu,
        }
    }

    pub fn name(&self) -> &str {
        "candle"
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Builds the network input from a parsed batch. A rank-3 `(C, H, W)`
    /// block is treated as a batch of one image.
    pub fn input_tensor(&self, batch: ImageBatch) -> Result<Tensor, candle_core::Error> {
        let (data, shape) = batch.into_parts();
        let tensor = Tensor::from_vec(data, shape, &self.device)?;
        if tensor.rank() == 3 {
            tensor.unsqueeze(0)
        } else {
            Ok(tensor)
        }
    }
}

impl Default for CandleBackend {
    fn default() -> Self {
        Self::cpu()
    }
}
