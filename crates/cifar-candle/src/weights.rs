use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use cifar_core::{ParamSpec, ScoreError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub type Error = ScoreError<candle_core::Error>;

/// On-disk encodings a state dict can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// `torch.save` output (a zip archive holding a pickled state dict).
    TorchZip,
    SafeTensors,
}

impl WeightFormat {
    const SNIFF_LEN: u64 = 9;

    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK\x03\x04") {
            return Some(WeightFormat::TorchZip);
        }
        // safetensors: u64 LE header length, then the JSON header itself.
        match header.get(8) {
            Some(b'{') => Some(WeightFormat::SafeTensors),
            _ => None,
        }
    }

    pub fn detect(path: &Path) -> std::io::Result<Option<Self>> {
        let mut header = Vec::with_capacity(Self::SNIFF_LEN as usize);
        File::open(path)?
            .take(Self::SNIFF_LEN)
            .read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

/// Named parameter tensors, as saved by the training side.
#[derive(Debug, Default)]
pub struct StateDict {
    tensors: HashMap<String, Tensor>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every tensor in `path` onto `device` as `f32`.
    pub fn load(path: &Path, device: &Device) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(ScoreError::WeightsNotFound(path.to_path_buf()));
        }

        let format = WeightFormat::detect(path)
            .map_err(|e| ScoreError::Backend(e.into()))?
            .ok_or_else(|| ScoreError::UnrecognizedWeights(path.to_path_buf()))?;
        log::debug!("reading {:?} weights from {}", format, path.display());

        let raw: HashMap<String, Tensor> = match format {
            WeightFormat::TorchZip => candle_core::pickle::read_all(path)
                .map_err(ScoreError::Backend)?
                .into_iter()
                .collect(),
            WeightFormat::SafeTensors => {
                candle_core::safetensors::load(path, device).map_err(ScoreError::Backend)?
            }
        };

        let tensors = raw
            .into_iter()
            .map(|(name, tensor)| -> Result<(String, Tensor), candle_core::Error> {
                let tensor = tensor.to_device(device)?.to_dtype(DType::F32)?;
                Ok((name, tensor))
            })
            .collect::<Result<HashMap<_, _>, candle_core::Error>>()
            .map_err(ScoreError::Backend)?;

        let dict = Self { tensors };
        // A pickle whose root is not a state dict reads back as zero tensors.
        if dict.is_empty() {
            return Err(ScoreError::UnrecognizedWeights(path.to_path_buf()));
        }
        log::debug!("read {} tensors", dict.len());
        Ok(dict)
    }

    pub fn save_safetensors(&self, path: &Path) -> Result<(), candle_core::Error> {
        candle_core::safetensors::save(&self.tensors, path)
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.tensors.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Checks that the saved names and shapes are exactly `expected`:
    /// nothing missing, nothing extra, every shape equal.
    pub fn verify(&self, expected: &[ParamSpec]) -> Result<(), Error> {
        let mut problems = Vec::new();

        for spec in expected {
            match self.tensors.get(spec.name) {
                None => problems.push(format!("missing `{}`", spec.name)),
                Some(tensor) if tensor.dims() != spec.shape => problems.push(format!(
                    "`{}` has shape {:?}, expected {:?}",
                    spec.name,
                    tensor.dims(),
                    spec.shape
                )),
                Some(_) => {}
            }
        }

        let mut unexpected: Vec<&str> = self
            .tensors
            .keys()
            .map(String::as_str)
            .filter(|name| !expected.iter().any(|spec| spec.name == *name))
            .collect();
        unexpected.sort_unstable();
        problems.extend(unexpected.into_iter().map(|name| format!("unexpected `{}`", name)));

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScoreError::WeightsMismatch(problems.join("; ")))
        }
    }

    pub fn into_var_builder(self, device: &Device) -> VarBuilder<'static> {
        VarBuilder::from_tensors(self.tensors, DType::F32, device)
    }
}
