#![allow(dead_code)]

use candle_core::{Device, Tensor};
use cifar_candle::{CifarNet, StateDict};
use cifar_core::{ImageBatch, ScoreRequest};
use std::io::Write;
use std::path::Path;

/// Stride and scale per parameter. The golden scores in the tests were
/// computed offline from exactly these values.
const PATTERN: [(&str, usize, f32); 12] = [
    ("conv1.weight", 3, 0.02),
    ("conv1.bias", 5, 0.01),
    ("conv2.weight", 7, 0.01),
    ("conv2.bias", 11, 0.01),
    ("conv3.weight", 13, 0.01),
    ("conv3.bias", 3, 0.01),
    ("fc1.weight", 5, 0.005),
    ("fc1.bias", 7, 0.01),
    ("fc2.weight", 11, 0.02),
    ("fc2.bias", 13, 0.01),
    ("fc3.weight", 3, 0.03),
    ("fc3.bias", 5, 0.05),
];

pub const IMAGE_LEN: usize = 3 * 32 * 32;

pub fn patterned(shape: &[usize], stride: usize, scale: f32) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<f32> = (0..n)
        .map(|i| (((i * stride) % 17) as f32 - 8.0) * scale)
        .collect();
    Tensor::from_vec(data, shape, &Device::Cpu).unwrap()
}

/// A state dict with every parameter the network expects, filled with a
/// fixed pattern.
pub fn fixture_state() -> StateDict {
    let mut state = StateDict::new();
    for spec in CifarNet::PARAMETERS {
        let (_, stride, scale) = PATTERN
            .iter()
            .find(|(name, _, _)| *name == spec.name)
            .copied()
            .unwrap();
        state.insert(spec.name, patterned(spec.shape, stride, scale));
    }
    state
}

pub fn write_weights(dir: &Path, state: &StateDict) {
    state
        .save_safetensors(&dir.join(cifar_engine::WEIGHTS_FILE_NAME))
        .unwrap();
}

/// Pickle opcodes, written the way `torch.save` lays out a state dict.
#[derive(Default)]
struct Pickle(Vec<u8>);

impl Pickle {
    fn op(&mut self, op: u8) -> &mut Self {
        self.0.push(op);
        self
    }

    fn global(&mut self, module: &str, name: &str) -> &mut Self {
        self.op(b'c');
        self.0.extend_from_slice(format!("{}\n{}\n", module, name).as_bytes());
        self
    }

    fn unicode(&mut self, text: &str) -> &mut Self {
        self.op(b'X');
        self.0.extend_from_slice(&(text.len() as u32).to_le_bytes());
        self.0.extend_from_slice(text.as_bytes());
        self
    }

    fn int(&mut self, value: usize) -> &mut Self {
        self.op(b'J');
        self.0.extend_from_slice(&(value as i32).to_le_bytes());
        self
    }

    fn ints(&mut self, values: &[usize]) -> &mut Self {
        self.op(b'(');
        for &value in values {
            self.int(value);
        }
        self.op(b't')
    }

    fn empty_ordered_dict(&mut self) -> &mut Self {
        self.global("collections", "OrderedDict").op(b')').op(b'R')
    }

    /// `torch._utils._rebuild_tensor_v2(storage, 0, size, stride, False, OrderedDict())`
    fn float_tensor(&mut self, storage_key: &str, dims: &[usize]) -> &mut Self {
        let mut strides = vec![1; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }
        let numel = dims.iter().product();

        self.global("torch._utils", "_rebuild_tensor_v2").op(b'(');
        self.op(b'(')
            .unicode("storage")
            .global("torch", "FloatStorage")
            .unicode(storage_key)
            .unicode("cpu")
            .int(numel)
            .op(b't')
            .op(b'Q');
        self.int(0).ints(dims).ints(&strides).op(0x89);
        self.empty_ordered_dict().op(b't').op(b'R')
    }
}

/// Writes every network parameter of `state` as a `torch.save` zip archive.
pub fn write_torch_archive(path: &Path, state: &StateDict) {
    let mut pickle = Pickle::default();
    pickle.op(0x80).op(2).empty_ordered_dict().op(b'(');

    let mut storages = Vec::new();
    for (key, spec) in CifarNet::PARAMETERS.iter().enumerate() {
        let tensor = state.get(spec.name).unwrap();
        let key = key.to_string();
        pickle.unicode(spec.name).float_tensor(&key, tensor.dims());
        let data = tensor.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        storages.push((key, data));
    }
    pickle.op(b'u').op(b'.');

    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    let mut archive = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    archive.start_file("archive/data.pkl", options).unwrap();
    archive.write_all(&pickle.0).unwrap();
    archive.start_file("archive/byteorder", options).unwrap();
    archive.write_all(b"little").unwrap();
    for (key, data) in storages {
        archive
            .start_file(format!("archive/data/{}", key), options)
            .unwrap();
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        archive.write_all(&bytes).unwrap();
    }
    archive.start_file("archive/version", options).unwrap();
    archive.write_all(b"3\n").unwrap();
    archive.finish().unwrap();
}

pub fn model_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_weights(dir.path(), &fixture_state());
    dir
}

pub fn zeros_image() -> Vec<f32> {
    vec![0.0; IMAGE_LEN]
}

pub fn ramp_image() -> Vec<f32> {
    (0..IMAGE_LEN).map(|i| ((i * 5) % 11) as f32 / 10.0).collect()
}

/// Request body for a batch of `(3, 32, 32)` images.
pub fn request_for(images: &[Vec<f32>]) -> String {
    let data: Vec<f32> = images.concat();
    let batch = ImageBatch::new(data, vec![images.len(), 3, 32, 32]).unwrap();
    ScoreRequest::from_batch(&batch).to_json_string().unwrap()
}
