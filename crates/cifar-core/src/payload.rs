use crate::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a scoring request: `{"data": <nested numeric array>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub data: Value,
}

impl ScoreRequest {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn from_batch(batch: &ImageBatch) -> Self {
        Self::new(batch.to_json())
    }

    /// Parses a request body. Extra keys are ignored.
    pub fn parse(input: &str) -> Result<Self, RequestError> {
        let mut body: Value = serde_json::from_str(input)?;
        let data = body
            .get_mut("data")
            .map(Value::take)
            .ok_or(RequestError::MissingData)?;
        Ok(Self { data })
    }

    pub fn to_json_string(&self) -> Result<String, RequestError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn into_batch(self) -> Result<ImageBatch, RequestError> {
        ImageBatch::from_json(&self.data)
    }
}

/// A dense, row-major block of pixel values together with its shape.
///
/// Nothing here checks that the shape is a valid image batch; that is left to
/// the network, which rejects shapes it cannot consume.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl ImageBatch {
    /// Returns `None` when `data` does not hold exactly the number of values
    /// `shape` describes.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Option<Self> {
        if data.len() != shape.iter().product::<usize>() {
            return None;
        }
        Some(Self { shape, data })
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        let shape = infer_shape(value);
        let mut data = Vec::with_capacity(shape.iter().product());
        flatten_into(value, 0, &shape, &mut data)?;
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn into_parts(self) -> (Vec<f32>, Vec<usize>) {
        (self.data, self.shape)
    }

    /// Rebuilds the nested array form used in request bodies.
    pub fn to_json(&self) -> Value {
        nest(&self.data, &self.shape)
    }
}

fn infer_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = value;
    while let Value::Array(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

fn flatten_into(
    value: &Value,
    depth: usize,
    shape: &[usize],
    out: &mut Vec<f32>,
) -> Result<(), RequestError> {
    if depth == shape.len() {
        return match value {
            // Integer pixels are widened too, so an all-integer batch scores
            // like its float spelling instead of being rejected by the convs.
            Value::Number(n) => {
                let v = n.as_f64().ok_or(RequestError::NonNumeric {
                    depth,
                    found: "number",
                })?;
                out.push(v as f32);
                Ok(())
            }
            other => Err(RequestError::NonNumeric {
                depth,
                found: kind(other),
            }),
        };
    }

    match value {
        Value::Array(items) => {
            if items.len() != shape[depth] {
                return Err(RequestError::Ragged {
                    depth,
                    expected: shape[depth],
                    found: items.len(),
                });
            }
            for item in items {
                flatten_into(item, depth + 1, shape, out)?;
            }
            Ok(())
        }
        Value::Number(_) => Err(RequestError::Ragged {
            depth,
            expected: shape[depth],
            found: 0,
        }),
        other => Err(RequestError::NonNumeric {
            depth,
            found: kind(other),
        }),
    }
}

fn nest(data: &[f32], shape: &[usize]) -> Value {
    match shape.split_first() {
        None => data.first().map(|&v| Value::from(v)).unwrap_or(Value::Null),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            let items = (0..len)
                .map(|i| nest(&data[i * stride..(i + 1) * stride], rest))
                .collect();
            Value::Array(items)
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
