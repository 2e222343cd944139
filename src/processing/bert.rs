//! Sentence embeddings from a BERT encoder (all-MiniLM-L6-v2 family) using Candle

use crate::error::{Result, ResumeRankerError};
use crate::processing::embeddings::{Embedder, EmbeddingVector};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
    hidden_size: usize,
}

#[derive(Deserialize)]
struct EncoderShape {
    hidden_size: usize,
}

/// Pick the best available device for the enabled cargo features.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Device: Metal");
            return device;
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Device: CUDA");
            return device;
        }
    }
    debug!("Device: CPU");
    Device::Cpu
}

impl BertEmbedder {
    /// Load `config.json`, `tokenizer.json` and `model.safetensors` from `model_dir`.
    pub fn load(model_dir: &Path, model_name: &str, max_sequence_length: usize) -> Result<Self> {
        let start_time = Instant::now();
        let unavailable = |what: &str, e: &dyn std::fmt::Display| {
            ResumeRankerError::ModelUnavailable(format!(
                "Failed to load {} for '{}' from {}: {}",
                what,
                model_name,
                model_dir.display(),
                e
            ))
        };

        let config_path = model_dir.join("config.json");
        let config_json = std::fs::read_to_string(&config_path).map_err(|e| unavailable("config.json", &e))?;
        let config: BertConfig = serde_json::from_str(&config_json).map_err(|e| unavailable("config.json", &e))?;
        let shape: EncoderShape = serde_json::from_str(&config_json).map_err(|e| unavailable("config.json", &e))?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| unavailable("tokenizer.json", &e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| unavailable("tokenizer truncation", &e))?;
        tokenizer.with_padding(None);

        let device = select_device();
        let weights = std::fs::read(model_dir.join("model.safetensors"))
            .map_err(|e| unavailable("model.safetensors", &e))?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DTYPE, &device)
            .map_err(|e| unavailable("model.safetensors", &e))?;
        let model = BertModel::load(vb, &config).map_err(|e| unavailable("BERT weights", &e))?;

        info!("Loaded embedding model {} in {:.2?}", model_name, start_time.elapsed());

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: model_name.to_string(),
            hidden_size: shape.hidden_size,
        })
    }

    fn embed_one(&self, text: &str) -> Result<EmbeddingVector> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ResumeRankerError::Embedding(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;

        let values: Vec<f32> = pooled
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_device(&Device::Cpu)?
            .to_vec1()?;
        Ok(EmbeddingVector::new(values))
    }
}

impl Embedder for BertEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.hidden_size)
    }
}

/// Mean of the unmasked token states, L2-normalized. `hidden` is `[B, T, H]`,
/// `attention_mask` is `[B, T]`; the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask
        .to_device(hidden.device())?
        .to_dtype(hidden.dtype())?
        .unsqueeze(2)?;

    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1e-9)?;
    let mean = summed.broadcast_div(&counts)?;

    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12)?;
    Ok(mean.broadcast_div(&norm)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_mean_l2_ignores_padding() {
        let device = Device::Cpu;
        // Two tokens with hidden dim 4; the second token is padding.
        let hidden = Tensor::from_slice(
            &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            (1, 2, 4),
            &device,
        )
        .unwrap();
        let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), &device).unwrap();

        let pooled: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();

        let norm = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
        let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
        for (a, b) in pooled[0].iter().zip(expected) {
            assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
        }
    }

    #[test]
    fn test_masked_mean_l2_averages_tokens() {
        let device = Device::Cpu;
        let hidden = Tensor::from_slice(&[1.0f32, 0.0, 3.0, 0.0], (1, 2, 2), &device).unwrap();
        let mask = Tensor::from_slice(&[1u32, 1u32], (1, 2), &device).unwrap();

        let pooled: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();
        assert!((pooled[0][0] - 1.0).abs() < 1e-6);
        assert!(pooled[0][1].abs() < 1e-6);
    }

    #[test]
    fn test_missing_model_dir_is_unavailable() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = BertEmbedder::load(temp_dir.path(), "all-MiniLM-L6-v2", 256);
        assert!(matches!(result, Err(ResumeRankerError::ModelUnavailable(_))));
    }
}
