//! Sentence embeddings and cosine similarity.
//!
//! The default encoder is a feature-extraction pipeline served over HTTP
//! (see [`crate::models::PipelineModel`]). With the `candle` feature a
//! sentence-transformers BERT model runs in-process instead.

use crate::error::Result;
use async_trait::async_trait;

/// Turns texts into fixed-size vectors, one per input, in input order.
#[async_trait]
pub trait SentenceEncoder: Send + Sync {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(feature = "candle")]
pub use bert::BertSentenceEncoder;

#[cfg(feature = "candle")]
mod bert {
    use super::SentenceEncoder;
    use crate::error::{AssistantError, Result};
    use async_trait::async_trait;
    use candle_core::{Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
    use hf_hub::{Repo, RepoType, api::sync::Api};
    use tokenizers::Tokenizer;

    fn model_err(context: &str, err: impl std::fmt::Display) -> AssistantError {
        AssistantError::ModelInvocation(format!("{}: {}", context, err))
    }

    /// In-process sentence-transformers encoder (mean pooling, L2 normalised).
    pub struct BertSentenceEncoder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
    }

    impl BertSentenceEncoder {
        /// Download (or reuse the hub cache) and load a model. Blocking.
        pub fn load(model_id: &str) -> Result<Self> {
            let device = Device::Cpu;

            let api = Api::new().map_err(|e| model_err("Failed to create HF Hub API", e))?;
            let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

            let config_path = repo
                .get("config.json")
                .map_err(|e| model_err("Failed to get config.json", e))?;
            let tokenizer_path = repo
                .get("tokenizer.json")
                .map_err(|e| model_err("Failed to get tokenizer.json", e))?;
            let weights_path = repo
                .get("model.safetensors")
                .map_err(|e| model_err("Failed to get model weights", e))?;

            let raw_config = std::fs::read_to_string(&config_path)
                .map_err(|e| AssistantError::io(&config_path, e))?;
            let config: BertConfig = serde_json::from_str(&raw_config)
                .map_err(|e| model_err("Failed to parse model config", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| model_err("Failed to load tokenizer", e))?;

            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                    .map_err(|e| model_err("Failed to load model weights", e))?
            };
            let model =
                BertModel::load(vb, &config).map_err(|e| model_err("Failed to load BERT model", e))?;

            Ok(Self {
                model,
                tokenizer,
                device,
            })
        }

        fn embed_batch(&self, texts: &[String]) -> candle_core::Result<Vec<Vec<f32>>> {
            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| candle_core::Error::Msg(format!("Tokenization failed: {}", e)))?;

            let max_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut input_ids = Vec::with_capacity(texts.len() * max_len);
            let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

            for encoding in &encodings {
                let mut ids = encoding.get_ids().to_vec();
                let mut mask = encoding.get_attention_mask().to_vec();
                ids.resize(max_len, 0);
                mask.resize(max_len, 0);
                input_ids.extend(ids);
                attention_mask.extend(mask);
            }

            let shape = (texts.len(), max_len);
            let input_ids = Tensor::from_vec(input_ids, shape, &self.device)?;
            let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;

            let output = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

            // Mean pooling over the sequence, ignoring padding.
            let mask = attention_mask
                .unsqueeze(2)?
                .to_dtype(output.dtype())?
                .broadcast_as(output.shape())?;
            let summed = (output * &mask)?.sum(1)?;
            let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
            let pooled = (summed / counts)?;

            let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            let normalized = pooled.broadcast_div(&norms)?;

            normalized.to_vec2::<f32>()
        }
    }

    #[async_trait]
    impl SentenceEncoder for BertSentenceEncoder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.embed_batch(texts)
                .map_err(|e| model_err("Embedding failed", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
