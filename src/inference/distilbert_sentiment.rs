use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{linear, Linear};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use serde::Deserialize;
use std::collections::BTreeMap;
use tokenizers::Tokenizer;
use tracing::info;

use super::{loader, SequenceClassifier};

/// Head shape and class names, read from the same `config.json` as the backbone.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    dim: usize,
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// DistilBERT with a sequence-classification head (`pre_classifier` → ReLU →
/// `classifier`), as exported by `DistilBertForSequenceClassification`.
pub struct DistilBertSentiment {
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    id2label: Vec<String>,
}

impl DistilBertSentiment {
    pub fn load(model: &str, device: &Device, max_len: usize) -> Result<Self> {
        let files = loader::resolve_model(model)?;
        let tokenizer = loader::load_tokenizer(&files.tokenizer)?;

        let config: DistilBertConfig = loader::load_config(&files.config)?;
        let head: HeadConfig = loader::load_config(&files.config)?;
        let id2label = ordered_labels(head.id2label);
        let num_labels = id2label.len().max(2);

        let vb = loader::var_builder(&files.weights, device)?;
        let backbone = DistilBertModel::load(vb.pp("distilbert"), &config)
            .context("failed to load distilbert backbone")?;
        let pre_classifier = linear(head.dim, head.dim, vb.pp("pre_classifier"))?;
        let classifier = linear(head.dim, num_labels, vb.pp("classifier"))?;

        info!(
            model,
            num_labels,
            max_len,
            "🟦 sentiment classifier loaded on {device:?}"
        );

        Ok(Self {
            model: backbone,
            pre_classifier,
            classifier,
            tokenizer,
            device: device.clone(),
            max_len,
            id2label,
        })
    }

    /// Class names from the checkpoint's `id2label`, indexed by class id.
    /// Empty when the checkpoint does not ship a label table.
    pub fn id2label(&self) -> &[String] {
        &self.id2label
    }

    fn forward_logits(&self, text: &str) -> Result<Tensor> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;
        let mut ids = enc.get_ids().to_vec();
        if ids.len() > self.max_len {
            // Keep the trailing [SEP] so the truncated sequence stays well-formed.
            let sep = ids[ids.len() - 1];
            ids.truncate(self.max_len);
            ids[self.max_len - 1] = sep;
        }
        let seq_len = ids.len();

        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        // Non-zero entries are masked out; a single unpadded sequence masks nothing.
        let mask = Tensor::zeros((seq_len, seq_len), DType::U8, &self.device)?;
        let hidden = self.model.forward(&input, &mask)?;

        let cls = hidden.i((.., 0))?;
        let x = self.pre_classifier.forward(&cls)?.relu()?;
        Ok(self.classifier.forward(&x)?.squeeze(0)?)
    }
}

impl SequenceClassifier for DistilBertSentiment {
    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let logits = self.forward_logits(text)?;
        Ok(logits.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}

fn ordered_labels(table: BTreeMap<String, String>) -> Vec<String> {
    let mut pairs: Vec<(usize, String)> = table
        .into_iter()
        .filter_map(|(id, label)| id.parse::<usize>().ok().map(|id| (id, label)))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    pairs.into_iter().map(|(_, label)| label).collect()
}
