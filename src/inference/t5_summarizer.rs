use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Tensor};
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::{argmax, loader, GenerationParams, Summarizer};

/// Encoder-decoder summarizer on a T5 checkpoint with greedy decoding.
pub struct T5Summarizer {
    // decoding mutates the KV cache
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    prefix: String,
    max_input_tokens: usize,
    decoder_start_token_id: u32,
    eos_token_id: u32,
    use_cache: bool,
}

impl T5Summarizer {
    pub fn load(model: &str, device: &Device, prefix: &str, max_input_tokens: usize) -> Result<Self> {
        let files = loader::resolve_model(model)?;
        let tokenizer = loader::load_tokenizer(&files.tokenizer)?;

        let config: T5Config = loader::load_config(&files.config)?;

        let vb = loader::var_builder(&files.weights, device)?;
        let t5 = T5ForConditionalGeneration::load(vb, &config)
            .with_context(|| format!("failed to load summarizer {model}"))?;

        info!(
            model,
            max_input_tokens,
            use_cache = config.use_cache,
            "🟩 summarizer loaded on {device:?}"
        );

        Ok(Self {
            model: Mutex::new(t5),
            tokenizer,
            device: device.clone(),
            prefix: prefix.to_string(),
            max_input_tokens,
            decoder_start_token_id: config
                .decoder_start_token_id
                .unwrap_or(config.pad_token_id) as u32,
            eos_token_id: config.eos_token_id as u32,
            use_cache: config.use_cache,
        })
    }

    fn encode_input(&self, text: &str) -> Result<Vec<u32>> {
        let prompt = format!("{}{}", self.prefix, text);
        let enc = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;
        let mut ids = enc.get_ids().to_vec();
        if ids.len() > self.max_input_tokens {
            ids.truncate(self.max_input_tokens);
            if let Some(last) = ids.last_mut() {
                *last = self.eos_token_id;
            }
        }
        Ok(ids)
    }

    fn generate(&self, input_ids: &[u32], params: &GenerationParams) -> Result<Vec<u32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("summarizer model lock poisoned"))?;
        model.clear_kv_cache();

        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let mut tokens = vec![self.decoder_start_token_id];
        let mut generated = Vec::with_capacity(params.max_length);
        while generated.len() < params.max_length {
            let step_ids = decoder_step_ids(&tokens, generated.is_empty(), self.use_cache);
            let decoder_input = Tensor::new(step_ids, &self.device)?.unsqueeze(0)?;
            let logits = model
                .decode(&decoder_input, &encoder_output)?
                .squeeze(0)?
                .to_dtype(DType::F32)?
                .to_vec1::<f32>()?;

            let next = next_token(logits, self.eos_token_id, generated.len() < params.min_length)?;
            if next == self.eos_token_id {
                break;
            }
            tokens.push(next);
            generated.push(next);
        }
        model.clear_kv_cache();

        Ok(generated)
    }
}

impl Summarizer for T5Summarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String> {
        let input_ids = self.encode_input(text)?;
        let generated = self.generate(&input_ids, params)?;
        debug!(
            input_tokens = input_ids.len(),
            output_tokens = generated.len(),
            "summary decoded"
        );
        let summary = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("Tokenizer decode error: {e}"))?;
        Ok(summary.trim().to_string())
    }
}

/// With a KV cache only the newest token is fed after the first step; without
/// one the decoder re-reads the whole prefix.
fn decoder_step_ids(tokens: &[u32], first_step: bool, use_cache: bool) -> &[u32] {
    if first_step || !use_cache {
        tokens
    } else {
        &tokens[tokens.len().saturating_sub(1)..]
    }
}

/// Greedy pick; EOS is suppressed while the summary is below its minimum length.
fn next_token(mut logits: Vec<f32>, eos_token_id: u32, suppress_eos: bool) -> Result<u32> {
    if suppress_eos {
        if let Some(eos) = logits.get_mut(eos_token_id as usize) {
            *eos = f32::NEG_INFINITY;
        }
    }
    Ok(argmax(&logits)? as u32)
}
