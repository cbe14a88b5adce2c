use anyhow::{anyhow, Context, Result};
use candle::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::{
    models::wordpiece::WordPiece,
    normalizers::{bert::BertNormalizer, NormalizerWrapper},
    pre_tokenizers::{bert::BertPreTokenizer, PreTokenizerWrapper},
    processors::{bert::BertProcessing, PostProcessorWrapper},
    Tokenizer,
};
use tracing::{info, warn};

const WEIGHT_CANDIDATES: &[&str] = &["model.safetensors", "pytorch_model.bin"];

/// Where a model's files live on disk.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: TokenizerSource,
    pub weights: PathBuf,
}

#[derive(Debug, Clone)]
pub enum TokenizerSource {
    Json(PathBuf),
    /// BERT-style `vocab.txt`, for older checkpoints without `tokenizer.json`.
    WordPieceVocab(PathBuf),
}

/// Resolves `model` either as a local snapshot directory or as a Hugging Face
/// repo id fetched into the local hub cache.
pub fn resolve_model(model: &str) -> Result<ModelFiles> {
    let local = Path::new(model);
    if local.is_dir() {
        info!(snapshot = %local.display(), "using local model snapshot");
        return local_files(local);
    }
    info!(repo = model, "fetching model from the hub");
    hub_files(model)
}

fn local_files(snapshot: &Path) -> Result<ModelFiles> {
    let config = snapshot.join("config.json");
    if !config.exists() {
        return Err(anyhow!(
            "config.json not found under {}",
            snapshot.display()
        ));
    }

    let tokenizer = if snapshot.join("tokenizer.json").exists() {
        TokenizerSource::Json(snapshot.join("tokenizer.json"))
    } else if snapshot.join("vocab.txt").exists() {
        TokenizerSource::WordPieceVocab(snapshot.join("vocab.txt"))
    } else {
        return Err(anyhow!(
            "no tokenizer.json or vocab.txt under {}",
            snapshot.display()
        ));
    };

    let weights = WEIGHT_CANDIDATES
        .iter()
        .map(|name| snapshot.join(name))
        .find(|path| path.exists())
        .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

fn hub_files(repo_id: &str) -> Result<ModelFiles> {
    let api = Api::new().context("failed to initialize hub client")?;
    let repo = api.model(repo_id.to_string());

    let config = repo
        .get("config.json")
        .with_context(|| format!("failed to fetch config.json from {repo_id}"))?;

    let tokenizer = match repo.get("tokenizer.json") {
        Ok(path) => TokenizerSource::Json(path),
        Err(err) => {
            warn!(repo = repo_id, "tokenizer.json unavailable ({err}), trying vocab.txt");
            TokenizerSource::WordPieceVocab(
                repo.get("vocab.txt")
                    .with_context(|| format!("failed to fetch a tokenizer from {repo_id}"))?,
            )
        }
    };

    let weights = WEIGHT_CANDIDATES
        .iter()
        .find_map(|name| repo.get(name).ok())
        .ok_or_else(|| anyhow!("no model weights available in {repo_id}"))?;

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_tokenizer(source: &TokenizerSource) -> Result<Tokenizer> {
    match source {
        TokenizerSource::Json(path) => Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", path.display())),
        TokenizerSource::WordPieceVocab(path) => wordpiece_tokenizer(path),
    }
}

fn wordpiece_tokenizer(vocab: &Path) -> Result<Tokenizer> {
    let wordpiece = WordPiece::from_file(
        vocab
            .to_str()
            .ok_or_else(|| anyhow!("Invalid vocab path"))?,
    )
    .unk_token("[UNK]".to_string())
    .build()
    .map_err(|e| anyhow!("WordPiece tokenizer build error: {e}"))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(NormalizerWrapper::BertNormalizer(BertNormalizer::new(
        true, true, None, true,
    ))));
    tokenizer.with_pre_tokenizer(Some(PreTokenizerWrapper::BertPreTokenizer(
        BertPreTokenizer,
    )));

    let cls = tokenizer
        .token_to_id("[CLS]")
        .ok_or_else(|| anyhow!("[CLS] missing from {}", vocab.display()))?;
    let sep = tokenizer
        .token_to_id("[SEP]")
        .ok_or_else(|| anyhow!("[SEP] missing from {}", vocab.display()))?;
    tokenizer.with_post_processor(Some(PostProcessorWrapper::Bert(BertProcessing::new(
        ("[SEP]".to_string(), sep),
        ("[CLS]".to_string(), cls),
    ))));

    Ok(tokenizer)
}

/// Maps checkpoint weights as f32; `.safetensors` is memory-mapped, anything
/// else is read as a PyTorch pickle.
pub fn var_builder(weights: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let mmapable = weights
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));
    let vb = if mmapable {
        // SAFETY: snapshot files are not modified while the process runs.
        unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device) }
    } else {
        VarBuilder::from_pth(weights, DType::F32, device)
    };
    vb.with_context(|| format!("failed to load weights from {}", weights.display()))
}

/// Parsed `MODEL_DEVICE` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePreference {
    /// CUDA 0 when available, otherwise the CPU.
    Auto,
    Cpu,
    Cuda(usize),
}

impl DevicePreference {
    /// `cpu`, `cuda`, `cuda:N` or `gpu:N`; blank means auto.
    pub fn parse(value: Option<&str>) -> Self {
        let value = value.map(str::trim).unwrap_or_default().to_ascii_lowercase();
        if value.is_empty() {
            return DevicePreference::Auto;
        }
        if value == "cpu" {
            return DevicePreference::Cpu;
        }
        let (kind, ordinal) = value.split_once(':').unwrap_or((value.as_str(), ""));
        match (kind, ordinal.parse::<usize>()) {
            ("cuda" | "gpu", Ok(ordinal)) => DevicePreference::Cuda(ordinal),
            ("cuda" | "gpu", Err(_)) if ordinal.is_empty() => DevicePreference::Cuda(0),
            _ => {
                warn!("unrecognized MODEL_DEVICE value '{value}', choosing a device automatically");
                DevicePreference::Auto
            }
        }
    }

    pub fn open(self) -> Result<Device> {
        match self {
            DevicePreference::Cpu => Ok(Device::Cpu),
            DevicePreference::Cuda(ordinal) => Device::new_cuda(ordinal).with_context(|| {
                format!(
                    "CUDA:{ordinal} was requested but could not be opened; build with the \
                     `cuda` feature and make sure the CUDA libraries are installed"
                )
            }),
            DevicePreference::Auto => Ok(Device::new_cuda(0).unwrap_or_else(|err| {
                info!("CUDA:0 unavailable ({err}), running on CPU");
                Device::Cpu
            })),
        }
    }
}
