//! Embedding providers: a candle BERT sentence encoder for production and a
//! deterministic hash embedder for tests and model-free development.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use semsearch_core::config::ModelSettings;
use semsearch_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::{tokenize_batch, EncodedBatch};

const SLOW_EMBED_MS: u128 = 100;

/// Sentence-transformers style BERT encoder (e.g. all-MiniLM-L6-v2):
/// encoder forward pass, masked mean pooling, L2 normalization.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BertEmbedder {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let model_dir = resolve_model_dir(settings)?;
        Self::from_dir(&model_dir, settings.max_len)
    }

    pub fn from_dir(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence encoder");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        info!(dim, max_len, "sentence encoder loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let EncodedBatch { input_ids, attention_mask } = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        let elapsed = start.elapsed().as_millis();
        if texts.len() == 1 && elapsed > SLOW_EMBED_MS {
            warn!(elapsed_ms = elapsed, "slow query embedding");
        }
        debug!(batch = texts.len(), elapsed_ms = elapsed, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("encoder returned no vector"))
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode_batch(texts)
    }
}

/// Prefers `model.safetensors`, falls back to `pytorch_model.bin`.
fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Deterministic, model-free embedder: hashed bag of whitespace tokens,
/// L2-normalized. Equal texts always map to equal vectors.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

fn fake_requested(settings: &ModelSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

pub fn get_default_embedder(settings: &ModelSettings) -> Result<Box<dyn Embedder>> {
    if fake_requested(settings) {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.fake_dim)));
    }
    Ok(Box::new(BertEmbedder::new(settings)?))
}

fn resolve_model_dir(settings: &ModelSettings) -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_PATH"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                debug!(var, dir = %p.display(), "model dir from env");
                return Ok(p);
            }
        }
    }
    let configured = settings.dir();
    if configured.join("config.json").exists() {
        return Ok(configured);
    }
    fetch_model(settings)
}

/// First-run fallback: pull `settings.name` into the local Hugging Face cache
/// and load it from the snapshot directory.
#[cfg(feature = "hub")]
fn fetch_model(settings: &ModelSettings) -> Result<PathBuf> {
    use hf_hub::api::sync::Api;

    info!(model = %settings.name, "model not found locally, downloading from the Hugging Face Hub");
    let repo = Api::new().context("Failed to create Hugging Face Hub client")?.model(settings.name.clone());
    let config = repo.get("config.json").with_context(|| format!("Failed to fetch config.json for {}", settings.name))?;
    repo.get("tokenizer.json").with_context(|| format!("Failed to fetch tokenizer.json for {}", settings.name))?;
    if repo.get("model.safetensors").is_err() {
        repo.get("pytorch_model.bin")
            .with_context(|| format!("{} has neither model.safetensors nor pytorch_model.bin", settings.name))?;
    }
    config
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Downloaded config.json has no parent directory"))
}

#[cfg(not(feature = "hub"))]
fn fetch_model(settings: &ModelSettings) -> Result<PathBuf> {
    Err(anyhow!(
        "Could not locate model directory {} (download {} there, set APP_MODEL_DIR, or build with the `hub` feature)",
        settings.dir().display(),
        settings.name
    ))
}
