//! BERT sequence-classification scorer using Candle.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, PositionEmbeddingType};
use hf_hub::api::sync::Api;
use lru::LruCache;
use tokenizers::models::wordpiece::WordPieceBuilder;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use vetlens_common::preprocess::clean_review_text;
use vetlens_common::{ModelKind, SentimentScore};

use crate::scorer::SentimentScorer;
use crate::{Result, SentimentConfig, SentimentError};

/// Meaning of each logit index in a checkpoint's classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelRole {
    Positive,
    Neutral,
    Negative,
}

fn classify_label(name: &str) -> Option<LabelRole> {
    let lower = name.to_lowercase();
    if lower.contains("pos") || name.contains("ポジティブ") || name.contains("肯定") {
        Some(LabelRole::Positive)
    } else if lower.contains("neg") || name.contains("ネガティブ") || name.contains("否定") {
        Some(LabelRole::Negative)
    } else if lower.contains("neu") || name.contains("ニュートラル") || name.contains("中立") {
        Some(LabelRole::Neutral)
    } else {
        None
    }
}

/// One pre-trained Japanese sentiment checkpoint loaded onto a device.
///
/// Runs the encoder, the pooler (tanh over [CLS]) and the linear
/// classification head from the same checkpoint, then softmaxes the
/// logits into a [`SentimentScore`].
pub struct BertSentimentScorer {
    kind: ModelKind,
    model: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
    labels: Vec<LabelRole>,
    tokenizer: Tokenizer,
    device: Device,
    config: SentimentConfig,
    cache: Option<Arc<std::sync::Mutex<LruCache<String, SentimentScore>>>>,
}

impl BertSentimentScorer {
    /// Download (or reuse the local hub cache of) the checkpoint and
    /// load it onto the selected device.
    pub async fn load(kind: ModelKind, config: &SentimentConfig) -> Result<Self> {
        let start = Instant::now();
        info!("Loading sentiment model: {}", kind.hub_id());

        let device = Self::select_device(config)?;
        debug!("Using device: {:?}", device);

        // Hub access is sync; keep it off the async runtime.
        let hub_id = kind.hub_id().to_string();
        let (bert_config, labels, tokenizer, weights_path) =
            tokio::task::spawn_blocking(move || {
                use hf_hub::{Repo, RepoType};

                let api = Api::new().map_err(|e| SentimentError::Download(format!("API init: {e}")))?;
                let repo = api.repo(Repo::new(hub_id, RepoType::Model));

                let config_path = repo
                    .get("config.json")
                    .map_err(|e| SentimentError::Download(format!("config.json: {e}")))?;
                let raw: serde_json::Value =
                    serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
                let bert_config = parse_bert_config(&raw);
                let labels = parse_labels(&raw)?;

                // tokenizer.json where available, vocab.txt WordPiece otherwise.
                let tokenizer = if let Ok(tokenizer_path) = repo.get("tokenizer.json") {
                    Tokenizer::from_file(&tokenizer_path)
                        .map_err(|e| SentimentError::Tokenizer(e.to_string()))?
                } else {
                    let vocab_path = repo
                        .get("vocab.txt")
                        .map_err(|e| SentimentError::Download(format!("vocab.txt: {e}")))?;
                    let vocab: std::collections::HashMap<String, u32> =
                        std::fs::read_to_string(&vocab_path)?
                            .lines()
                            .enumerate()
                            .map(|(i, line)| (line.to_string(), i as u32))
                            .collect();
                    let wordpiece = WordPieceBuilder::new()
                        .vocab(vocab)
                        .continuing_subword_prefix("##".to_string())
                        .max_input_chars_per_word(100)
                        .unk_token("[UNK]".to_string())
                        .build()
                        .map_err(|e| SentimentError::Tokenizer(format!("WordPiece build: {e}")))?;
                    Tokenizer::new(wordpiece)
                };

                let weights_path = repo
                    .get("model.safetensors")
                    .or_else(|_| repo.get("pytorch_model.bin"))
                    .map_err(|e| SentimentError::Download(format!("model weights: {e}")))?;

                Ok::<_, SentimentError>((bert_config, labels, tokenizer, weights_path))
            })
            .await
            .map_err(|e| SentimentError::Download(e.to_string()))??;

        let vb = if weights_path.extension().map(|e| e == "safetensors").unwrap_or(false) {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        };

        // Checkpoints exported from BertForSequenceClassification nest the
        // encoder under "bert."; BertModel::load retries with the
        // model_type prefix on its own.
        let model = BertModel::load(vb.clone(), &bert_config)
            .map_err(|e| SentimentError::ModelLoad(e.to_string()))?;

        let hidden = bert_config.hidden_size;
        let pooler = load_linear(&vb, &["bert.pooler.dense", "pooler.dense"], hidden, hidden);
        let classifier = load_linear(&vb, &["classifier"], hidden, labels.len())
            .ok_or_else(|| SentimentError::ModelLoad("classifier head not found".to_string()))?;

        info!(
            "Model {} loaded in {:.2}s ({} labels)",
            kind.hub_id(),
            start.elapsed().as_secs_f32(),
            labels.len()
        );

        let cache = (config.cache_size > 0).then(|| {
            Arc::new(std::sync::Mutex::new(LruCache::new(
                NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN),
            )))
        });

        Ok(Self {
            kind,
            model,
            pooler,
            classifier,
            labels,
            tokenizer,
            device,
            config: config.clone(),
            cache,
        })
    }

    fn select_device(config: &SentimentConfig) -> Result<Device> {
        if !config.use_gpu {
            return Ok(Device::Cpu);
        }

        #[cfg(feature = "cuda")]
        {
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("CUDA device available");
                    return Ok(device);
                }
                Err(e) => debug!("CUDA not available: {}, falling back to CPU", e),
            }
        }

        #[cfg(feature = "metal")]
        {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Metal device available");
                    return Ok(device);
                }
                Err(e) => debug!("Metal not available: {}, falling back to CPU", e),
            }
        }

        Ok(Device::Cpu)
    }

    /// Run one padded batch through encoder, pooler and classifier.
    fn forward_batch(&self, texts: &[&str]) -> Result<Vec<SentimentScore>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| SentimentError::Tokenizer(e.to_string()))?;

        let mut input_ids_vec = Vec::with_capacity(texts.len());
        let mut attention_mask_vec = Vec::with_capacity(texts.len());
        let mut token_type_ids_vec = Vec::with_capacity(texts.len());

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let type_ids = encoding.get_type_ids();

            let max_len = self.config.max_length.min(512);
            let len = ids.len().min(max_len);

            input_ids_vec.push(ids[..len].to_vec());
            attention_mask_vec.push(mask[..len].to_vec());
            token_type_ids_vec.push(type_ids[..len].to_vec());
        }

        let max_len = input_ids_vec.iter().map(|v| v.len()).max().unwrap_or(0);
        for ((ids, mask), type_ids) in input_ids_vec
            .iter_mut()
            .zip(attention_mask_vec.iter_mut())
            .zip(token_type_ids_vec.iter_mut())
        {
            let pad_len = max_len - ids.len();
            ids.extend(std::iter::repeat_n(0, pad_len));
            mask.extend(std::iter::repeat_n(0, pad_len));
            type_ids.extend(std::iter::repeat_n(0, pad_len));
        }

        let batch_size = texts.len();
        let input_ids = Tensor::new(input_ids_vec, &self.device)?.reshape((batch_size, max_len))?;
        let attention_mask = Tensor::new(attention_mask_vec, &self.device)?
            .reshape((batch_size, max_len))?
            .to_dtype(DType::F32)?;
        let token_type_ids =
            Tensor::new(token_type_ids_vec, &self.device)?.reshape((batch_size, max_len))?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // [CLS] token, then the checkpoint's pooler when present.
        let cls = hidden.i((.., 0))?;
        let pooled = match &self.pooler {
            Some(pooler) => pooler.forward(&cls)?.tanh()?,
            None => cls,
        };

        let logits = self.classifier.forward(&pooled)?;
        let probs = softmax(&logits, D::Minus1)?.to_vec2::<f32>()?;

        Ok(probs.iter().map(|row| self.score_from_probs(row)).collect())
    }

    fn score_from_probs(&self, probs: &[f32]) -> SentimentScore {
        let mut score = SentimentScore::new(0.0, 0.0, 0.0);
        for (role, p) in self.labels.iter().zip(probs) {
            match role {
                LabelRole::Positive => score.positive += *p as f64,
                LabelRole::Neutral => score.neutral += *p as f64,
                LabelRole::Negative => score.negative += *p as f64,
            }
        }
        score
    }
}

/// Try a list of candidate weight prefixes and return the first linear
/// layer that exists in the checkpoint.
fn load_linear(vb: &VarBuilder, prefixes: &[&str], in_dim: usize, out_dim: usize) -> Option<Linear> {
    for prefix in prefixes {
        if vb.contains_tensor(&format!("{prefix}.weight")) {
            if let Ok(linear) = candle_nn::linear(in_dim, out_dim, vb.pp(prefix)) {
                return Some(linear);
            }
        }
    }
    None
}

fn parse_bert_config(json: &serde_json::Value) -> Config {
    let hidden_act = match json.get("hidden_act").and_then(|v| v.as_str()) {
        Some("relu") => HiddenAct::Relu,
        Some("gelu_new") | Some("gelu_approximate") => HiddenAct::GeluApproximate,
        _ => HiddenAct::Gelu,
    };

    Config {
        vocab_size: json.get("vocab_size").and_then(|v| v.as_u64()).unwrap_or(32_768) as usize,
        hidden_size: json.get("hidden_size").and_then(|v| v.as_u64()).unwrap_or(768) as usize,
        num_hidden_layers: json.get("num_hidden_layers").and_then(|v| v.as_u64()).unwrap_or(12) as usize,
        num_attention_heads: json.get("num_attention_heads").and_then(|v| v.as_u64()).unwrap_or(12) as usize,
        intermediate_size: json.get("intermediate_size").and_then(|v| v.as_u64()).unwrap_or(3072) as usize,
        hidden_act,
        hidden_dropout_prob: json.get("hidden_dropout_prob").and_then(|v| v.as_f64()).unwrap_or(0.1),
        max_position_embeddings: json.get("max_position_embeddings").and_then(|v| v.as_u64()).unwrap_or(512) as usize,
        type_vocab_size: json.get("type_vocab_size").and_then(|v| v.as_u64()).unwrap_or(2) as usize,
        initializer_range: json.get("initializer_range").and_then(|v| v.as_f64()).unwrap_or(0.02),
        layer_norm_eps: json.get("layer_norm_eps").and_then(|v| v.as_f64()).unwrap_or(1e-12),
        pad_token_id: json.get("pad_token_id").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
        position_embedding_type: PositionEmbeddingType::Absolute,
        use_cache: true,
        classifier_dropout: None,
        model_type: Some("bert".to_string()),
    }
}

/// Logit index → label role, from the checkpoint's `id2label` map.
/// Checkpoints without one get the conventional 2/3-class orders.
fn parse_labels(json: &serde_json::Value) -> Result<Vec<LabelRole>> {
    let mut label_count = None;
    if let Some(map) = json.get("id2label").and_then(|v| v.as_object()) {
        label_count = Some(map.len() as u64);
        let mut indexed: Vec<(usize, &str)> = map
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<usize>().ok()?, v.as_str()?)))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);

        let roles: Option<Vec<LabelRole>> =
            indexed.iter().map(|(_, name)| classify_label(name)).collect();
        if let Some(roles) = roles {
            if !roles.is_empty() {
                return Ok(roles);
            }
        }
        // LABEL_0-style names fall through to the defaults below.
    }

    let count = json
        .get("num_labels")
        .and_then(|v| v.as_u64())
        .or(label_count)
        .unwrap_or(2);
    match count {
        2 => Ok(vec![LabelRole::Negative, LabelRole::Positive]),
        3 => Ok(vec![LabelRole::Negative, LabelRole::Neutral, LabelRole::Positive]),
        n => Err(SentimentError::Labels(format!("{n} labels with no usable id2label"))),
    }
}

#[async_trait]
impl SentimentScorer for BertSentimentScorer {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    async fn score_batch(&self, texts: &[String]) -> Result<Vec<SentimentScore>> {
        let start = Instant::now();
        let cleaned: Vec<String> = texts.iter().map(|t| clean_review_text(t)).collect();

        let mut results: Vec<Option<SentimentScore>> = vec![None; texts.len()];
        let mut pending: Vec<(usize, &str)> = Vec::new();

        for (i, text) in cleaned.iter().enumerate() {
            if text.is_empty() {
                results[i] = Some(SentimentScore::NEUTRAL);
                continue;
            }
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.lock().unwrap().get(text) {
                    results[i] = Some(*hit);
                    continue;
                }
            }
            pending.push((i, text.as_str()));
        }

        for chunk in pending.chunks(self.config.batch_size.max(1)) {
            let batch_texts: Vec<&str> = chunk.iter().map(|(_, t)| *t).collect();
            let scores = self.forward_batch(&batch_texts)?;
            for ((i, text), score) in chunk.iter().zip(scores) {
                if let Some(cache) = &self.cache {
                    cache.lock().unwrap().put(text.to_string(), score);
                }
                results[*i] = Some(score);
            }
        }

        debug!(
            model = %self.kind,
            "Scored {} reviews in {:.1}ms",
            texts.len(),
            start.elapsed().as_secs_f32() * 1000.0
        );

        Ok(results.into_iter().map(|s| s.unwrap_or(SentimentScore::NEUTRAL)).collect())
    }
}
