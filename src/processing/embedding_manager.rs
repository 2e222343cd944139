//! Embedding model management: registry, download, and loading

use crate::config::Config;
use crate::error::{Result, ResumeRankerError};
use crate::processing::bert::BertEmbedder;
use crate::processing::embeddings::{Embedder, HashingEmbedder, StaticEmbedder};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files every downloadable model directory must contain
const REQUIRED_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];
const OPTIONAL_FILES: [&str; 1] = ["README.md"];

/// Information about an available embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub model_type: EmbeddingModelType,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingModelType {
    /// Transformer encoder run through Candle
    Bert,
    Model2Vec,
    /// Built in, nothing to download
    Hashing,
}

/// Manager for embedding models - handles download, caching on disk, and loading
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, EmbeddingModelInfo>,
    downloaded_models: HashSet<String>,
    max_sequence_length: usize,
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        Self::with_hashing_dimensions(models_dir, 384).await
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut manager =
            Self::with_hashing_dimensions(config.models_dir().clone(), config.models.hashing_dimensions).await?;
        manager.max_sequence_length = config.processing.max_sequence_length;
        Ok(manager)
    }

    async fn with_hashing_dimensions(models_dir: PathBuf, hashing_dimensions: usize) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                ResumeRankerError::Configuration(format!(
                    "Failed to create models directory {}: {}",
                    models_dir.display(),
                    e
                ))
            })?;
        }

        let mut manager = Self {
            models_dir,
            available_models: BTreeMap::new(),
            downloaded_models: HashSet::new(),
            max_sequence_length: 256,
        };

        manager.init_available_models(hashing_dimensions);
        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    fn init_available_models(&mut self, hashing_dimensions: usize) {
        self.available_models.insert(
            "all-MiniLM-L6-v2".to_string(),
            EmbeddingModelInfo {
                name: "MiniLM L6 v2".to_string(),
                repo_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                size_mb: 91,
                description: "Sentence-transformers encoder, 384-dimensional mean-pooled embeddings".to_string(),
                model_type: EmbeddingModelType::Bert,
                dimensions: 384,
            },
        );

        self.available_models.insert(
            "potion-base-8M".to_string(),
            EmbeddingModelInfo {
                name: "Potion Base 8M".to_string(),
                repo_id: "minishlab/potion-base-8M".to_string(),
                size_mb: 33,
                description: "Fast Model2Vec static embeddings with 8M parameters".to_string(),
                model_type: EmbeddingModelType::Model2Vec,
                dimensions: 256,
            },
        );

        self.available_models.insert(
            "m2v-base".to_string(),
            EmbeddingModelInfo {
                name: "Model2Vec Base".to_string(),
                repo_id: "minishlab/M2V_base_output".to_string(),
                size_mb: 90,
                description: "Legacy Model2Vec base embeddings model".to_string(),
                model_type: EmbeddingModelType::Model2Vec,
                dimensions: 256,
            },
        );

        self.available_models.insert(
            HashingEmbedder::MODEL_NAME.to_string(),
            EmbeddingModelInfo {
                name: "Hashing".to_string(),
                repo_id: "builtin".to_string(),
                size_mb: 0,
                description: "Offline hashed bag-of-words vectors; lexical overlap only".to_string(),
                model_type: EmbeddingModelType::Hashing,
                dimensions: hashing_dimensions,
            },
        );
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let model_id = entry.file_name().to_string_lossy().to_string();
            if self.available_models.contains_key(&model_id) && is_valid_model_directory(&entry.path()).await {
                self.downloaded_models.insert(model_id);
            }
        }

        Ok(())
    }

    /// Download a model from the Hugging Face Hub into `<models_dir>/<id>`.
    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .available_models
            .get(model_id)
            .ok_or_else(|| ResumeRankerError::ModelNotFound(model_id.to_string()))?
            .clone();

        if model_info.model_type == EmbeddingModelType::Hashing {
            return Err(ResumeRankerError::InvalidInput(format!(
                "'{}' is built in and needs no download",
                model_id
            )));
        }

        let model_dir = self.models_dir.join(model_id);
        if !force && self.downloaded_models.contains(model_id) {
            return Ok(model_dir);
        }

        println!("📥 Downloading embedding model: {} ({} MB)", model_info.name, model_info.size_mb);
        println!("📍 Repository: {}", model_info.repo_id);

        fs::create_dir_all(&model_dir).await?;

        let api = Api::new().map_err(|e| {
            ResumeRankerError::ModelUnavailable(format!("Failed to initialize Hugging Face API: {}", e))
        })?;
        let repo = api.model(model_info.repo_id.clone());

        for file in REQUIRED_FILES {
            let cached = repo.get(file).await.map_err(|e| {
                ResumeRankerError::ModelUnavailable(format!(
                    "Failed to download {} from {}: {}",
                    file, model_info.repo_id, e
                ))
            })?;
            fs::copy(&cached, model_dir.join(file)).await?;
            println!("  ✅ Downloaded: {}", file);
        }

        for file in OPTIONAL_FILES {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await?;
                    println!("  ✅ Downloaded: {}", file);
                }
                Err(e) => warn!("Optional file {} not found in {}: {}", file, model_info.repo_id, e),
            }
        }

        self.downloaded_models.insert(model_id.to_string());
        info!("Embedding model {} stored in {}", model_id, model_dir.display());
        Ok(model_dir)
    }

    /// Path of a downloaded model, downloading it first when missing.
    pub async fn ensure_model_available(&mut self, model_id: &str) -> Result<PathBuf> {
        if let Some(path) = self.get_model_path(model_id) {
            return Ok(path);
        }
        self.download_model(model_id, false).await
    }

    pub async fn remove_model(&mut self, model_id: &str) -> Result<bool> {
        let Some(path) = self.get_model_path(model_id) else {
            return Ok(false);
        };
        fs::remove_dir_all(&path).await?;
        self.downloaded_models.remove(model_id);
        Ok(true)
    }

    /// Load the embedder for `model_id`, fetching model files if needed.
    /// Any failure to obtain or load the model is reported as `ModelUnavailable`.
    pub async fn load_embedder(&mut self, model_id: &str) -> Result<Box<dyn Embedder>> {
        let resolved = self
            .resolve_model_id(model_id)
            .ok_or_else(|| ResumeRankerError::ModelNotFound(model_id.to_string()))?;
        let info = self.available_models[&resolved].clone();

        let embedder: Box<dyn Embedder> = match info.model_type {
            EmbeddingModelType::Hashing => Box::new(HashingEmbedder::new(info.dimensions)?),
            EmbeddingModelType::Bert => {
                let path = self.ensure_model_available(&resolved).await.map_err(into_unavailable)?;
                Box::new(BertEmbedder::load(&path, &info.repo_id, self.max_sequence_length)?)
            }
            EmbeddingModelType::Model2Vec => {
                let path = self.ensure_model_available(&resolved).await.map_err(into_unavailable)?;
                Box::new(StaticEmbedder::load(&path, &info.repo_id)?)
            }
        };

        Ok(embedder)
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        if self.downloaded_models.contains(model_id) {
            Some(self.models_dir.join(model_id))
        } else {
            None
        }
    }

    pub fn list_available_models(&self) -> Vec<(&str, &EmbeddingModelInfo)> {
        self.available_models
            .iter()
            .map(|(id, info)| (id.as_str(), info))
            .collect()
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.downloaded_models.iter().cloned().collect();
        models.sort();
        models
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&EmbeddingModelInfo> {
        self.resolve_model_id(model_id)
            .and_then(|id| self.available_models.get(&id))
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    /// Resolve model ID from various formats (id, repo_id, display name)
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        for (id, info) in &self.available_models {
            if info.repo_id == input {
                return Some(id.clone());
            }
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|(id, info)| id.to_lowercase() == input_lower || info.name.to_lowercase() == input_lower)
            .map(|(id, _)| id.clone())
    }
}

async fn is_valid_model_directory(path: &Path) -> bool {
    for file in REQUIRED_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}

fn into_unavailable(err: ResumeRankerError) -> ResumeRankerError {
    match err {
        ResumeRankerError::ModelUnavailable(_) => err,
        other => ResumeRankerError::ModelUnavailable(other.to_string()),
    }
}
